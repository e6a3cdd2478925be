//! Call cache reconciler
//!
//! Pulls the most recent page of calls from the call platform, merges them into
//! the local cache and then backfills missing costs under a time budget.

use std::sync::Arc;
use std::time::Duration;

use shared::models::{BackfillSummary, SyncSummary};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::client::CallApi;
use crate::db;
use crate::ingest::normalize::{call_cost_cents, normalize_call};
use crate::upstream::UpstreamError;

/// Upper bound on calls requested per sync
pub const MAX_SYNC_PAGE: u32 = 200;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("call platform API key is not configured")]
    MissingCredential,
    #[error("call list request failed: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Limits for one cost backfill pass
#[derive(Debug, Clone, Copy)]
pub struct BackfillPolicy {
    /// Calls enriched per pass
    pub batch_size: u32,
    /// Bound on each detail request
    pub request_timeout: Duration,
    /// Bound on the whole pass; pending requests are aborted after it
    pub overall_timeout: Duration,
}

impl Default for BackfillPolicy {
    fn default() -> Self {
        Self {
            batch_size: 5,
            request_timeout: Duration::from_secs(2),
            overall_timeout: Duration::from_secs(3),
        }
    }
}

/// Sync the account's recent calls into the cache.
///
/// Fails fast without a credential and fails whole when the list request
/// fails. Individual calls that cannot be normalized or written are counted
/// in `failed`.
pub async fn reconcile(
    pool: &SqlitePool,
    api: &Arc<dyn CallApi>,
    account_id: &str,
    api_key: &str,
    policy: BackfillPolicy,
) -> Result<SyncSummary, ReconcileError> {
    if api_key.trim().is_empty() {
        return Err(ReconcileError::MissingCredential);
    }

    let calls = api.list_calls(api_key, MAX_SYNC_PAGE).await?;
    let now = shared::util::now_millis();

    let mut summary = SyncSummary {
        total: calls.len() as u32,
        ..Default::default()
    };

    for raw in &calls {
        let Some(call) = normalize_call(raw, account_id, now) else {
            tracing::warn!(account_id, "Call record without id, skipping");
            summary.failed += 1;
            continue;
        };
        match db::calls::upsert_merge(pool, &call).await {
            Ok(()) => summary.synced += 1,
            Err(e) => {
                tracing::error!(account_id, call_id = %call.id, error = %e, "Failed to cache call");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        account_id,
        synced = summary.synced,
        failed = summary.failed,
        total = summary.total,
        "Call sync finished"
    );

    match backfill_costs(pool, api, account_id, api_key, policy).await {
        Ok(backfill) => tracing::info!(
            account_id,
            attempted = backfill.attempted,
            updated = backfill.updated,
            failed = backfill.failed,
            abandoned = backfill.abandoned,
            "Cost backfill finished"
        ),
        Err(e) => tracing::error!(account_id, error = %e, "Cost backfill failed"),
    }

    Ok(summary)
}

/// Fetch cost for the most recent cached calls that lack one.
///
/// Requests run concurrently, each bounded by `request_timeout`; whatever is
/// still pending at `overall_timeout` is aborted and counted as abandoned.
/// Only non-negative costs are written, and never over an existing cost.
pub async fn backfill_costs(
    pool: &SqlitePool,
    api: &Arc<dyn CallApi>,
    account_id: &str,
    api_key: &str,
    policy: BackfillPolicy,
) -> Result<BackfillSummary, sqlx::Error> {
    let ids = db::calls::missing_cost_ids(pool, account_id, i64::from(policy.batch_size)).await?;
    let mut summary = BackfillSummary {
        attempted: ids.len() as u32,
        ..Default::default()
    };
    if ids.is_empty() {
        return Ok(summary);
    }

    let deadline = Instant::now() + policy.overall_timeout;
    let mut tasks = JoinSet::new();
    for id in ids {
        let api = Arc::clone(api);
        let key = api_key.to_string();
        let per_request = policy.request_timeout;
        tasks.spawn(async move {
            let result = tokio::time::timeout(per_request, api.get_call(&key, &id)).await;
            (id, result)
        });
    }

    loop {
        let joined = match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(joined)) => joined,
            Ok(None) => break,
            Err(_) => {
                summary.abandoned = tasks.len() as u32;
                tasks.abort_all();
                tracing::warn!(
                    account_id,
                    abandoned = summary.abandoned,
                    "Cost backfill deadline reached"
                );
                break;
            }
        };

        let (id, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(account_id, error = %e, "Cost backfill task failed");
                summary.failed += 1;
                continue;
            }
        };

        let detail = match result {
            Ok(Ok(detail)) => detail,
            Ok(Err(e)) => {
                tracing::warn!(account_id, call_id = %id, error = %e, "Call detail request failed");
                summary.failed += 1;
                continue;
            }
            Err(_) => {
                tracing::warn!(account_id, call_id = %id, "Call detail request timed out");
                summary.failed += 1;
                continue;
            }
        };

        let Some(cost) = detail.get("cost").and_then(call_cost_cents) else {
            summary.failed += 1;
            continue;
        };

        match db::calls::set_cost_if_missing(pool, account_id, &id, cost).await {
            Ok(true) => summary.updated += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(account_id, call_id = %id, error = %e, "Failed to write call cost");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use shared::models::CachedCall;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum Detail {
        Cost(Value),
        Hang,
        Fail,
    }

    #[derive(Default)]
    struct FakeCallApi {
        calls: Vec<Value>,
        details: HashMap<String, Detail>,
        list_fails: bool,
        requests: AtomicUsize,
    }

    #[async_trait]
    impl CallApi for FakeCallApi {
        async fn list_calls(&self, _api_key: &str, limit: u32) -> Result<Vec<Value>, UpstreamError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            assert_eq!(limit, MAX_SYNC_PAGE);
            if self.list_fails {
                return Err(UpstreamError::Status {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(self.calls.clone())
        }

        async fn get_call(&self, _api_key: &str, call_id: &str) -> Result<Value, UpstreamError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            match self.details.get(call_id).cloned() {
                Some(Detail::Cost(cost)) => Ok(json!({"id": call_id, "cost": cost})),
                Some(Detail::Hang) => std::future::pending().await,
                Some(Detail::Fail) | None => Err(UpstreamError::InvalidResponse("boom".into())),
            }
        }
    }

    fn fast_policy() -> BackfillPolicy {
        BackfillPolicy {
            batch_size: 5,
            request_timeout: Duration::from_millis(200),
            overall_timeout: Duration::from_millis(300),
        }
    }

    async fn cache_uncosted(pool: &SqlitePool, ids: &[&str]) {
        for (i, id) in ids.iter().enumerate() {
            db::calls::upsert_merge(
                pool,
                &CachedCall {
                    id: id.to_string(),
                    account_id: "acct-1".into(),
                    phone_number: None,
                    duration_seconds: None,
                    status: "ended".into(),
                    outcome: None,
                    transcript: None,
                    recording_url: None,
                    cost_cents: None,
                    call_at: Some(1_000 + i as i64),
                    cached_at: 1,
                },
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_request() {
        let pool = test_pool().await;
        let fake = Arc::new(FakeCallApi::default());
        let api: Arc<dyn CallApi> = fake.clone();

        for key in ["", "   "] {
            let err = reconcile(&pool, &api, "acct-1", key, fast_policy())
                .await
                .unwrap_err();
            assert!(matches!(err, ReconcileError::MissingCredential));
        }
        assert_eq!(fake.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_failure_caches_nothing() {
        let pool = test_pool().await;
        let api: Arc<dyn CallApi> = Arc::new(FakeCallApi {
            list_fails: true,
            ..Default::default()
        });

        let err = reconcile(&pool, &api, "acct-1", "key", fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Upstream(_)));
        assert!(db::calls::list(&pool, "acct-1", 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_per_call_failures_are_counted() {
        let pool = test_pool().await;
        let api: Arc<dyn CallApi> = Arc::new(FakeCallApi {
            calls: vec![
                json!({"id": "call-1", "status": "ended", "cost": 0.2}),
                json!({"status": "ended"}),
                json!({"id": "call-2", "status": "ended", "cost": 0.3}),
            ],
            ..Default::default()
        });

        let summary = reconcile(&pool, &api, "acct-1", "key", fast_policy())
            .await
            .unwrap();
        assert_eq!(
            summary,
            SyncSummary {
                synced: 2,
                failed: 1,
                total: 3
            }
        );
        assert_eq!(db::calls::list(&pool, "acct-1", 10, 0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resync_without_cost_keeps_cost() {
        let pool = test_pool().await;
        let first: Arc<dyn CallApi> = Arc::new(FakeCallApi {
            calls: vec![json!({"id": "call-1", "status": "ended", "cost": 1.5})],
            ..Default::default()
        });
        reconcile(&pool, &first, "acct-1", "key", fast_policy())
            .await
            .unwrap();

        let second: Arc<dyn CallApi> = Arc::new(FakeCallApi {
            calls: vec![json!({"id": "call-1", "status": "ended"})],
            ..Default::default()
        });
        reconcile(&pool, &second, "acct-1", "key", fast_policy())
            .await
            .unwrap();

        let call = db::calls::find(&pool, "acct-1", "call-1").await.unwrap().unwrap();
        assert_eq!(call.cost_cents, Some(150));
    }

    #[tokio::test]
    async fn test_backfill_is_time_bounded() {
        let pool = test_pool().await;
        cache_uncosted(&pool, &["c1", "c2", "c3", "c4", "c5"]).await;

        let details = HashMap::from([
            ("c1".to_string(), Detail::Cost(json!(0.25))),
            ("c2".to_string(), Detail::Hang),
            ("c3".to_string(), Detail::Cost(json!(0))),
            ("c4".to_string(), Detail::Hang),
            ("c5".to_string(), Detail::Hang),
        ]);
        let api: Arc<dyn CallApi> = Arc::new(FakeCallApi {
            details,
            ..Default::default()
        });

        let started = std::time::Instant::now();
        let summary = backfill_costs(&pool, &api, "acct-1", "key", fast_policy())
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));

        assert_eq!(summary.attempted, 5);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.failed + summary.abandoned, 3);

        let costs: HashMap<String, Option<i64>> = db::calls::list(&pool, "acct-1", 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.id, c.cost_cents))
            .collect();
        assert_eq!(costs["c1"], Some(25));
        assert_eq!(costs["c3"], Some(0));
        assert_eq!(costs["c2"], None);
        assert_eq!(costs["c4"], None);
        assert_eq!(costs["c5"], None);
    }

    #[tokio::test]
    async fn test_backfill_aborts_at_overall_deadline() {
        let pool = test_pool().await;
        cache_uncosted(&pool, &["c1", "c2"]).await;

        let api: Arc<dyn CallApi> = Arc::new(FakeCallApi {
            details: HashMap::from([
                ("c1".to_string(), Detail::Hang),
                ("c2".to_string(), Detail::Hang),
            ]),
            ..Default::default()
        });
        let policy = BackfillPolicy {
            batch_size: 5,
            request_timeout: Duration::from_secs(30),
            overall_timeout: Duration::from_millis(100),
        };

        let started = std::time::Instant::now();
        let summary = backfill_costs(&pool, &api, "acct-1", "key", policy)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(summary.abandoned, 2);
        assert_eq!(summary.updated, 0);
    }

    #[tokio::test]
    async fn test_backfill_rejects_negative_and_missing_cost() {
        let pool = test_pool().await;
        cache_uncosted(&pool, &["neg", "fail"]).await;

        let api: Arc<dyn CallApi> = Arc::new(FakeCallApi {
            details: HashMap::from([
                ("neg".to_string(), Detail::Cost(json!(-0.5))),
                ("fail".to_string(), Detail::Fail),
            ]),
            ..Default::default()
        });

        let summary = backfill_costs(&pool, &api, "acct-1", "key", fast_policy())
            .await
            .unwrap();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.updated, 0);
        assert!(
            db::calls::missing_cost_ids(&pool, "acct-1", 5)
                .await
                .unwrap()
                .contains(&"neg".to_string())
        );
    }

    #[tokio::test]
    async fn test_backfill_limits_batch() {
        let pool = test_pool().await;
        cache_uncosted(&pool, &["a", "b", "c", "d", "e", "f", "g"]).await;
        let fake = Arc::new(FakeCallApi::default());
        let api: Arc<dyn CallApi> = fake.clone();

        let summary = backfill_costs(&pool, &api, "acct-1", "key", fast_policy())
            .await
            .unwrap();
        assert_eq!(summary.attempted, 5);
        assert_eq!(fake.requests.load(Ordering::SeqCst), 5);
    }
}
