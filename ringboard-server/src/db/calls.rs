//! Cached call queries

use shared::models::CachedCall;
use sqlx::SqlitePool;

const CALL_SELECT: &str = "SELECT id, account_id, phone_number, duration_seconds, status, outcome, transcript, recording_url, cost_cents, call_at, cached_at FROM cached_calls";

/// Insert a call or merge it into the cached copy.
///
/// Nullable fields keep their cached value when the incoming one is null,
/// so a known cost is never lost on re-sync.
pub async fn upsert_merge(pool: &SqlitePool, call: &CachedCall) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cached_calls (account_id, id, phone_number, duration_seconds, status, outcome, transcript, recording_url, cost_cents, call_at, cached_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT (account_id, id) DO UPDATE SET
             phone_number = COALESCE(excluded.phone_number, phone_number),
             duration_seconds = COALESCE(excluded.duration_seconds, duration_seconds),
             status = excluded.status,
             outcome = COALESCE(excluded.outcome, outcome),
             transcript = COALESCE(excluded.transcript, transcript),
             recording_url = COALESCE(excluded.recording_url, recording_url),
             cost_cents = COALESCE(excluded.cost_cents, cost_cents),
             call_at = COALESCE(excluded.call_at, call_at),
             cached_at = excluded.cached_at",
    )
    .bind(&call.account_id)
    .bind(&call.id)
    .bind(&call.phone_number)
    .bind(call.duration_seconds)
    .bind(&call.status)
    .bind(&call.outcome)
    .bind(&call.transcript)
    .bind(&call.recording_url)
    .bind(call.cost_cents)
    .bind(call.call_at)
    .bind(call.cached_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Ids of the most recent calls still lacking a cost
pub async fn missing_cost_ids(
    pool: &SqlitePool,
    account_id: &str,
    limit: i64,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT id FROM cached_calls WHERE account_id = ? AND cost_cents IS NULL
         ORDER BY call_at IS NULL, call_at DESC, cached_at DESC LIMIT ?",
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Write a cost only into a row that has none. Returns `true` when written.
pub async fn set_cost_if_missing(
    pool: &SqlitePool,
    account_id: &str,
    id: &str,
    cost_cents: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE cached_calls SET cost_cents = ? WHERE account_id = ? AND id = ? AND cost_cents IS NULL",
    )
    .bind(cost_cents)
    .bind(account_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find(
    pool: &SqlitePool,
    account_id: &str,
    id: &str,
) -> Result<Option<CachedCall>, sqlx::Error> {
    let sql = format!("{CALL_SELECT} WHERE account_id = ? AND id = ?");
    sqlx::query_as::<_, CachedCall>(&sql)
        .bind(account_id)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest first
pub async fn list(
    pool: &SqlitePool,
    account_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<CachedCall>, sqlx::Error> {
    let sql = format!(
        "{CALL_SELECT} WHERE account_id = ?
         ORDER BY call_at IS NULL, call_at DESC, cached_at DESC LIMIT ? OFFSET ?"
    );
    sqlx::query_as::<_, CachedCall>(&sql)
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &SqlitePool, account_id: &str) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cached_calls WHERE account_id = ?")
        .bind(account_id)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn call(id: &str, call_at: i64, cost_cents: Option<i64>) -> CachedCall {
        CachedCall {
            id: id.into(),
            account_id: "acct-1".into(),
            phone_number: Some("+447700900123".into()),
            duration_seconds: Some(42),
            status: "ended".into(),
            outcome: Some("customer-ended-call".into()),
            transcript: None,
            recording_url: None,
            cost_cents,
            call_at: Some(call_at),
            cached_at: call_at,
        }
    }

    #[tokio::test]
    async fn test_merge_keeps_known_cost() {
        let pool = test_pool().await;
        upsert_merge(&pool, &call("call-1", 1_000, Some(150)))
            .await
            .unwrap();

        let mut resync = call("call-1", 1_000, None);
        resync.transcript = Some("Hello".into());
        resync.phone_number = None;
        upsert_merge(&pool, &resync).await.unwrap();

        let stored = find(&pool, "acct-1", "call-1").await.unwrap().unwrap();
        assert_eq!(stored.cost_cents, Some(150));
        assert_eq!(stored.transcript.as_deref(), Some("Hello"));
        assert_eq!(stored.phone_number.as_deref(), Some("+447700900123"));
    }

    #[tokio::test]
    async fn test_set_cost_only_fills_missing() {
        let pool = test_pool().await;
        upsert_merge(&pool, &call("call-1", 1_000, None)).await.unwrap();

        assert!(set_cost_if_missing(&pool, "acct-1", "call-1", 0).await.unwrap());
        assert!(!set_cost_if_missing(&pool, "acct-1", "call-1", 99).await.unwrap());

        let stored = find(&pool, "acct-1", "call-1").await.unwrap().unwrap();
        assert_eq!(stored.cost_cents, Some(0));
    }

    #[tokio::test]
    async fn test_missing_cost_ids_newest_first() {
        let pool = test_pool().await;
        upsert_merge(&pool, &call("old", 1_000, None)).await.unwrap();
        upsert_merge(&pool, &call("costed", 2_000, Some(10)))
            .await
            .unwrap();
        upsert_merge(&pool, &call("new", 3_000, None)).await.unwrap();

        let ids = missing_cost_ids(&pool, "acct-1", 5).await.unwrap();
        assert_eq!(ids, ["new", "old"]);
        assert_eq!(missing_cost_ids(&pool, "acct-1", 1).await.unwrap(), ["new"]);
        assert!(missing_cost_ids(&pool, "acct-2", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let pool = test_pool().await;
        upsert_merge(&pool, &call("a", 1_000, None)).await.unwrap();
        upsert_merge(&pool, &call("b", 2_000, None)).await.unwrap();

        let calls = list(&pool, "acct-1", 10, 0).await.unwrap();
        assert_eq!(calls[0].id, "b");
        assert_eq!(calls[1].id, "a");
    }
}
