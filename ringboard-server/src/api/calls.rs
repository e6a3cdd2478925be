//! Call endpoints: sync with the call platform, list the cache

use axum::Extension;
use axum::extract::{Query, State};
use shared::error::AppResponse;
use shared::models::{CachedCall, SyncSummary};

use super::{ApiResult, PageQuery, Paged};
use crate::auth::AccountIdentity;
use crate::calls::{backfill_costs, reconcile};
use crate::db;
use crate::state::AppState;

/// POST /api/calls/sync
pub async fn sync_calls(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
) -> ApiResult<SyncSummary> {
    let api_key = db::settings::call_api_key(&state.pool, &identity.account_id)
        .await?
        .unwrap_or_default();

    let summary = reconcile(
        &state.pool,
        &state.call_api,
        &identity.account_id,
        &api_key,
        state.backfill,
    )
    .await?;
    Ok(AppResponse::success(summary))
}

/// GET /api/calls
///
/// Runs a bounded cost backfill first when a credential is configured; the
/// listing is served even if the backfill fails.
pub async fn list_calls(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<CachedCall>> {
    let account_id = identity.account_id.as_str();

    if let Some(api_key) = db::settings::call_api_key(&state.pool, account_id).await? {
        match backfill_costs(&state.pool, &state.call_api, account_id, &api_key, state.backfill)
            .await
        {
            Ok(summary) if summary.attempted > 0 => tracing::info!(
                account_id,
                updated = summary.updated,
                failed = summary.failed,
                abandoned = summary.abandoned,
                "Read-path cost backfill"
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!(account_id, error = %e, "Read-path cost backfill failed"),
        }
    }

    let items = db::calls::list(&state.pool, account_id, query.per_page(), query.offset()).await?;
    let total = db::calls::count(&state.pool, account_id).await?;
    Ok(AppResponse::success(Paged {
        items,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}
