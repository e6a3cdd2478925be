//! Customer endpoints

use axum::Extension;
use axum::extract::{Query, State};
use shared::error::AppResponse;
use shared::models::Customer;

use super::{ApiResult, PageQuery, Paged};
use crate::auth::AccountIdentity;
use crate::db;
use crate::state::AppState;

/// GET /api/customers, highest spend first
pub async fn list_customers(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<Customer>> {
    let items = db::customers::list(
        &state.pool,
        &identity.account_id,
        query.per_page(),
        query.offset(),
    )
    .await?;
    let total = db::customers::count(&state.pool, &identity.account_id).await?;

    Ok(AppResponse::success(Paged {
        items,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}
