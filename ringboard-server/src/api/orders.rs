//! Order endpoints

use axum::Extension;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::error::{AppError, AppResponse, ErrorCode};
use shared::models::{Order, OrderStatus};

use super::{ApiResult, PageQuery, Paged};
use crate::auth::AccountIdentity;
use crate::db;
use crate::state::AppState;

/// `?page=&per_page=&status=`
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

/// GET /api/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Paged<Order>> {
    let paging = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OrderStatus::parse_lenient);

    let items = db::orders::list(
        &state.pool,
        &identity.account_id,
        status,
        paging.per_page(),
        paging.offset(),
    )
    .await?;
    let total = db::orders::count(&state.pool, &identity.account_id, status).await?;

    Ok(AppResponse::success(Paged {
        items,
        total,
        page: paging.page(),
        per_page: paging.per_page(),
    }))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    let order = db::orders::find(&state.pool, &identity.account_id, &id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("id", id))?;
    Ok(AppResponse::success(order))
}
