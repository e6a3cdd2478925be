//! HTTP API

pub mod calls;
pub mod connections;
pub mod customers;
pub mod health;
pub mod orders;
pub mod settings;
pub mod webhook;

use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use shared::error::AppResponse;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::account_auth_middleware;
use crate::error::ServiceError;
use crate::state::AppState;

/// Handler result: `{success, data}` on success, an `AppError` body otherwise
pub type ApiResult<T> = Result<AppResponse<T>, ServiceError>;

const REQUEST_ID_HEADER: &str = "x-request-id";
const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// `?page=&per_page=` with the usual clamping
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    // Dashboard API (bearer JWT)
    let dashboard = Router::new()
        .route("/api/calls", get(calls::list_calls))
        .route("/api/calls/sync", post(calls::sync_calls))
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/customers", get(customers::list_customers))
        .route("/api/settings/call-api-key", put(settings::set_call_api_key))
        .route("/api/hubrise/connections", get(connections::list_connections))
        .route("/api/hubrise/connect", post(connections::connect))
        .route(
            "/api/hubrise/connections/{location_id}",
            delete(connections::revoke),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            account_auth_middleware,
        ));

    // HubRise callback (unauthenticated, raw body)
    let webhook = Router::new().route(
        "/api/webhooks/hubrise",
        post(webhook::receive).get(webhook::status),
    );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(webhook)
        .merge(dashboard)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .with_state(state)
}
