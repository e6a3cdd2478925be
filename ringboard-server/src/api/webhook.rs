//! HubRise order callback
//!
//! POST /api/webhooks/hubrise takes the raw body so malformed JSON is still acknowledged

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;

use crate::ingest::{WebhookAck, handle_webhook};
use crate::state::AppState;

/// Always 200; failures are reported in the `error` field
pub async fn receive(State(state): State<AppState>, body: Bytes) -> Json<WebhookAck> {
    Json(handle_webhook(&state.pool, &body, shared::util::now_millis()).await)
}

/// Reachability probe used when registering the callback
pub async fn status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "webhook_active" }))
}
