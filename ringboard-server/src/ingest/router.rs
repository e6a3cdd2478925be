//! Webhook event router
//!
//! Classifies inbound HubRise callback events, resolves the owning account and
//! dispatches to the upserter. The sender always gets a 200 acknowledgement:
//! processing failures are logged and reported with a generic `error` field.

use serde::Serialize;
use serde_json::Value;
use shared::error::ErrorCode;
use shared::models::OrderStatus;
use sqlx::SqlitePool;
use thiserror::Error;

use super::normalize::{id_field, normalize_order};
use super::upsert::{update_order_status, upsert_order};
use crate::db;

/// Generic error string returned to the webhook sender
pub const ACK_ERROR: &str = "processing_failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    OrderCreate,
    OrderUpdate,
    Other(String),
}

/// What the router did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Created,
    Duplicate,
    Updated { applied: bool },
    /// Unrecognized event type
    Ignored,
    /// No active connection for the event's location
    Unrouted,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("malformed event: {0}")]
    Malformed(&'static str),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Acknowledgement body, `{received: true, duplicate?, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    fn ok() -> Self {
        Self {
            received: true,
            duplicate: None,
            error: None,
        }
    }

    fn duplicate() -> Self {
        Self {
            duplicate: Some(true),
            ..Self::ok()
        }
    }

    fn failed() -> Self {
        Self {
            error: Some(ACK_ERROR.to_string()),
            ..Self::ok()
        }
    }
}

/// Event type from either `event_type: "order.create"` or the HubRise pair
/// `resource_type: "order"` + `event_type: "create"`.
pub fn classify(event: &Value) -> EventKind {
    let event_type = event
        .get("event_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();
    let resource_type = event
        .get("resource_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();

    let qualified = if event_type.contains('.') || resource_type.is_empty() {
        event_type.to_string()
    } else {
        format!("{resource_type}.{event_type}")
    };

    match qualified.as_str() {
        "order.create" => EventKind::OrderCreate,
        "order.update" => EventKind::OrderUpdate,
        _ => EventKind::Other(qualified),
    }
}

/// Parse and route a raw webhook body, always producing an acknowledgement
pub async fn handle_webhook(pool: &SqlitePool, body: &[u8], now: i64) -> WebhookAck {
    let event: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(code = %ErrorCode::WebhookRejected, error = %e, "Failed to parse webhook JSON");
            return WebhookAck::failed();
        }
    };

    match route_event(pool, &event, now).await {
        Ok(WebhookOutcome::Duplicate) => WebhookAck::duplicate(),
        Ok(_) => WebhookAck::ok(),
        Err(RouteError::Malformed(reason)) => {
            tracing::warn!(code = %ErrorCode::WebhookRejected, reason, "Webhook event rejected");
            WebhookAck::failed()
        }
        Err(e) => {
            tracing::error!(error = %e, "Webhook processing failed");
            WebhookAck::failed()
        }
    }
}

/// Route one parsed event
pub async fn route_event(
    pool: &SqlitePool,
    event: &Value,
    now: i64,
) -> Result<WebhookOutcome, RouteError> {
    let kind = classify(event);
    if let EventKind::Other(ref event_type) = kind {
        tracing::info!(event_type = %event_type, "Unhandled webhook event type");
        return Ok(WebhookOutcome::Ignored);
    }

    let payload = order_payload(event);

    let location_id = str_at(event, "location_id")
        .or_else(|| payload.and_then(|p| str_at(p, "location_id")))
        .ok_or(RouteError::Malformed("missing location_id"))?;

    let Some(account_id) = db::connections::resolve_account(pool, location_id).await? else {
        tracing::warn!(
            location_id,
            "No active HubRise connection for location, dropping event"
        );
        return Ok(WebhookOutcome::Unrouted);
    };

    match kind {
        EventKind::OrderCreate => {
            let payload = payload.ok_or(RouteError::Malformed("missing order payload"))?;
            let order = normalize_order(payload, &account_id, location_id, now);
            if order.id.is_empty() {
                return Err(RouteError::Malformed("order has no id"));
            }
            let outcome = upsert_order(pool, &order).await?;
            Ok(if outcome.inserted {
                WebhookOutcome::Created
            } else {
                WebhookOutcome::Duplicate
            })
        }
        EventKind::OrderUpdate => {
            let order_id = payload
                .and_then(|p| id_field(p, "id"))
                .filter(|id| !id.is_empty())
                .or_else(|| id_field(event, "order_id").filter(|id| !id.is_empty()))
                .ok_or(RouteError::Malformed("update without order id"))?;
            let status = payload
                .and_then(|p| str_at(p, "status"))
                .ok_or(RouteError::Malformed("update without status"))?;
            let updated_at = payload
                .and_then(|p| ts_at(p, "updated_at"))
                .or_else(|| ts_at(event, "timestamp"))
                .unwrap_or(now);

            let applied = update_order_status(
                pool,
                &account_id,
                &order_id,
                OrderStatus::parse_lenient(status),
                updated_at,
            )
            .await?;
            Ok(WebhookOutcome::Updated { applied })
        }
        EventKind::Other(_) => Ok(WebhookOutcome::Ignored),
    }
}

/// `data.order`, falling back to HubRise's `new_state`
fn order_payload(event: &Value) -> Option<&Value> {
    event
        .pointer("/data/order")
        .or_else(|| event.get("new_state"))
        .filter(|v| v.is_object())
}

fn str_at<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn ts_at(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::String(s) => shared::util::parse_rfc3339_millis(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}
