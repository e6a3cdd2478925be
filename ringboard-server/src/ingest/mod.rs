//! Order ingestion: normalize → upsert → aggregate, driven by webhook events

pub mod aggregate;
pub mod normalize;
pub mod router;
pub mod upsert;

pub use router::{WebhookAck, WebhookOutcome, handle_webhook};
pub use upsert::{UpsertOutcome, update_order_status, upsert_order};
