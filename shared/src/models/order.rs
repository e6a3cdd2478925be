//! Order Model

use serde::{Deserialize, Serialize};

/// Source platform an order was placed through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum Platform {
    UberEats,
    Deliveroo,
    JustEat,
    /// Taken directly by phone, no external platform involved
    Phone,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UberEats => "uber_eats",
            Self::Deliveroo => "deliveroo",
            Self::JustEat => "just_eat",
            Self::Phone => "phone",
            Self::Unknown => "unknown",
        }
    }
}

/// Order lifecycle status as reported by HubRise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    New,
    Received,
    Accepted,
    InPreparation,
    AwaitingShipment,
    AwaitingCollection,
    InDelivery,
    Completed,
    Rejected,
    Cancelled,
    DeliveryFailed,
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Received => "received",
            Self::Accepted => "accepted",
            Self::InPreparation => "in_preparation",
            Self::AwaitingShipment => "awaiting_shipment",
            Self::AwaitingCollection => "awaiting_collection",
            Self::InDelivery => "in_delivery",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::DeliveryFailed => "delivery_failed",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient parse: accepts `"in preparation"`, `"In_Preparation"`, `"canceled"`.
    /// Anything unrecognized maps to [`OrderStatus::Unknown`].
    pub fn parse_lenient(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "new" => Self::New,
            "received" => Self::Received,
            "accepted" => Self::Accepted,
            "in_preparation" => Self::InPreparation,
            "awaiting_shipment" => Self::AwaitingShipment,
            "awaiting_collection" => Self::AwaitingCollection,
            "in_delivery" => Self::InDelivery,
            "completed" => Self::Completed,
            "rejected" => Self::Rejected,
            "cancelled" | "canceled" => Self::Cancelled,
            "delivery_failed" => Self::DeliveryFailed,
            _ => Self::Unknown,
        }
    }
}

/// A single order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: i64,
    /// Unit price in minor currency units
    pub unit_price: i64,
}

/// Canonical order entity
///
/// Immutable after ingestion except for `status` and `updated_at`.
/// Amounts are integer minor units, timestamps are UTC milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Provider-assigned natural id, unique across the store
    pub id: String,
    pub account_id: String,
    pub location_id: String,
    pub platform: Platform,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_postcode: String,
    pub customer_city: String,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub currency: String,
    pub items: Vec<OrderItem>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub ingested_at: i64,
}

impl Order {
    /// Timestamp the customer aggregate records for this order
    pub fn order_timestamp(&self) -> i64 {
        self.created_at.unwrap_or(self.ingested_at)
    }
}
