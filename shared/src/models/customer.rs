//! Customer Model

use serde::{Deserialize, Serialize};

/// Running statistics for one phone number under one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub account_id: String,
    /// E.164 phone number
    pub phone: String,
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub city: String,
    pub total_orders: i64,
    pub total_spent_cents: i64,
    pub last_order_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Customer details carried by a single order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFragment {
    pub account_id: String,
    /// E.164 phone number, empty when the order carried none
    pub phone: String,
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub city: String,
}
