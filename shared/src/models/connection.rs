//! HubRise Connection Model

use serde::{Deserialize, Serialize};

/// Lifecycle of a HubRise connection row
///
/// Only one `Active` row may exist per (account, location).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ConnectionState {
    Active,
    /// Replaced by a newer connection for the same location
    Superseded,
    /// Disconnected by the account owner
    Revoked,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Superseded => "superseded",
            Self::Revoked => "revoked",
        }
    }
}

/// Account ↔ HubRise location credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct HubriseConnection {
    pub id: String,
    pub account_id: String,
    pub location_id: String,
    pub location_name: String,
    pub hubrise_account_id: Option<String>,
    #[serde(skip_serializing, default)]
    pub access_token: String,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub state: ConnectionState,
    pub created_at: i64,
    pub updated_at: i64,
}
