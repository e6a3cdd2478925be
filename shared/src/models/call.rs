//! Cached Call Model

use serde::{Deserialize, Serialize};

/// Local copy of a voice-AI call record
///
/// `cost_cents` stays `None` until enriched; once known it is never reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CachedCall {
    /// Provider call id
    pub id: String,
    pub account_id: String,
    pub phone_number: Option<String>,
    pub duration_seconds: Option<i64>,
    pub status: String,
    pub outcome: Option<String>,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub cost_cents: Option<i64>,
    pub call_at: Option<i64>,
    pub cached_at: i64,
}

/// Result of a reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub synced: u32,
    pub failed: u32,
    pub total: u32,
}

/// Result of one cost backfill pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillSummary {
    /// Calls selected for enrichment
    pub attempted: u32,
    /// Costs fetched and written
    pub updated: u32,
    /// Requests that errored, timed out, or returned no usable cost
    pub failed: u32,
    /// Requests still pending when the overall deadline passed
    pub abandoned: u32,
}
