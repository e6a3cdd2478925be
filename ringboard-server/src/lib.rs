//! Ringboard server
//!
//! Ingests HubRise order webhooks into canonical orders and per-phone customer
//! aggregates, keeps a local cache of voice-AI calls reconciled against the call
//! platform, and serves both to the dashboard.

pub mod api;
pub mod auth;
pub mod calls;
pub mod config;
pub mod db;
pub mod error;
pub mod hubrise;
pub mod ingest;
pub mod logger;
pub mod state;
pub mod upstream;

pub use config::Config;
pub use state::AppState;
