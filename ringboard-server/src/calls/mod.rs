//! Call platform integration: REST client and cache reconciliation

pub mod client;
pub mod reconcile;

pub use client::{CallApi, VapiClient};
pub use reconcile::{BackfillPolicy, ReconcileError, backfill_costs, reconcile};
