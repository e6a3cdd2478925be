//! Data models
//!
//! Shared between the server and the dashboard frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All timestamps are UTC milliseconds.

pub mod call;
pub mod connection;
pub mod customer;
pub mod order;

// Re-exports
pub use call::*;
pub use connection::*;
pub use customer::*;
pub use order::*;
