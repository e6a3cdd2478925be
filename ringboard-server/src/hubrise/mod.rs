//! HubRise integration: REST client and connection lifecycle

pub mod client;
pub mod connect;

pub use client::{HubriseApi, HubriseClient};
pub use connect::{ConnectError, connect_location, resolve_account, revoke_location};
