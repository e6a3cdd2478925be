//! HubRise connection lifecycle

use shared::models::{ConnectionState, HubriseConnection};
use sqlx::SqlitePool;
use thiserror::Error;

use super::client::{HubriseApi, ORDER_EVENTS};
use crate::db;
use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("authorization code is empty")]
    EmptyCode,
    #[error("token grant did not name a location")]
    MissingLocation,
    #[error("HubRise request failed: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Connect a HubRise location to an account.
///
/// Exchanges the OAuth code, reads the location, registers the order callback
/// and only then persists: any active connection for the same pair becomes
/// `superseded` and the new one `active`, in one transaction.
pub async fn connect_location(
    pool: &SqlitePool,
    api: &dyn HubriseApi,
    account_id: &str,
    auth_code: &str,
    callback_url: &str,
) -> Result<HubriseConnection, ConnectError> {
    let auth_code = auth_code.trim();
    if auth_code.is_empty() {
        return Err(ConnectError::EmptyCode);
    }

    let grant = api.exchange_code(auth_code).await?;
    let location_id = grant
        .location_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or(ConnectError::MissingLocation)?;

    let location = api.get_location(&location_id, &grant.access_token).await?;
    api.register_webhook(&grant.access_token, callback_url, ORDER_EVENTS)
        .await?;

    let now = shared::util::now_millis();
    let conn = HubriseConnection {
        id: uuid::Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        location_id,
        location_name: location.name,
        hubrise_account_id: grant.account_id.or(location.account_id),
        access_token: grant.access_token,
        refresh_token: grant.refresh_token,
        expires_at: grant.expires_in.map(|secs| now + secs * 1000),
        state: ConnectionState::Active,
        created_at: now,
        updated_at: now,
    };

    let superseded = db::connections::replace_active(pool, &conn).await?;
    tracing::info!(
        account_id,
        location_id = %conn.location_id,
        superseded,
        "HubRise location connected"
    );
    Ok(conn)
}

/// Disconnect a location. Returns `false` when it had no active connection.
pub async fn revoke_location(
    pool: &SqlitePool,
    account_id: &str,
    location_id: &str,
) -> Result<bool, sqlx::Error> {
    let revoked =
        db::connections::revoke(pool, account_id, location_id, shared::util::now_millis()).await?;
    if revoked {
        tracing::info!(account_id, location_id, "HubRise location revoked");
    }
    Ok(revoked)
}

/// Owning account of the location's most recent active connection
pub async fn resolve_account(
    pool: &SqlitePool,
    location_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    db::connections::resolve_account(pool, location_id).await
}
