//! HubRise connection queries
//!
//! Rows are never deleted. The partial unique index
//! `uq_hubrise_connections_active` allows one active row per (account, location).

use shared::models::{ConnectionState, HubriseConnection};
use sqlx::{Sqlite, SqlitePool};

const CONNECTION_SELECT: &str = "SELECT id, account_id, location_id, location_name, hubrise_account_id, access_token, refresh_token, expires_at, state, created_at, updated_at FROM hubrise_connections";

pub async fn insert<'e, E>(executor: E, conn: &HubriseConnection) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO hubrise_connections (id, account_id, location_id, location_name, hubrise_account_id, access_token, refresh_token, expires_at, state, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&conn.id)
    .bind(&conn.account_id)
    .bind(&conn.location_id)
    .bind(&conn.location_name)
    .bind(&conn.hubrise_account_id)
    .bind(&conn.access_token)
    .bind(&conn.refresh_token)
    .bind(conn.expires_at)
    .bind(conn.state.as_str())
    .bind(conn.created_at)
    .bind(conn.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Supersede the current active row for the pair and insert `conn` as active,
/// in one transaction.
pub async fn replace_active(
    pool: &SqlitePool,
    conn: &HubriseConnection,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let superseded = sqlx::query(
        "UPDATE hubrise_connections SET state = 'superseded', updated_at = ?
         WHERE account_id = ? AND location_id = ? AND state = 'active'",
    )
    .bind(conn.updated_at)
    .bind(&conn.account_id)
    .bind(&conn.location_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    insert(&mut *tx, conn).await?;
    tx.commit().await?;
    Ok(superseded)
}

/// Mark the active row revoked. Returns `false` when none was active.
pub async fn revoke(
    pool: &SqlitePool,
    account_id: &str,
    location_id: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE hubrise_connections SET state = 'revoked', updated_at = ?
         WHERE account_id = ? AND location_id = ? AND state = 'active'",
    )
    .bind(now)
    .bind(account_id)
    .bind(location_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Owning account of the most recent active connection for a location
pub async fn resolve_account(
    pool: &SqlitePool,
    location_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT account_id FROM hubrise_connections
         WHERE location_id = ? AND state = 'active'
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(location_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(account_id,)| account_id))
}

/// Every connection of an account, newest first, any state
pub async fn list(
    pool: &SqlitePool,
    account_id: &str,
) -> Result<Vec<HubriseConnection>, sqlx::Error> {
    let sql = format!("{CONNECTION_SELECT} WHERE account_id = ? ORDER BY created_at DESC, id DESC");
    sqlx::query_as::<_, HubriseConnection>(&sql)
        .bind(account_id)
        .fetch_all(pool)
        .await
}
