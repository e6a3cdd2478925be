//! Per-account settings

use sqlx::SqlitePool;

/// Stored call-platform API key, `None` when never set or blank
pub async fn call_api_key(
    pool: &SqlitePool,
    account_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT call_api_key FROM account_settings WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(pool)
            .await?;
    Ok(row
        .and_then(|(key,)| key)
        .filter(|key| !key.trim().is_empty()))
}

pub async fn set_call_api_key(
    pool: &SqlitePool,
    account_id: &str,
    api_key: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO account_settings (account_id, call_api_key, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (account_id) DO UPDATE SET call_api_key = excluded.call_api_key, updated_at = excluded.updated_at",
    )
    .bind(account_id)
    .bind(api_key)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
