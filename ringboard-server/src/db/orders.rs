//! Order queries

use shared::models::{Order, OrderItem, OrderStatus, Platform};
use sqlx::SqlitePool;
use sqlx::types::Json;

const ORDER_SELECT: &str = "SELECT id, account_id, location_id, platform, status, customer_name, customer_phone, customer_address, customer_postcode, customer_city, total_cents, tax_cents, currency, items, created_at, updated_at, ingested_at FROM orders";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    account_id: String,
    location_id: String,
    platform: Platform,
    status: OrderStatus,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    customer_postcode: String,
    customer_city: String,
    total_cents: i64,
    tax_cents: i64,
    currency: String,
    items: Json<Vec<OrderItem>>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
    ingested_at: i64,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            location_id: row.location_id,
            platform: row.platform,
            status: row.status,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            customer_address: row.customer_address,
            customer_postcode: row.customer_postcode,
            customer_city: row.customer_city,
            total_cents: row.total_cents,
            tax_cents: row.tax_cents,
            currency: row.currency,
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            ingested_at: row.ingested_at,
        }
    }
}

/// Insert unless the natural id already exists. Returns `true` when a row was written.
pub async fn insert_if_absent(pool: &SqlitePool, order: &Order) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO orders (id, account_id, location_id, platform, status, customer_name, customer_phone, customer_address, customer_postcode, customer_city, total_cents, tax_cents, currency, items, created_at, updated_at, ingested_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(&order.id)
    .bind(&order.account_id)
    .bind(&order.location_id)
    .bind(order.platform.as_str())
    .bind(order.status.as_str())
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.customer_address)
    .bind(&order.customer_postcode)
    .bind(&order.customer_city)
    .bind(order.total_cents)
    .bind(order.tax_cents)
    .bind(&order.currency)
    .bind(Json(&order.items))
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.ingested_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Forward-only status change scoped to the owning account
pub async fn update_status(
    pool: &SqlitePool,
    account_id: &str,
    id: &str,
    status: OrderStatus,
    updated_at: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?1, updated_at = ?2
         WHERE id = ?3 AND account_id = ?4 AND (updated_at IS NULL OR updated_at <= ?2)",
    )
    .bind(status.as_str())
    .bind(updated_at)
    .bind(id)
    .bind(account_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find(
    pool: &SqlitePool,
    account_id: &str,
    id: &str,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("{ORDER_SELECT} WHERE account_id = ? AND id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(account_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Order::from))
}

/// Newest first. `status = None` lists every status.
pub async fn list(
    pool: &SqlitePool,
    account_id: &str,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!(
        "{ORDER_SELECT} WHERE account_id = ?1 AND (?2 IS NULL OR status = ?2)
         ORDER BY COALESCE(created_at, ingested_at) DESC, id DESC LIMIT ?3 OFFSET ?4"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(account_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Order::from).collect())
}

pub async fn count(
    pool: &SqlitePool,
    account_id: &str,
    status: Option<OrderStatus>,
) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE account_id = ?1 AND (?2 IS NULL OR status = ?2)",
    )
    .bind(account_id)
    .bind(status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?;
    Ok(total)
}
