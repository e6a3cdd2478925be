//! Customer aggregate queries

use shared::models::{Customer, CustomerFragment};
use sqlx::SqlitePool;

const CUSTOMER_SELECT: &str = "SELECT account_id, phone, name, address, postcode, city, total_orders, total_spent_cents, last_order_date, created_at, updated_at FROM customers";

/// Fold one accepted order into the (account, phone) aggregate.
///
/// Single statement: concurrent orders for the same phone serialize on the
/// row and every increment lands. Text fields only fill empty slots.
pub async fn apply_order(
    pool: &SqlitePool,
    fragment: &CustomerFragment,
    total_cents: i64,
    order_timestamp: i64,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO customers (account_id, phone, name, address, postcode, city, total_orders, total_spent_cents, last_order_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?9)
         ON CONFLICT (account_id, phone) DO UPDATE SET
             total_orders = total_orders + 1,
             total_spent_cents = total_spent_cents + excluded.total_spent_cents,
             last_order_date = excluded.last_order_date,
             name = CASE WHEN name = '' THEN excluded.name ELSE name END,
             address = CASE WHEN address = '' THEN excluded.address ELSE address END,
             postcode = CASE WHEN postcode = '' THEN excluded.postcode ELSE postcode END,
             city = CASE WHEN city = '' THEN excluded.city ELSE city END,
             updated_at = excluded.updated_at",
    )
    .bind(&fragment.account_id)
    .bind(&fragment.phone)
    .bind(&fragment.name)
    .bind(&fragment.address)
    .bind(&fragment.postcode)
    .bind(&fragment.city)
    .bind(total_cents.max(0))
    .bind(order_timestamp)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(
    pool: &SqlitePool,
    account_id: &str,
    phone: &str,
) -> Result<Option<Customer>, sqlx::Error> {
    let sql = format!("{CUSTOMER_SELECT} WHERE account_id = ? AND phone = ?");
    sqlx::query_as::<_, Customer>(&sql)
        .bind(account_id)
        .bind(phone)
        .fetch_optional(pool)
        .await
}

/// Highest spend first
pub async fn list(
    pool: &SqlitePool,
    account_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Customer>, sqlx::Error> {
    let sql = format!(
        "{CUSTOMER_SELECT} WHERE account_id = ?
         ORDER BY total_spent_cents DESC, phone ASC LIMIT ? OFFSET ?"
    );
    sqlx::query_as::<_, Customer>(&sql)
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &SqlitePool, account_id: &str) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers WHERE account_id = ?")
        .bind(account_id)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn fragment(name: &str, city: &str) -> CustomerFragment {
        CustomerFragment {
            account_id: "acct-1".into(),
            phone: "+447700900123".into(),
            name: name.into(),
            address: String::new(),
            postcode: String::new(),
            city: city.into(),
        }
    }

    #[tokio::test]
    async fn test_first_order_creates_aggregate() {
        let pool = test_pool().await;
        apply_order(&pool, &fragment("Alice", ""), 1299, 1_000, 5_000)
            .await
            .unwrap();

        let c = find(&pool, "acct-1", "+447700900123").await.unwrap().unwrap();
        assert_eq!(c.total_orders, 1);
        assert_eq!(c.total_spent_cents, 1299);
        assert_eq!(c.last_order_date, Some(1_000));
        assert_eq!(c.created_at, 5_000);
    }

    #[tokio::test]
    async fn test_known_fields_survive_empty_fragment() {
        let pool = test_pool().await;
        apply_order(&pool, &fragment("Alice", ""), 1000, 1_000, 1_000)
            .await
            .unwrap();
        apply_order(&pool, &fragment("", "Leeds"), 500, 2_000, 2_000)
            .await
            .unwrap();
        apply_order(&pool, &fragment("Bob", "York"), 250, 3_000, 3_000)
            .await
            .unwrap();

        let c = find(&pool, "acct-1", "+447700900123").await.unwrap().unwrap();
        assert_eq!(c.name, "Alice");
        assert_eq!(c.city, "Leeds");
        assert_eq!(c.total_orders, 3);
        assert_eq!(c.total_spent_cents, 1750);
        assert_eq!(c.last_order_date, Some(3_000));
        assert_eq!(c.created_at, 1_000);
        assert_eq!(c.updated_at, 3_000);
    }

    #[tokio::test]
    async fn test_negative_total_is_clamped() {
        let pool = test_pool().await;
        apply_order(&pool, &fragment("Alice", ""), 1000, 1_000, 1_000)
            .await
            .unwrap();
        apply_order(&pool, &fragment("Alice", ""), -400, 2_000, 2_000)
            .await
            .unwrap();

        let c = find(&pool, "acct-1", "+447700900123").await.unwrap().unwrap();
        assert_eq!(c.total_orders, 2);
        assert_eq!(c.total_spent_cents, 1000);
    }

    #[tokio::test]
    async fn test_list_orders_by_spend() {
        let pool = test_pool().await;
        let mut low = fragment("Low", "");
        low.phone = "+447700900001".into();
        let mut high = fragment("High", "");
        high.phone = "+447700900002".into();
        apply_order(&pool, &low, 100, 1, 1).await.unwrap();
        apply_order(&pool, &high, 900, 1, 1).await.unwrap();

        let rows = list(&pool, "acct-1", 10, 0).await.unwrap();
        assert_eq!(rows[0].name, "High");
        assert_eq!(rows[1].name, "Low");
        assert_eq!(count(&pool, "acct-1").await.unwrap(), 2);
        assert!(list(&pool, "acct-2", 10, 0).await.unwrap().is_empty());
    }
}
