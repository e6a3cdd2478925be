//! Idempotent order upserter

use serde::Serialize;
use shared::models::{Order, OrderStatus};
use sqlx::SqlitePool;

use super::aggregate;
use crate::db;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    /// `false` when the natural id was already stored
    pub inserted: bool,
}

/// Insert an order unless its natural id is known, then update the customer
/// aggregate.
///
/// An aggregation failure after the insert is logged and does not undo the
/// order; the outcome still reports `inserted`.
pub async fn upsert_order(pool: &SqlitePool, order: &Order) -> Result<UpsertOutcome, sqlx::Error> {
    if !db::orders::insert_if_absent(pool, order).await? {
        tracing::info!(order_id = %order.id, "Duplicate order, skipping");
        return Ok(UpsertOutcome { inserted: false });
    }

    tracing::info!(
        order_id = %order.id,
        account_id = %order.account_id,
        platform = order.platform.as_str(),
        total = order.total_cents,
        "Order ingested"
    );

    let fragment = aggregate::fragment_of(order);
    if let Err(e) = aggregate::apply_order_to_customer(
        pool,
        &fragment,
        order.total_cents,
        order.order_timestamp(),
    )
    .await
    {
        tracing::error!(
            order_id = %order.id,
            account_id = %order.account_id,
            error = %e,
            "Customer aggregation failed after order insert"
        );
    }

    Ok(UpsertOutcome { inserted: true })
}

/// Apply a status change to a known order. Unknown ids and stale
/// timestamps are silent no-ops (`false`).
pub async fn update_order_status(
    pool: &SqlitePool,
    account_id: &str,
    natural_id: &str,
    status: OrderStatus,
    updated_at: i64,
) -> Result<bool, sqlx::Error> {
    let applied = db::orders::update_status(pool, account_id, natural_id, status, updated_at).await?;
    if applied {
        tracing::info!(order_id = natural_id, status = status.as_str(), "Order status updated");
    } else {
        tracing::debug!(
            order_id = natural_id,
            "Status update ignored (unknown order or stale timestamp)"
        );
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::ingest::normalize::normalize_order;
    use serde_json::json;

    fn order_json() -> serde_json::Value {
        json!({
            "id": "ord-42",
            "status": "new",
            "customer": {"name": "Alice", "phone_number": "07700900123"},
            "total_price": 1299
        })
    }

    #[tokio::test]
    async fn test_same_create_twice_counts_once() {
        let pool = test_pool().await;
        let order = normalize_order(&order_json(), "acct-1", "loc-1", 1_000);

        assert!(upsert_order(&pool, &order).await.unwrap().inserted);
        assert!(!upsert_order(&pool, &order).await.unwrap().inserted);

        let customer = db::customers::find(&pool, "acct-1", "+447700900123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.total_orders, 1);
        assert_eq!(customer.total_spent_cents, 1299);
        assert_eq!(customer.last_order_date, Some(1_000));
        assert_eq!(db::orders::count(&pool, "acct-1", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_creates_insert_once() {
        let pool = test_pool().await;
        let order = normalize_order(&order_json(), "acct-1", "loc-1", 1_000);

        let (a, b) = tokio::join!(upsert_order(&pool, &order), upsert_order(&pool, &order));
        let inserted = [a.unwrap().inserted, b.unwrap().inserted];
        assert_eq!(inserted.iter().filter(|i| **i).count(), 1);

        let customer = db::customers::find(&pool, "acct-1", "+447700900123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.total_orders, 1);
    }

    #[tokio::test]
    async fn test_order_without_phone_has_no_customer() {
        let pool = test_pool().await;
        let order = normalize_order(&json!({"id": "ord-1", "total_price": 500}), "acct-1", "loc-1", 1);

        assert!(upsert_order(&pool, &order).await.unwrap().inserted);
        assert_eq!(db::customers::count(&pool, "acct-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_unknown_order_is_noop() {
        let pool = test_pool().await;
        let applied = update_order_status(&pool, "acct-1", "ord-404", OrderStatus::Accepted, 5)
            .await
            .unwrap();
        assert!(!applied);
        assert!(db::orders::find(&pool, "acct-1", "ord-404").await.unwrap().is_none());
    }
}
