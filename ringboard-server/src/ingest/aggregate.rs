//! Customer aggregator

use shared::models::{CustomerFragment, Order};
use sqlx::SqlitePool;

use crate::db;

/// Fold an accepted order into the customer aggregate for its phone.
///
/// Returns `false` when the fragment has no phone and nothing was written.
pub async fn apply_order_to_customer(
    pool: &SqlitePool,
    fragment: &CustomerFragment,
    order_total_cents: i64,
    order_timestamp: i64,
) -> Result<bool, sqlx::Error> {
    if fragment.phone.is_empty() {
        tracing::debug!(
            account_id = %fragment.account_id,
            "Order has no customer phone, skipping aggregation"
        );
        return Ok(false);
    }

    if order_total_cents < 0 {
        tracing::warn!(
            account_id = %fragment.account_id,
            total = order_total_cents,
            "Negative order total clamped to 0"
        );
    }

    db::customers::apply_order(
        pool,
        fragment,
        order_total_cents,
        order_timestamp,
        shared::util::now_millis(),
    )
    .await?;
    Ok(true)
}

/// Customer fragment carried by a canonical order
pub fn fragment_of(order: &Order) -> CustomerFragment {
    CustomerFragment {
        account_id: order.account_id.clone(),
        phone: order.customer_phone.clone(),
        name: order.customer_name.clone(),
        address: order.customer_address.clone(),
        postcode: order.customer_postcode.clone(),
        city: order.customer_city.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_fragment_without_phone_is_skipped() {
        let pool = test_pool().await;
        let fragment = CustomerFragment {
            account_id: "acct-1".into(),
            name: "Walk-in".into(),
            ..Default::default()
        };
        assert!(!apply_order_to_customer(&pool, &fragment, 500, 1).await.unwrap());
        assert_eq!(db::customers::count(&pool, "acct-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_orders_all_counted() {
        let pool = test_pool().await;
        let fragment = CustomerFragment {
            account_id: "acct-1".into(),
            phone: "+447700900123".into(),
            ..Default::default()
        };

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..20_i64 {
            let pool = pool.clone();
            let fragment = fragment.clone();
            tasks.spawn(async move {
                apply_order_to_customer(&pool, &fragment, 100 + i, i).await
            });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().unwrap());
        }

        let customer = db::customers::find(&pool, "acct-1", "+447700900123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.total_orders, 20);
        assert_eq!(customer.total_spent_cents, (0..20).map(|i| 100 + i).sum::<i64>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_customers_stay_independent() {
        use crate::ingest::normalize::normalize_order;
        use crate::ingest::upsert_order;
        use serde_json::json;

        let test_db = crate::db::FileTestDb::open().await;
        let phones = ["07700900123", "07700900456"];

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..30_i64 {
            let pool = test_db.pool.clone();
            let phone = phones[(i % 2) as usize];
            let raw = json!({
                "id": format!("ord-{i}"),
                "customer": {"phone_number": phone},
                "total_price": 100 + i
            });
            tasks.spawn(async move {
                let order = normalize_order(&raw, "acct-1", "loc-1", 1_000 + i);
                // every fifth order is delivered twice
                let first = upsert_order(&pool, &order).await?;
                if i % 5 == 0 {
                    upsert_order(&pool, &order).await?;
                }
                Ok::<_, sqlx::Error>(first.inserted)
            });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().unwrap());
        }

        for (parity, phone) in [(0, "+447700900123"), (1, "+447700900456")] {
            let customer = db::customers::find(&test_db.pool, "acct-1", phone)
                .await
                .unwrap()
                .unwrap();
            let expected: Vec<i64> = (0..30).filter(|i| i % 2 == parity).collect();
            assert_eq!(customer.total_orders, expected.len() as i64);
            assert_eq!(
                customer.total_spent_cents,
                expected.iter().map(|i| 100 + i).sum::<i64>()
            );
        }
        assert_eq!(db::customers::count(&test_db.pool, "acct-1").await.unwrap(), 2);
    }
}
