//! Tests for SQLite order storage.

use super::*;
use crate::domain::OrderItem;
use chrono::Utc;
use tempfile::NamedTempFile;

/// Opens a store over a fresh on-disk database. The temp file must stay
/// alive for the duration of the test.
async fn temp_store() -> (NamedTempFile, SqliteOrderStore) {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteOrderStore::new(SqliteStoreConfig {
        path: file.path().to_str().unwrap().to_string(),
        max_connections: 5,
    })
    .await
    .unwrap();
    (file, store)
}

/// Persists one order with the given lines, committing the transaction.
async fn seed_order(
    store: &SqliteOrderStore,
    user_id: UserId,
    lines: &[(ItemId, i64, &str)],
) -> (Order, Vec<OrderItem>) {
    let now = Utc::now();
    let mut tx = store.begin().await.unwrap();
    let order = insert_order(&mut tx, user_id, OrderStatus::Pending, now)
        .await
        .unwrap();

    let mut items = Vec::new();
    for &(item_id, quantity, price) in lines {
        let item = insert_order_item(&mut tx, order.id, item_id, quantity, price.parse().unwrap(), now)
            .await
            .unwrap();
        items.push(item);
    }
    tx.commit().await.unwrap();
    (order, items)
}

// ==================== Order lookup tests ====================

#[tokio::test]
async fn test_find_order_roundtrips_fields() {
    let (_file, store) = temp_store().await;
    let (order, _) = seed_order(&store, 7, &[(1, 2, "19.99")]).await;

    let found = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(found.id, order.id);
    assert_eq!(found.user_id, 7);
    assert_eq!(found.status, OrderStatus::Pending);
    assert_eq!(found.created_at.timestamp(), order.created_at.timestamp());
}

#[tokio::test]
async fn test_find_order_missing_is_none() {
    let (_file, store) = temp_store().await;
    assert!(store.find_order(404).await.unwrap().is_none());
}

#[tokio::test]
async fn test_orders_for_user_newest_first() {
    let (_file, store) = temp_store().await;
    let (first, _) = seed_order(&store, 7, &[(1, 1, "5.00")]).await;
    let (second, _) = seed_order(&store, 7, &[(2, 1, "5.00")]).await;
    seed_order(&store, 8, &[(1, 1, "5.00")]).await;

    let orders = store.orders_for_user(7).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second.id);
    assert_eq!(orders[1].id, first.id);
}

#[tokio::test]
async fn test_order_items_preserve_locked_price() {
    let (_file, store) = temp_store().await;
    let (order, _) = seed_order(&store, 7, &[(1, 3, "19.99"), (2, 1, "0.50")]).await;

    let items = store.order_items_for_order(order.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].item_id, 1);
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].ordered_price, "19.99".parse().unwrap());
    assert_eq!(items[0].line_revenue(), "59.97".parse().unwrap());
    assert!(!items[0].fulfilled);
    assert_eq!(items[1].ordered_price, "0.50".parse().unwrap());
}

// ==================== Status lifecycle tests ====================

#[tokio::test]
async fn test_update_status_moves_forward() {
    let (_file, store) = temp_store().await;
    let (order, _) = seed_order(&store, 7, &[(1, 1, "5.00")]).await;

    store
        .update_status(order.id, OrderStatus::Packaged)
        .await
        .unwrap();
    store
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let found = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(found.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn test_update_status_rejects_reverts() {
    let (_file, store) = temp_store().await;
    let (order, _) = seed_order(&store, 7, &[(1, 1, "5.00")]).await;

    store
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let err = store
        .update_status(order.id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidTransition { .. }));

    // Shipped orders cannot be cancelled either.
    let err = store
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_update_status_unknown_order() {
    let (_file, store) = temp_store().await;
    let err = store
        .update_status(404, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

// ==================== Fulfillment tests ====================

#[tokio::test]
async fn test_mark_fulfilled_sets_flag() {
    let (_file, store) = temp_store().await;
    let (order, items) = seed_order(&store, 7, &[(1, 1, "5.00"), (2, 1, "5.00")]).await;

    store.mark_fulfilled(items[0].id).await.unwrap();

    let items = store.order_items_for_order(order.id).await.unwrap();
    assert!(items[0].fulfilled);
    assert!(!items[1].fulfilled);
}

#[tokio::test]
async fn test_mark_fulfilled_is_idempotent() {
    let (_file, store) = temp_store().await;
    let (order, items) = seed_order(&store, 7, &[(1, 1, "5.00")]).await;

    store.mark_fulfilled(items[0].id).await.unwrap();
    store.mark_fulfilled(items[0].id).await.unwrap();

    let items = store.order_items_for_order(order.id).await.unwrap();
    assert!(items[0].fulfilled);
}

#[tokio::test]
async fn test_mark_fulfilled_unknown_line() {
    let (_file, store) = temp_store().await;
    let err = store.mark_fulfilled(404).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

// ==================== Deletion tests ====================

#[tokio::test]
async fn test_delete_order_cascades_to_lines() {
    let (_file, store) = temp_store().await;
    let (order, _) = seed_order(&store, 7, &[(1, 1, "5.00"), (2, 2, "3.00")]).await;

    store.delete_order(order.id).await.unwrap();

    assert!(store.find_order(order.id).await.unwrap().is_none());
    assert!(store
        .order_items_for_order(order.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_unknown_order() {
    let (_file, store) = temp_store().await;
    let err = store.delete_order(404).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_count_orders() {
    let (_file, store) = temp_store().await;
    assert_eq!(store.count_orders().await.unwrap(), 0);

    seed_order(&store, 7, &[(1, 1, "5.00")]).await;
    seed_order(&store, 8, &[(1, 1, "5.00")]).await;
    assert_eq!(store.count_orders().await.unwrap(), 2);
}

// ==================== Aggregation scan tests ====================

#[tokio::test]
async fn test_counted_lines_only_include_shipped_orders() {
    let (_file, store) = temp_store().await;
    let (shipped, _) = seed_order(&store, 7, &[(1, 10, "5.00")]).await;
    seed_order(&store, 7, &[(2, 10, "10.00")]).await; // stays pending
    let (cancelled, _) = seed_order(&store, 7, &[(3, 1, "99.00")]).await;

    store
        .update_status(shipped.id, OrderStatus::Shipped)
        .await
        .unwrap();
    store
        .update_status(cancelled.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let lines = store.counted_lines_for_buyer(7).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item_id, 1);
    assert_eq!(lines[0].revenue(), "50.00".parse().unwrap());
}

#[tokio::test]
async fn test_counted_order_count_counts_orders_not_lines() {
    let (_file, store) = temp_store().await;
    let (a, _) = seed_order(&store, 7, &[(1, 1, "5.00"), (2, 1, "5.00"), (3, 1, "5.00")]).await;
    let (b, _) = seed_order(&store, 7, &[(1, 1, "5.00")]).await;
    seed_order(&store, 9, &[(1, 1, "5.00")]).await;

    store.update_status(a.id, OrderStatus::Shipped).await.unwrap();
    store.update_status(b.id, OrderStatus::Shipped).await.unwrap();

    assert_eq!(store.counted_order_count(7).await.unwrap(), 2);
    assert_eq!(store.counted_order_count(9).await.unwrap(), 0);
}

#[tokio::test]
async fn test_counted_lines_span_all_buyers() {
    let (_file, store) = temp_store().await;
    let (a, _) = seed_order(&store, 7, &[(1, 2, "5.00")]).await;
    let (b, _) = seed_order(&store, 8, &[(1, 4, "5.00")]).await;

    store.update_status(a.id, OrderStatus::Shipped).await.unwrap();
    store.update_status(b.id, OrderStatus::Shipped).await.unwrap();

    let mut buyers: Vec<UserId> = store
        .counted_lines()
        .await
        .unwrap()
        .iter()
        .map(|line| line.buyer_id)
        .collect();
    buyers.sort();
    assert_eq!(buyers, vec![7, 8]);
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let (_file, store) = temp_store().await;

    {
        let mut tx = store.begin().await.unwrap();
        insert_order(&mut tx, 7, OrderStatus::Pending, Utc::now())
            .await
            .unwrap();
        // dropped without commit
    }

    assert_eq!(store.count_orders().await.unwrap(), 0);
}

#[tokio::test]
async fn test_reopening_store_migrates_idempotently() {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let store = SqliteOrderStore::new(SqliteStoreConfig {
        path: path.clone(),
        max_connections: 5,
    })
    .await
    .unwrap();
    seed_order(&store, 7, &[(1, 1, "5.00")]).await;
    store.close().await.unwrap();

    let reopened = SqliteOrderStore::new(SqliteStoreConfig {
        path,
        max_connections: 5,
    })
    .await
    .unwrap();
    assert_eq!(reopened.count_orders().await.unwrap(), 1);
}
