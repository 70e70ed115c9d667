//! SQLite implementation of OrderStore.

use crate::domain::{
    Money, Order, OrderId, OrderItem, OrderItemId, OrderStatus, UserId,
};
use crate::storage::{OrderStore, RevenueLine, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite, Transaction};
use std::str::FromStr;
use tracing::{debug, info};

/// SqliteOrderStore implements OrderStore using SQLite.
pub struct SqliteOrderStore {
    pool: Pool<Sqlite>,
}

/// SqliteStoreConfig holds SQLite storage configuration.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            path: "marketplace.db".to_string(),
            max_connections: 5,
        }
    }
}

impl SqliteOrderStore {
    /// Creates a new SQLite order store.
    pub async fn new(config: SqliteStoreConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };

        store.migrate().await?;

        info!(path = %config.path, "Order storage initialized");
        Ok(store)
    }

    /// Runs database migrations to create the schema.
    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS order_items (
                id INTEGER PRIMARY KEY,
                order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                item_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                ordered_price TEXT NOT NULL,
                fulfilled INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items(order_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_order_items_item_id ON order_items(item_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Opens a transaction for the checkout path.
    pub(crate) async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StorageError> {
        Ok(self.pool.begin().await?)
    }

    /// Revenue rows for all counted orders of a buyer.
    pub async fn counted_lines_for_buyer(
        &self,
        buyer_id: UserId,
    ) -> Result<Vec<RevenueLine>, StorageError> {
        // Shipped is the only counted state.
        let rows = sqlx::query(
            r#"
            SELECT o.user_id, oi.item_id, oi.quantity, oi.ordered_price
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = ? AND o.status = ?
            "#,
        )
        .bind(buyer_id)
        .bind(OrderStatus::Shipped.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_revenue_line).collect()
    }

    /// Revenue rows for every counted order in the store. Streamed, since
    /// this is the full-scan backing the top-seller reports.
    pub async fn counted_lines(&self) -> Result<Vec<RevenueLine>, StorageError> {
        let mut rows = sqlx::query(
            r#"
            SELECT o.user_id, oi.item_id, oi.quantity, oi.ordered_price
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.status = ?
            "#,
        )
        .bind(OrderStatus::Shipped.to_string())
        .fetch(&self.pool);

        let mut lines = Vec::new();
        while let Some(row) = rows.try_next().await? {
            lines.push(parse_revenue_line(&row)?);
        }
        Ok(lines)
    }

    /// Number of counted orders belonging to a buyer. Counts orders, not
    /// lines: an order with many lines counts once.
    pub async fn counted_order_count(&self, buyer_id: UserId) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM orders WHERE user_id = ? AND status = ?")
            .bind(buyer_id)
            .bind(OrderStatus::Shipped.to_string())
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

/// Inserts an order row inside an open checkout transaction.
pub(crate) async fn insert_order(
    tx: &mut Transaction<'static, Sqlite>,
    user_id: UserId,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> Result<Order, StorageError> {
    let result = sqlx::query(
        "INSERT INTO orders (user_id, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(user_id)
    .bind(status.to_string())
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(&mut **tx)
    .await?;

    Ok(Order {
        id: result.last_insert_rowid(),
        user_id,
        status,
        created_at: now,
        updated_at: now,
    })
}

/// Inserts an order line inside an open checkout transaction.
/// `ordered_price` is written here once and never updated afterward.
pub(crate) async fn insert_order_item(
    tx: &mut Transaction<'static, Sqlite>,
    order_id: OrderId,
    item_id: i64,
    quantity: i64,
    ordered_price: Money,
    now: DateTime<Utc>,
) -> Result<OrderItem, StorageError> {
    let result = sqlx::query(
        r#"
        INSERT INTO order_items (order_id, item_id, quantity, ordered_price, fulfilled, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
        "#,
    )
    .bind(order_id)
    .bind(item_id)
    .bind(quantity)
    .bind(ordered_price.amount().to_string())
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(&mut **tx)
    .await?;

    Ok(OrderItem {
        id: result.last_insert_rowid(),
        order_id,
        item_id,
        quantity,
        ordered_price,
        fulfilled: false,
        created_at: now,
        updated_at: now,
    })
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        let row = sqlx::query(
            "SELECT id, user_id, status, created_at, updated_at FROM orders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(parse_order_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, created_at, updated_at
            FROM orders WHERE user_id = ? ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_order_row).collect()
    }

    async fn order_items_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, item_id, quantity, ordered_price, fulfilled, created_at, updated_at
            FROM order_items WHERE order_id = ? ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_order_item_row).collect()
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;

        let current = match row {
            Some(row) => parse_status(&row.try_get::<String, _>("status")?)?,
            None => return Err(StorageError::NotFound(format!("order {}", order_id))),
        };

        if !current.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                id: order_id,
                from: current,
                to: status,
            });
        }

        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(order_id, from = %current, to = %status, "Order status updated");
        Ok(())
    }

    async fn mark_fulfilled(&self, order_item_id: OrderItemId) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE order_items SET fulfilled = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(order_item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "order item {}",
                order_item_id
            )));
        }
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), StorageError> {
        // order_items go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("order {}", order_id)));
        }
        Ok(())
    }

    async fn count_orders(&self) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}

fn parse_status(s: &str) -> Result<OrderStatus, StorageError> {
    OrderStatus::from_str(s).map_err(StorageError::InvalidData)
}

fn parse_money(s: &str) -> Result<Money, StorageError> {
    Money::from_str(s).map_err(|e| StorageError::InvalidData(format!("Invalid amount: {}", e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("Invalid timestamp: {}", e)))
}

/// Parses an order from a database row.
fn parse_order_row(row: &sqlx::sqlite::SqliteRow) -> Result<Order, StorageError> {
    let status_str: String = row.try_get("status")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        status: parse_status(&status_str)?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

/// Parses an order line from a database row.
fn parse_order_item_row(row: &sqlx::sqlite::SqliteRow) -> Result<OrderItem, StorageError> {
    let price_str: String = row.try_get("ordered_price")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;
    let fulfilled: i64 = row.try_get("fulfilled")?;

    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        item_id: row.try_get("item_id")?,
        quantity: row.try_get("quantity")?,
        ordered_price: parse_money(&price_str)?,
        fulfilled: fulfilled != 0,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

/// Parses an aggregation scan row.
fn parse_revenue_line(row: &sqlx::sqlite::SqliteRow) -> Result<RevenueLine, StorageError> {
    let price_str: String = row.try_get("ordered_price")?;

    Ok(RevenueLine {
        buyer_id: row.try_get("user_id")?,
        item_id: row.try_get("item_id")?,
        quantity: row.try_get("quantity")?,
        ordered_price: parse_money(&price_str)?,
    })
}
