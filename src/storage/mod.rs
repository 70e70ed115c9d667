//! Storage interfaces and implementations for persisted orders.

mod sqlite;

pub use sqlite::{SqliteOrderStore, SqliteStoreConfig};

pub(crate) use sqlite::{insert_order, insert_order_item};

use crate::domain::{ItemId, Money, Order, OrderId, OrderItem, OrderItemId, OrderStatus, UserId};
use async_trait::async_trait;

/// OrderStore defines the persistence interface for orders and their lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Retrieves an order by id.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StorageError>;

    /// All orders belonging to a buyer, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StorageError>;

    /// All lines of an order.
    async fn order_items_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, StorageError>;

    /// Moves an order to a new lifecycle state. Transitions are append-only;
    /// moving to an earlier state fails with `InvalidTransition`.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StorageError>;

    /// Marks a single order line as fulfilled. Idempotent: marking an
    /// already-fulfilled line again is a successful no-op.
    async fn mark_fulfilled(&self, order_item_id: OrderItemId) -> Result<(), StorageError>;

    /// Deletes an order and, through the schema's cascade, all its lines.
    async fn delete_order(&self, order_id: OrderId) -> Result<(), StorageError>;

    /// Total number of persisted orders.
    async fn count_orders(&self) -> Result<i64, StorageError>;

    /// Closes the storage connection.
    async fn close(&self) -> Result<(), StorageError>;
}

/// One order line together with its buyer, as scanned for aggregation.
///
/// Carries the locked `ordered_price`; aggregate revenue is always
/// `ordered_price × quantity`, never a live catalog price.
#[derive(Debug, Clone)]
pub struct RevenueLine {
    pub buyer_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub ordered_price: Money,
}

impl RevenueLine {
    /// Locked price times quantity.
    pub fn revenue(&self) -> Money {
        self.ordered_price.times(self.quantity)
    }
}

/// StorageError represents errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("order {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests;
