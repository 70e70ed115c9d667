//! Persisted purchase records.

use crate::domain::{ItemId, Money, OrderId, OrderItemId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OrderStatus represents the lifecycle state of an order.
///
/// Transitions are append-only: an order moves forward through
/// Pending → Packaged → Shipped, or sideways to Cancelled while it has not
/// shipped. It never returns to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created at checkout, awaiting merchant fulfillment.
    Pending,
    /// Every line fulfilled, awaiting shipment.
    Packaged,
    /// Shipped to the buyer. The only state counted in spend aggregates.
    Shipped,
    /// Cancelled before shipping.
    Cancelled,
}

impl OrderStatus {
    /// Returns true if orders in this state count toward spend and order
    /// aggregates. Pending and cancelled orders never do.
    pub fn is_counted(self) -> bool {
        self == OrderStatus::Shipped
    }

    /// Returns true if an order in this state may move to `next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Packaged | Shipped | Cancelled) | (Packaged, Shipped | Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Packaged => "packaged",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "packaged" => Ok(OrderStatus::Packaged),
            "shipped" => Ok(OrderStatus::Shipped),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Order represents a completed checkout owned by the buyer.
///
/// Once created, only the status (and per-line fulfillment) may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier.
    pub id: OrderId,
    /// The buyer who checked out.
    pub user_id: UserId,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// OrderItem is a single line of an order.
///
/// `ordered_price` is the price lock: the catalog price at the moment of
/// purchase, never re-read afterward. Price and quantity are immutable once
/// created; `fulfilled` is the only mutable field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique identifier.
    pub id: OrderItemId,
    /// The order this line belongs to.
    pub order_id: OrderId,
    /// The catalog item purchased.
    pub item_id: ItemId,
    /// Units purchased.
    pub quantity: i64,
    /// Price per unit at purchase time.
    pub ordered_price: Money,
    /// Set by the merchant when this line ships.
    pub fulfilled: bool,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
    /// When the line was last updated.
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    /// Revenue of this line: locked price times quantity. All spend and
    /// sales aggregation is built from this, never from live catalog prices.
    pub fn line_revenue(&self) -> Money {
        self.ordered_price.times(self.quantity)
    }
}
