//! Cart-to-order conversion.
//!
//! The one write path in the core: it turns a session's cart into a
//! persisted order graph, locking prices and reserving stock,
//! all-or-nothing.

use crate::catalog::ItemCatalog;
use crate::domain::{Cart, Item, ItemId, Money, Order, OrderStatus, UserId};
use crate::session::Session;
use crate::storage::{insert_order, insert_order_item, SqliteOrderStore, StorageError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Reasons a checkout can be refused. Every failure leaves the store and
/// the cart exactly as they were.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No buyer is logged in. Anonymous checkout is rejected.
    #[error("checkout requires a logged-in buyer")]
    Unauthenticated,

    /// The cart has no purchasable lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A requested quantity exceeds the item's available stock. The whole
    /// checkout is aborted rather than partially fulfilled.
    #[error("insufficient stock for item {0}")]
    InsufficientStock(ItemId),

    /// The order graph could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// CheckoutTransactor converts carts into persisted orders.
pub struct CheckoutTransactor<C: ItemCatalog> {
    store: Arc<SqliteOrderStore>,
    catalog: Arc<C>,
}

impl<C: ItemCatalog> CheckoutTransactor<C> {
    /// Creates a new transactor over the given store and catalog.
    pub fn new(store: Arc<SqliteOrderStore>, catalog: Arc<C>) -> Self {
        Self { store, catalog }
    }

    /// Converts `cart` into a persisted order owned by `buyer`.
    ///
    /// Each line is re-resolved against the live catalog: the price read
    /// here becomes the line's locked `ordered_price`, regardless of what
    /// the cart was rendered with. Lines whose item has been delisted are
    /// skipped, matching the cart view; a cart with no surviving lines is
    /// an `EmptyCart`.
    ///
    /// Either the full order with all its lines commits and every line's
    /// stock is decremented, or nothing persists at all. Stock reservation
    /// is a per-item compare-and-swap, so of two concurrent checkouts
    /// racing for the last units exactly one succeeds.
    pub async fn checkout(
        &self,
        cart: &Cart,
        buyer: Option<UserId>,
    ) -> Result<Order, CheckoutError> {
        let buyer = buyer.ok_or(CheckoutError::Unauthenticated)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut resolved: Vec<(Item, i64)> = Vec::with_capacity(cart.len());
        for (item_id, quantity) in cart.entries() {
            let item = match self.catalog.get_item(item_id) {
                Some(item) => item,
                None => continue,
            };
            if item.stock < quantity {
                return Err(CheckoutError::InsufficientStock(item_id));
            }
            resolved.push((item, quantity));
        }
        if resolved.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let order = insert_order(&mut tx, buyer, OrderStatus::Pending, now).await?;

        let mut total = Money::ZERO;
        for (item, quantity) in &resolved {
            let line = insert_order_item(&mut tx, order.id, item.id, *quantity, item.price, now)
                .await?;
            total += line.line_revenue();
        }

        // Reserve stock after the lines are staged. Dropping the open
        // transaction on any failure below rolls the order graph back.
        for (i, (item, quantity)) in resolved.iter().enumerate() {
            if self.catalog.decrement_stock(item.id, *quantity).is_err() {
                // An item delisted mid-checkout cannot be fulfilled either.
                self.release(&resolved[..i]);
                return Err(CheckoutError::InsufficientStock(item.id));
            }
        }

        if let Err(e) = tx.commit().await {
            self.release(&resolved);
            return Err(StorageError::from(e).into());
        }

        info!(
            order_id = order.id,
            buyer_id = buyer,
            lines = resolved.len(),
            total = %total,
            "Order created"
        );

        Ok(order)
    }

    /// Checks out the session's cart as the session's current user and
    /// clears the cart on success. Failed checkouts leave the cart intact
    /// so the buyer can adjust quantities and retry.
    pub async fn checkout_session(&self, session: &mut Session) -> Result<Order, CheckoutError> {
        let order = self
            .checkout(session.cart(), session.current_user_id())
            .await?;
        session.cart_mut().clear();
        Ok(order)
    }

    /// Returns units taken by an aborted checkout.
    fn release(&self, taken: &[(Item, i64)]) {
        for (item, quantity) in taken {
            if let Err(e) = self.catalog.restore_stock(item.id, *quantity) {
                warn!(item_id = item.id, error = %e, "Failed to restore stock");
            }
        }
    }
}
