//! Session-scoped shopping cart.

use crate::catalog::ItemCatalog;
use crate::domain::{Item, ItemId, Money};
use std::collections::BTreeMap;

/// A cart line joined against the live catalog.
#[derive(Debug, Clone)]
pub struct CartLine {
    /// The catalog listing as it currently reads.
    pub item: Item,
    /// Requested quantity.
    pub quantity: i64,
    /// Current price times quantity. Recomputed on every read, never stored.
    pub subtotal: Money,
}

/// Cart is an ephemeral, per-session collection of desired items.
///
/// It holds item references and quantities only; prices are joined in from
/// the catalog when lines are read. A cart is not a financial commitment:
/// stock is deliberately not checked until checkout, so a cart may hold
/// more of an item than is currently available.
///
/// Every stored quantity is positive. Setting a line to zero removes it.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: BTreeMap<ItemId, i64>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the line for `item_id` by `quantity`, creating it if
    /// absent. Non-positive quantities are ignored.
    pub fn add(&mut self, item_id: ItemId, quantity: i64) {
        if quantity <= 0 {
            return;
        }
        *self.lines.entry(item_id).or_insert(0) += quantity;
    }

    /// Sets the line for `item_id` to exactly `quantity`. A quantity of
    /// zero or less removes the line.
    pub fn set_quantity(&mut self, item_id: ItemId, quantity: i64) {
        if quantity <= 0 {
            self.lines.remove(&item_id);
        } else {
            self.lines.insert(item_id, quantity);
        }
    }

    /// Removes the line for `item_id` unconditionally.
    pub fn remove(&mut self, item_id: ItemId) {
        self.lines.remove(&item_id);
    }

    /// Empties the cart. Called after a successful checkout and by the
    /// explicit "empty cart" action.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Quantity currently requested for `item_id`, zero if absent.
    pub fn quantity_of(&self, item_id: ItemId) -> i64 {
        self.lines.get(&item_id).copied().unwrap_or(0)
    }

    /// Sum of all line quantities (the "Cart: N" header counter).
    pub fn total_quantity(&self) -> i64 {
        self.lines.values().sum()
    }

    /// Raw `(item_id, quantity)` pairs in item-id order.
    pub fn entries(&self) -> impl Iterator<Item = (ItemId, i64)> + '_ {
        self.lines.iter().map(|(&id, &qty)| (id, qty))
    }

    /// Lazily joins each line against the catalog, yielding the listing,
    /// quantity and subtotal. Lines whose item no longer exists in the
    /// catalog are skipped, not surfaced as errors.
    pub fn lines<'a, C: ItemCatalog + ?Sized>(
        &'a self,
        catalog: &'a C,
    ) -> impl Iterator<Item = CartLine> + 'a {
        self.lines.iter().filter_map(move |(&id, &quantity)| {
            catalog.get_item(id).map(|item| CartLine {
                subtotal: item.price.times(quantity),
                item,
                quantity,
            })
        })
    }

    /// Sum of all line subtotals at current catalog prices.
    pub fn grand_total<C: ItemCatalog + ?Sized>(&self, catalog: &C) -> Money {
        self.lines(catalog).map(|line| line.subtotal).sum()
    }
}
