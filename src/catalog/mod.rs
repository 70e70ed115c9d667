//! Item catalog collaborator interface.
//!
//! Listing CRUD belongs to the surrounding system; the marketplace core
//! only reads listings and reserves stock through this interface.

mod memory;

pub use memory::MemoryCatalog;

use crate::domain::{Item, ItemId};
use thiserror::Error;

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The item does not exist in the catalog.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// Fewer units remain than were requested.
    #[error("insufficient stock for item {0}")]
    InsufficientStock(ItemId),

    /// The catalog seed file could not be loaded.
    #[error("failed to load catalog seed: {0}")]
    Seed(String),
}

/// ItemCatalog is the read/reserve interface consumed by the core.
///
/// `decrement_stock` must be an atomic check-and-decrement: under
/// concurrent checkouts of the last units of an item, at most one caller
/// may succeed.
pub trait ItemCatalog: Send + Sync {
    /// Returns the current listing for an item, or None if it was removed.
    fn get_item(&self, id: ItemId) -> Option<Item>;

    /// Atomically removes `by` units from stock. Fails with
    /// `InsufficientStock` when fewer than `by` units remain; stock is
    /// left unchanged on failure.
    fn decrement_stock(&self, id: ItemId, by: i64) -> Result<(), CatalogError>;

    /// Returns `by` units to stock. Used to release units taken by a
    /// checkout that was subsequently aborted.
    fn restore_stock(&self, id: ItemId, by: i64) -> Result<(), CatalogError>;
}
