//! In-memory catalog implementation.

use crate::catalog::{CatalogError, ItemCatalog};
use crate::domain::{Item, ItemId};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::sync::RwLock;
use tracing::info;

/// MemoryCatalog holds listings in a lock-guarded map.
///
/// Stands in for the external catalog service in tests and the demo
/// binary. Stock mutation takes the write lock for the whole
/// check-and-decrement, which gives the compare-and-swap semantics the
/// checkout path relies on.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: RwLock<HashMap<ItemId, Item>>,
}

/// Shape of the YAML seed file: a top-level `items` list.
#[derive(Debug, Deserialize)]
struct CatalogSeed {
    items: Vec<Item>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a listing.
    pub fn list(&self, item: Item) {
        let mut items = self.items.write().unwrap();
        items.insert(item.id, item);
    }

    /// Removes a listing. Carts referencing it keep their lines; the
    /// lines simply stop resolving.
    pub fn delist(&self, id: ItemId) {
        let mut items = self.items.write().unwrap();
        items.remove(&id);
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    /// Returns true if the catalog has no listings.
    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    /// Loads a catalog from a YAML seed file.
    pub fn load_from_yaml(path: &str) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)
            .map_err(|e| CatalogError::Seed(format!("{}: {}", path, e)))?;
        let seed: CatalogSeed =
            serde_yaml::from_str(&content).map_err(|e| CatalogError::Seed(e.to_string()))?;

        let catalog = MemoryCatalog::new();
        for item in seed.items {
            catalog.list(item);
        }

        info!(path = %path, items = catalog.len(), "Catalog seeded");
        Ok(catalog)
    }
}

impl ItemCatalog for MemoryCatalog {
    fn get_item(&self, id: ItemId) -> Option<Item> {
        self.items.read().unwrap().get(&id).cloned()
    }

    fn decrement_stock(&self, id: ItemId, by: i64) -> Result<(), CatalogError> {
        let mut items = self.items.write().unwrap();
        let item = items.get_mut(&id).ok_or(CatalogError::ItemNotFound(id))?;
        if item.stock < by {
            return Err(CatalogError::InsufficientStock(id));
        }
        item.stock -= by;
        Ok(())
    }

    fn restore_stock(&self, id: ItemId, by: i64) -> Result<(), CatalogError> {
        let mut items = self.items.write().unwrap();
        let item = items.get_mut(&id).ok_or(CatalogError::ItemNotFound(id))?;
        item.stock += by;
        Ok(())
    }
}
