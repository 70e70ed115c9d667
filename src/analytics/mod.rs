//! Read-only sales and spending aggregates.
//!
//! Every aggregate is computed from counted orders' lines using the
//! locked `ordered_price`. Later catalog price changes never move a
//! number reported here.

use crate::catalog::ItemCatalog;
use crate::domain::{ItemId, Money, UserId};
use crate::storage::{SqliteOrderStore, StorageError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Sales of one item, for merchant reports.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSales {
    pub item_id: ItemId,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Money,
}

/// Spend of one buyer with a merchant, for merchant reports.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerSpend {
    pub user_id: UserId,
    pub spent: Money,
}

/// Analytics answers reporting queries over persisted orders.
///
/// Merchant ownership of a line is resolved through the catalog
/// collaborator; lines whose item no longer resolves are omitted from
/// per-merchant aggregates. An empty store yields zeros and empty lists,
/// never errors.
pub struct Analytics<C: ItemCatalog> {
    store: Arc<SqliteOrderStore>,
    catalog: Arc<C>,
}

impl<C: ItemCatalog> Analytics<C> {
    /// Creates a new analytics engine over the given store and catalog.
    pub fn new(store: Arc<SqliteOrderStore>, catalog: Arc<C>) -> Self {
        Self { store, catalog }
    }

    /// Total money a buyer has spent across all counted orders.
    pub async fn money_spent_by_buyer_total(
        &self,
        buyer_id: UserId,
    ) -> Result<Money, StorageError> {
        let lines = self.store.counted_lines_for_buyer(buyer_id).await?;
        Ok(lines.iter().map(|line| line.revenue()).sum())
    }

    /// Money a buyer has spent on items belonging to one merchant.
    pub async fn money_spent_by_buyer_with_merchant(
        &self,
        buyer_id: UserId,
        merchant_id: UserId,
    ) -> Result<Money, StorageError> {
        let lines = self.store.counted_lines_for_buyer(buyer_id).await?;
        Ok(lines
            .iter()
            .filter(|line| self.merchant_of(line.item_id) == Some(merchant_id))
            .map(|line| line.revenue())
            .sum())
    }

    /// Number of counted orders a buyer has placed. Orders, not lines.
    pub async fn total_orders_for_buyer(&self, buyer_id: UserId) -> Result<i64, StorageError> {
        self.store.counted_order_count(buyer_id).await
    }

    /// The merchant's `n` best-selling items by revenue, descending, ties
    /// broken by ascending item id for deterministic output.
    pub async fn top_selling_items_for_merchant(
        &self,
        merchant_id: UserId,
        n: usize,
    ) -> Result<Vec<ItemSales>, StorageError> {
        let mut by_item: BTreeMap<ItemId, (String, i64, Money)> = BTreeMap::new();
        for line in self.store.counted_lines().await? {
            let item = match self.catalog.get_item(line.item_id) {
                Some(item) if item.merchant_id == merchant_id => item,
                _ => continue,
            };
            let entry = by_item
                .entry(line.item_id)
                .or_insert((item.name, 0, Money::ZERO));
            entry.1 += line.quantity;
            entry.2 += line.revenue();
        }

        let mut sales: Vec<ItemSales> = by_item
            .into_iter()
            .map(|(item_id, (name, units_sold, revenue))| ItemSales {
                item_id,
                name,
                units_sold,
                revenue,
            })
            .collect();
        sales.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.item_id.cmp(&b.item_id)));
        sales.truncate(n);
        Ok(sales)
    }

    /// The merchant's `n` highest-spending buyers, descending, ties broken
    /// by ascending user id.
    pub async fn top_spending_buyers_for_merchant(
        &self,
        merchant_id: UserId,
        n: usize,
    ) -> Result<Vec<BuyerSpend>, StorageError> {
        let mut by_buyer: BTreeMap<UserId, Money> = BTreeMap::new();
        for line in self.store.counted_lines().await? {
            if self.merchant_of(line.item_id) != Some(merchant_id) {
                continue;
            }
            *by_buyer.entry(line.buyer_id).or_insert(Money::ZERO) += line.revenue();
        }

        let mut spenders: Vec<BuyerSpend> = by_buyer
            .into_iter()
            .map(|(user_id, spent)| BuyerSpend { user_id, spent })
            .collect();
        spenders.sort_by(|a, b| b.spent.cmp(&a.spent).then(a.user_id.cmp(&b.user_id)));
        spenders.truncate(n);
        Ok(spenders)
    }

    fn merchant_of(&self, item_id: ItemId) -> Option<UserId> {
        self.catalog.get_item(item_id).map(|item| item.merchant_id)
    }
}
