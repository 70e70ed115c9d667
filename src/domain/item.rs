//! Catalog listing snapshot.

use crate::domain::{ItemId, Money, UserId};
use serde::{Deserialize, Serialize};

/// Item is a catalog listing as seen through the catalog collaborator.
///
/// The marketplace core never owns listings; it reads this snapshot at
/// cart-render and checkout time. Prices read here become the locked
/// `ordered_price` on order lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique listing identifier.
    pub id: ItemId,
    /// The merchant user who owns this listing.
    pub merchant_id: UserId,
    /// Display name.
    pub name: String,
    /// URL of the listing image.
    pub image_url: String,
    /// Current asking price.
    pub price: Money,
    /// Units currently available for purchase.
    pub stock: i64,
}
