//! Persisted record types and conversions to and from the domain model.

use kago_core::{CartCollection, ColorId, LineItem, LineKey, Price, ProductId, Quantity, SizeId};
use serde::{Deserialize, Serialize};

/// The single record stored under the cart's namespace key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCart {
    /// Line items in display order.
    pub items: Vec<StoredLineItem>,
}

/// A line item as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLineItem {
    /// Identity key string (`product-size-color`). Informational only; the
    /// key is rebuilt from the three component ids on load.
    pub id: String,
    /// Product ID.
    pub product_id: ProductId,
    /// Size selector.
    pub size_id: SizeId,
    /// Color selector.
    pub color_id: ColorId,
    /// Quantity (always positive).
    pub quantity: Quantity,
    /// Unit price snapshot.
    pub price: Price,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&LineItem> for StoredLineItem {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.key().to_string(),
            product_id: item.product_id().clone(),
            size_id: item.size_id().clone(),
            color_id: item.color_id().clone(),
            quantity: item.quantity(),
            price: item.unit_price(),
        }
    }
}

impl From<StoredLineItem> for LineItem {
    fn from(stored: StoredLineItem) -> Self {
        let key = LineKey::new(stored.product_id, stored.size_id, stored.color_id);
        Self::new(key, stored.quantity, stored.price)
    }
}

impl From<&CartCollection> for PersistedCart {
    fn from(items: &CartCollection) -> Self {
        Self {
            items: items.iter().map(StoredLineItem::from).collect(),
        }
    }
}

impl From<PersistedCart> for CartCollection {
    fn from(record: PersistedCart) -> Self {
        // Duplicate keys in hand-edited data merge additively
        record.items.into_iter().map(LineItem::from).collect()
    }
}
