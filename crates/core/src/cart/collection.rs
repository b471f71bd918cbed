//! The ordered, de-duplicated cart collection.

use super::error::CartError;
use super::line_item::{LineItem, LineKey, Product, Quantity};
use crate::types::{ColorId, Price, SizeId};

/// Ordered sequence of line items.
///
/// ## Invariants
///
/// - Insertion order is preserved for display.
/// - At most one [`LineItem`] per [`LineKey`].
/// - Every quantity is positive (enforced by [`Quantity`]).
/// - Mutations keep the subtotal at or below [`Price::MAX`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartCollection {
    items: Vec<LineItem>,
}

impl CartCollection {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate lines in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Lines as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line by key.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.key == key)
    }

    /// Returns `true` if a line with this key exists.
    #[must_use]
    pub fn contains(&self, key: &LineKey) -> bool {
        self.get(key).is_some()
    }

    /// Add `quantity` units of a product configuration.
    ///
    /// Merges into an existing line with the same key; otherwise appends a new
    /// line with the product's current price as its unit price. Returns the
    /// line's resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns an error (and leaves the collection untouched) if `quantity` is
    /// not a positive `u32`, the merge would overflow, or the subtotal would
    /// exceed [`Price::MAX`].
    pub fn add(
        &mut self,
        product: &Product,
        size_id: SizeId,
        color_id: ColorId,
        quantity: i64,
    ) -> Result<Quantity, CartError> {
        let quantity = Quantity::new(quantity)?;
        let key = LineKey::new(product.id.clone(), size_id, color_id);

        if let Some(existing) = self.get(&key) {
            let merged = existing
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| CartError::QuantityOverflow(key.clone()))?;
            let unit_price = existing.unit_price;
            self.ensure_subtotal_fits(&key, merged, unit_price)?;
            if let Some(existing) = self.items.iter_mut().find(|item| item.key == key) {
                existing.quantity = merged;
            }
            return Ok(merged);
        }

        self.ensure_subtotal_fits(&key, quantity, product.price)?;
        self.items.push(LineItem::new(key, quantity, product.price));
        Ok(quantity)
    }

    /// Remove the line with this key. Absent keys are a no-op.
    pub fn remove(&mut self, key: &LineKey) -> Option<LineItem> {
        let index = self.items.iter().position(|item| &item.key == key)?;
        Some(self.items.remove(index))
    }

    /// Set a line's quantity (absolute, not additive).
    ///
    /// A quantity of zero or less removes the line; removing an absent key is
    /// a no-op. Returns the new quantity, or `None` if the line was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] for a positive quantity on an absent
    /// key, [`CartError::QuantityTooLarge`] if it does not fit a line, and
    /// [`CartError::AmountTooLarge`] if the subtotal would exceed
    /// [`Price::MAX`].
    pub fn set_quantity(
        &mut self,
        key: &LineKey,
        quantity: i64,
    ) -> Result<Option<Quantity>, CartError> {
        if quantity <= 0 {
            self.remove(key);
            return Ok(None);
        }

        let quantity = Quantity::new(quantity)?;
        let unit_price = self
            .get(key)
            .map(LineItem::unit_price)
            .ok_or_else(|| CartError::UnknownLine(key.clone()))?;
        self.ensure_subtotal_fits(key, quantity, unit_price)?;
        if let Some(line) = self.items.iter_mut().find(|item| &item.key == key) {
            line.quantity = quantity;
        }
        Ok(Some(quantity))
    }

    /// Refuse a change that would push the subtotal past [`Price::MAX`].
    fn ensure_subtotal_fits(
        &self,
        key: &LineKey,
        quantity: Quantity,
        unit_price: Price,
    ) -> Result<(), CartError> {
        let too_large = || CartError::AmountTooLarge(key.clone());
        let changed = unit_price
            .checked_times(quantity.get())
            .ok_or_else(too_large)?;
        self.items
            .iter()
            .filter(|item| &item.key != key)
            .try_fold(changed, |sum, item| {
                sum.checked_add(item.unit_price.checked_times(item.quantity.get())?)
            })
            .map(|_| ())
            .ok_or_else(too_large)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Merge a whole line in, summing quantities on key collision.
    ///
    /// Used when rehydrating, where a duplicate key means the stored data was
    /// written by something other than this collection.
    fn merge(&mut self, line: LineItem) {
        if let Some(existing) = self.items.iter_mut().find(|item| item.key == line.key) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.items.push(line);
        }
    }
}

impl FromIterator<LineItem> for CartCollection {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        let mut collection = Self::new();
        for line in iter {
            collection.merge(line);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a CartCollection {
    type Item = &'a LineItem;
    type IntoIter = core::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
