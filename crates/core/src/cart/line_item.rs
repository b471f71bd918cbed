//! Line items and their identity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::error::CartError;
use crate::types::{ColorId, Price, ProductId, SizeId};

/// A product as supplied by the catalog.
///
/// The cart only reads the id and the price, and only at add time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Catalog product ID.
    pub id: ProductId,
    /// Current unit price.
    pub price: Price,
}

impl Product {
    /// Create a product reference.
    #[must_use]
    pub const fn new(id: ProductId, price: Price) -> Self {
        Self { id, price }
    }
}

/// Composite identity of a line: product, size, and color.
///
/// Two adds with the same key always land on the same line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    product_id: ProductId,
    size_id: SizeId,
    color_id: ColorId,
}

impl LineKey {
    /// Create a key from its three selectors.
    #[must_use]
    pub const fn new(product_id: ProductId, size_id: SizeId, color_id: ColorId) -> Self {
        Self {
            product_id,
            size_id,
            color_id,
        }
    }

    /// Product component.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Size component.
    #[must_use]
    pub const fn size_id(&self) -> &SizeId {
        &self.size_id
    }

    /// Color component.
    #[must_use]
    pub const fn color_id(&self) -> &ColorId {
        &self.color_id
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.product_id, self.size_id, self.color_id)
    }
}

/// A strictly positive line quantity.
///
/// The zero-or-negative case never reaches a `LineItem`: it is either a
/// validation failure (add) or a removal (update).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Validate a caller-supplied quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NonPositiveQuantity`] for `quantity <= 0` and
    /// [`CartError::QuantityTooLarge`] if it does not fit in a `u32`.
    pub fn new(quantity: i64) -> Result<Self, CartError> {
        if quantity <= 0 {
            return Err(CartError::NonPositiveQuantity(quantity));
        }
        u32::try_from(quantity)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(CartError::QuantityTooLarge(quantity))
    }

    /// Returns the quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Add two quantities, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.get()).map(Self)
    }

    /// Add two quantities, clamping at the maximum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.get()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One purchasable configuration in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub(crate) key: LineKey,
    pub(crate) quantity: Quantity,
    pub(crate) unit_price: Price,
}

impl LineItem {
    /// Create a line item.
    ///
    /// `unit_price` is a snapshot; it is not re-read from the catalog.
    #[must_use]
    pub const fn new(key: LineKey, quantity: Quantity, unit_price: Price) -> Self {
        Self {
            key,
            quantity,
            unit_price,
        }
    }

    /// Identity key.
    #[must_use]
    pub const fn key(&self) -> &LineKey {
        &self.key
    }

    /// Product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.key.product_id
    }

    /// Selected size.
    #[must_use]
    pub const fn size_id(&self) -> &SizeId {
        &self.key.size_id
    }

    /// Selected color.
    #[must_use]
    pub const fn color_id(&self) -> &ColorId {
        &self.key.color_id
    }

    /// Current quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Unit price snapshot.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.unit_price
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity.get())
    }
}
