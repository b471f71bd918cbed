//! Derived values: item count, subtotal, tax, shipping, and total.
//!
//! All functions here are pure and are evaluated on every read against the
//! current snapshot; nothing is cached.

use rust_decimal::Decimal;
use serde::Serialize;

use super::collection::CartCollection;
use crate::types::{Price, PriceError};

/// Totals computed from a collection. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTotals {
    /// Sum of all quantities.
    pub total_items: u64,
    /// Σ unit price × quantity, unrounded.
    pub subtotal: Price,
    /// Tax, rounded to whole yen.
    pub tax: Price,
    /// Shipping fee.
    pub shipping: Price,
    /// `subtotal + tax + shipping`.
    pub total: Price,
}

/// Sum of all quantities.
#[must_use]
pub fn total_items(items: &CartCollection) -> u64 {
    items.iter().map(|item| u64::from(item.quantity().get())).sum()
}

/// Σ unit price × quantity. No rounding.
#[must_use]
pub fn subtotal(items: &CartCollection) -> Price {
    items.iter().map(super::LineItem::line_total).sum()
}

/// Tax and shipping rules.
///
/// The default is the storefront's yen policy: 10% tax rounded half-up to
/// whole yen, free shipping from ¥10,000 (inclusive), ¥500 flat otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    tax_rate: Decimal,
    free_shipping_threshold: Price,
    flat_shipping: Price,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            free_shipping_threshold: Price::from_yen(10_000),
            flat_shipping: Price::from_yen(500),
        }
    }
}

impl PricingPolicy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `tax_rate` is negative.
    pub fn new(
        tax_rate: Decimal,
        free_shipping_threshold: Price,
        flat_shipping: Price,
    ) -> Result<Self, PriceError> {
        if tax_rate < Decimal::ZERO {
            return Err(PriceError::Negative(tax_rate));
        }
        Ok(Self {
            tax_rate,
            free_shipping_threshold,
            flat_shipping,
        })
    }

    /// Tax rate as a fraction (0.10 = 10%).
    #[must_use]
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Subtotal at or above which shipping is free.
    #[must_use]
    pub const fn free_shipping_threshold(&self) -> Price {
        self.free_shipping_threshold
    }

    /// Shipping fee below the threshold.
    #[must_use]
    pub const fn flat_shipping(&self) -> Price {
        self.flat_shipping
    }

    /// `round_half_up(subtotal × tax_rate)`.
    #[must_use]
    pub fn tax(&self, items: &CartCollection) -> Price {
        self.tax_on(subtotal(items))
    }

    /// Zero for an empty cart or a subtotal at or above the threshold,
    /// otherwise the flat fee.
    #[must_use]
    pub fn shipping(&self, items: &CartCollection) -> Price {
        self.shipping_on(items, subtotal(items))
    }

    /// `subtotal + tax + shipping`.
    #[must_use]
    pub fn total(&self, items: &CartCollection) -> Price {
        self.totals(items).total
    }

    /// All derived values for one snapshot.
    #[must_use]
    pub fn totals(&self, items: &CartCollection) -> DerivedTotals {
        let subtotal = subtotal(items);
        let tax = self.tax_on(subtotal);
        let shipping = self.shipping_on(items, subtotal);

        DerivedTotals {
            total_items: total_items(items),
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    fn tax_on(&self, subtotal: Price) -> Price {
        subtotal.scaled_by(self.tax_rate).round_half_up()
    }

    fn shipping_on(&self, items: &CartCollection, subtotal: Price) -> Price {
        if items.is_empty() || subtotal >= self.free_shipping_threshold {
            Price::ZERO
        } else {
            self.flat_shipping
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::line_item::{LineItem, LineKey, Product, Quantity};
    use crate::types::{ColorId, ProductId, SizeId};

    fn cart(lines: &[(&str, u64, i64)]) -> CartCollection {
        let mut cart = CartCollection::new();
        for (id, yen, quantity) in lines {
            cart.add(
                &Product::new(ProductId::new(*id), Price::from_yen(*yen)),
                SizeId::new("M"),
                ColorId::new("red"),
                *quantity,
            )
            .unwrap();
        }
        cart
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let totals = PricingPolicy::default().totals(&CartCollection::new());
        assert_eq!(totals, DerivedTotals::default());
    }

    #[test]
    fn test_single_item_below_threshold() {
        let totals = PricingPolicy::default().totals(&cart(&[("P1", 1000, 1)]));

        assert_eq!(totals.total_items, 1);
        assert_eq!(totals.subtotal, Price::from_yen(1000));
        assert_eq!(totals.tax, Price::from_yen(100));
        assert_eq!(totals.shipping, Price::from_yen(500));
        assert_eq!(totals.total, Price::from_yen(1600));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = PricingPolicy::default();

        let at = cart(&[("P1", 5000, 2)]);
        assert_eq!(policy.shipping(&at), Price::ZERO);
        assert_eq!(policy.total(&at), Price::from_yen(11_000));

        let below = cart(&[("P1", 9999, 1)]);
        assert_eq!(policy.shipping(&below), Price::from_yen(500));
    }

    #[test]
    fn test_tax_rounds_half_up() {
        let policy = PricingPolicy::default();
        // 15 × 0.10 = 1.5 -> 2
        assert_eq!(policy.tax(&cart(&[("P1", 15, 1)])), Price::from_yen(2));
        // 14 × 0.10 = 1.4 -> 1
        assert_eq!(policy.tax(&cart(&[("P1", 14, 1)])), Price::from_yen(1));
        // 125 × 0.10 = 12.5 -> 13
        assert_eq!(policy.tax(&cart(&[("P1", 25, 5)])), Price::from_yen(13));
    }

    #[test]
    fn test_subtotal_is_unrounded() {
        let mut items = CartCollection::new();
        let half_yen = Price::new(Decimal::new(5, 1)).unwrap();
        let p1 = Product::new(ProductId::new("P1"), half_yen);
        items.add(&p1, SizeId::new("M"), ColorId::new("red"), 3).unwrap();

        assert_eq!(subtotal(&items), Price::new(Decimal::new(15, 1)).unwrap());
    }

    #[test]
    fn test_totals_formula_over_mixed_cart() {
        let policy = PricingPolicy::default();
        let items = cart(&[("P1", 1980, 2), ("P2", 3500, 1), ("P3", 120, 4)]);
        let totals = policy.totals(&items);

        let expected_subtotal = Price::from_yen(1980 * 2 + 3500 + 120 * 4);
        assert_eq!(totals.total_items, 7);
        assert_eq!(totals.subtotal, expected_subtotal);
        assert_eq!(totals.tax, Price::from_yen(794)); // 7940 × 0.10
        assert_eq!(totals.shipping, Price::from_yen(500));
        let expected_total = totals.subtotal + totals.tax + totals.shipping;
        assert_eq!(totals.total, expected_total);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy::new(
            Decimal::new(8, 2),
            Price::from_yen(5000),
            Price::from_yen(800),
        )
        .unwrap();
        let items = cart(&[("P1", 1000, 1)]);

        assert_eq!(policy.tax(&items), Price::from_yen(80));
        assert_eq!(policy.shipping(&items), Price::from_yen(800));
    }

    #[test]
    fn test_negative_tax_rate_rejected() {
        let refused = PricingPolicy::new(Decimal::new(-1, 2), Price::ZERO, Price::ZERO);
        assert!(refused.is_err());
    }

    #[test]
    fn test_totals_saturate_at_max_price() {
        let quantity = Quantity::new(i64::from(u32::MAX)).unwrap();
        let lines = ["P1", "P2"].map(|id| {
            let key = LineKey::new(ProductId::new(id), SizeId::new("M"), ColorId::new("red"));
            LineItem::new(key, quantity, Price::MAX)
        });
        let items: CartCollection = lines.into_iter().collect();
        let totals = PricingPolicy::default().totals(&items);

        assert_eq!(totals.subtotal, Price::MAX);
        assert_eq!(totals.tax, Price::from_yen(900_719_925_474_099));
        assert_eq!(totals.shipping, Price::ZERO);
        assert_eq!(totals.total, Price::MAX);
    }
}
