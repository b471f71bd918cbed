//! The authoritative cart store.

use std::sync::Arc;

use kago_core::{
    CartAction, CartCollection, CartError, CartState, ColorId, DerivedTotals, LineItem, LineKey,
    Price, PricingPolicy, Product, Quantity, SizeId,
};
use tracing::{debug, info, instrument, warn};

use crate::persistence::CartPersistence;

/// Immutable view of the store, published to read-only consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Items and visibility flag.
    pub state: Arc<CartState>,
    /// Number of successful mutations since the store was opened.
    pub revision: u64,
    /// Highest commit sequence number applied (0 before the first commit).
    pub committed_seq: u64,
}

/// Exclusive owner of the authoritative cart.
///
/// Every successful item mutation is followed by a synchronous save through
/// the [`CartPersistence`] hook, so writes reach storage in mutation order.
/// Refused mutations change nothing and write nothing.
#[derive(Debug)]
pub struct CartStore {
    state: CartState,
    policy: PricingPolicy,
    persistence: CartPersistence,
    revision: u64,
    committed_seq: u64,
}

impl CartStore {
    /// Open the store, rehydrating items from `persistence`.
    ///
    /// Unreadable storage yields an empty cart. The cart always starts closed.
    #[instrument(skip_all, fields(key = %persistence.key()))]
    pub fn open(persistence: CartPersistence, policy: PricingPolicy) -> Self {
        let items = persistence.load();
        info!(lines = items.len(), "Cart store opened");

        Self {
            state: CartState::with_items(items),
            policy,
            persistence,
            revision: 0,
            committed_seq: 0,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of a product configuration.
    ///
    /// Merges into the existing line for the same key; otherwise appends a line
    /// priced at `product.price`. Returns the line's resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] (and changes nothing) for a non-positive quantity
    /// or an overflowing merge.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(
        &mut self,
        product: &Product,
        size_id: SizeId,
        color_id: ColorId,
        quantity: i64,
    ) -> Result<Quantity, CartError> {
        let result = self.state.items.add(product, size_id, color_id, quantity);
        match &result {
            Ok(total) => {
                debug!(quantity = total.get(), "Line added");
                self.persist();
            }
            Err(e) => warn!(error = %e, "Add refused"),
        }
        result
    }

    /// Remove a line. Removing an absent key is a no-op, not an error.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn remove_item(&mut self, key: &LineKey) -> Option<LineItem> {
        let removed = self.state.items.remove(key);
        debug!(removed = removed.is_some(), "Line removal");
        self.persist();
        removed
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] (and changes nothing) for a positive
    /// quantity on a key that is not in the cart.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            self.remove_item(key);
            return Ok(());
        }

        match self.state.items.set_quantity(key, quantity) {
            Ok(_) => {
                debug!(quantity, "Line quantity set");
                self.persist();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Update refused");
                Err(e)
            }
        }
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) {
        let lines = self.state.items.len();
        self.state.items.clear();
        debug!(lines, "Cart cleared");
        self.persist();
    }

    /// Flip the cart UI's visibility. Returns the new value.
    pub fn toggle_cart(&mut self) -> bool {
        self.set_cart_open(!self.state.is_open);
        self.state.is_open
    }

    /// Open or close the cart UI. Not persisted.
    pub fn set_cart_open(&mut self, open: bool) {
        self.state.is_open = open;
        self.revision += 1;
    }

    /// Apply an action through the matching primitive.
    ///
    /// # Errors
    ///
    /// Returns the primitive's [`CartError`], if any.
    pub fn apply(&mut self, action: &CartAction) -> Result<(), CartError> {
        match action {
            CartAction::Add {
                product,
                size_id,
                color_id,
                quantity,
            } => self
                .add_item(product, size_id.clone(), color_id.clone(), *quantity)
                .map(|_| ()),
            CartAction::Remove { key } => {
                self.remove_item(key);
                Ok(())
            }
            CartAction::Update { key, quantity } => self.update_quantity(key, *quantity),
            CartAction::Clear => {
                self.clear_cart();
                Ok(())
            }
            CartAction::SetOpen(open) => {
                self.set_cart_open(*open);
                Ok(())
            }
            CartAction::Toggle => {
                self.toggle_cart();
                Ok(())
            }
        }
    }

    /// Record that commit `seq` has been applied.
    pub(crate) fn mark_committed(&mut self, seq: u64) {
        self.committed_seq = self.committed_seq.max(seq);
    }

    fn persist(&mut self) {
        self.revision += 1;
        self.persistence.save(&self.state.items);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current line items.
    #[must_use]
    pub const fn items(&self) -> &CartCollection {
        &self.state.items
    }

    /// Items and visibility flag.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Whether the cart UI is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.state.is_open
    }

    /// Pricing policy used for derived totals.
    #[must_use]
    pub const fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Number of successful mutations since open.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Highest applied commit sequence number.
    #[must_use]
    pub const fn committed_seq(&self) -> u64 {
        self.committed_seq
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        kago_core::total_items(&self.state.items)
    }

    /// Σ unit price × quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        kago_core::subtotal(&self.state.items)
    }

    /// Tax on the subtotal.
    #[must_use]
    pub fn tax(&self) -> Price {
        self.policy.tax(&self.state.items)
    }

    /// Shipping fee.
    #[must_use]
    pub fn shipping(&self) -> Price {
        self.policy.shipping(&self.state.items)
    }

    /// Grand total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.policy.total(&self.state.items)
    }

    /// All derived values at once.
    #[must_use]
    pub fn totals(&self) -> DerivedTotals {
        self.policy.totals(&self.state.items)
    }

    /// Immutable snapshot for publishing.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            state: Arc::new(self.state.clone()),
            revision: self.revision,
            committed_seq: self.committed_seq,
        }
    }
}
