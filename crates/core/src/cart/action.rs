//! Cart actions and the state they act on.

use super::collection::CartCollection;
use super::error::CartError;
use super::line_item::{LineKey, Product};
use crate::types::{ColorId, SizeId};

/// Everything a cart action can change.
///
/// `is_open` is the cart drawer's visibility flag. It lives next to the items
/// so reads of both come from one snapshot, but it is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Line items.
    pub items: CartCollection,
    /// Whether the cart UI is open.
    pub is_open: bool,
}

impl CartState {
    /// State with the given items and a closed cart.
    #[must_use]
    pub const fn with_items(items: CartCollection) -> Self {
        Self {
            items,
            is_open: false,
        }
    }
}

/// A user-issued cart mutation.
///
/// Quantities are carried as raw integers so that invalid input reaches
/// [`CartAction::apply`] and is refused there, in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add units of a product configuration (merge-additive).
    Add {
        product: Product,
        size_id: SizeId,
        color_id: ColorId,
        quantity: i64,
    },
    /// Remove a line; absent keys are a no-op.
    Remove { key: LineKey },
    /// Set a line's quantity; zero or less removes it.
    Update { key: LineKey, quantity: i64 },
    /// Remove every line.
    Clear,
    /// Open or close the cart UI.
    SetOpen(bool),
    /// Flip the cart UI.
    Toggle,
}

impl CartAction {
    /// Apply this action to `state`.
    ///
    /// On error `state` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for a non-positive add, a quantity that does not
    /// fit, or a positive update on an unknown key.
    pub fn apply(&self, state: &mut CartState) -> Result<(), CartError> {
        match self {
            Self::Add {
                product,
                size_id,
                color_id,
                quantity,
            } => {
                state
                    .items
                    .add(product, size_id.clone(), color_id.clone(), *quantity)?;
            }
            Self::Remove { key } => {
                state.items.remove(key);
            }
            Self::Update { key, quantity } => {
                state.items.set_quantity(key, *quantity)?;
            }
            Self::Clear => state.items.clear(),
            Self::SetOpen(open) => state.is_open = *open,
            Self::Toggle => state.is_open = !state.is_open,
        }
        Ok(())
    }

    /// Whether this action can change the line items (and so must persist).
    #[must_use]
    pub const fn touches_items(&self) -> bool {
        !matches!(self, Self::SetOpen(_) | Self::Toggle)
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
            Self::Clear => "clear",
            Self::SetOpen(_) => "set_open",
            Self::Toggle => "toggle",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Price, ProductId};

    fn add(id: &str, quantity: i64) -> CartAction {
        CartAction::Add {
            product: Product::new(ProductId::new(id), Price::from_yen(1000)),
            size_id: SizeId::new("M"),
            color_id: ColorId::new("red"),
            quantity,
        }
    }

    fn key(id: &str) -> LineKey {
        LineKey::new(ProductId::new(id), SizeId::new("M"), ColorId::new("red"))
    }

    #[test]
    fn test_apply_add_then_update_then_remove() {
        let mut state = CartState::default();
        add("P1", 1).apply(&mut state).unwrap();
        CartAction::Update {
            key: key("P1"),
            quantity: 5,
        }
        .apply(&mut state)
        .unwrap();
        assert_eq!(state.items.get(&key("P1")).unwrap().quantity().get(), 5);

        CartAction::Remove { key: key("P1") }
            .apply(&mut state)
            .unwrap();
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_apply_error_leaves_state_unchanged() {
        let mut state = CartState::default();
        add("P1", 2).apply(&mut state).unwrap();
        let before = state.clone();

        assert!(add("P1", 0).apply(&mut state).is_err());
        assert!(CartAction::Update {
            key: key("P2"),
            quantity: 1
        }
        .apply(&mut state)
        .is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_visibility_is_orthogonal_to_items() {
        let mut state = CartState::default();
        add("P1", 1).apply(&mut state).unwrap();

        CartAction::Toggle.apply(&mut state).unwrap();
        assert!(state.is_open);
        CartAction::SetOpen(false).apply(&mut state).unwrap();
        assert!(!state.is_open);
        assert_eq!(state.items.len(), 1);

        assert!(!CartAction::Toggle.touches_items());
        assert!(CartAction::Clear.touches_items());
    }
}
