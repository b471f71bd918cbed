//! Speculative projection of pending actions over a base state.

use super::action::{CartAction, CartState};

/// Project `pending` actions, in order, onto `base`.
///
/// This is a pure function of its inputs: the optimistic controller calls it
/// on every read, against whatever the authoritative base is at that moment,
/// so pending actions are re-based automatically when the base advances.
///
/// Actions that fail validation contribute nothing (no visible change); they
/// do not stop later actions from applying.
///
/// # Example
///
/// ```rust
/// use kago_core::{CartAction, CartState, LineKey, ProductId, SizeId, ColorId, project};
///
/// let key = LineKey::new(ProductId::new("P1"), SizeId::new("M"), ColorId::new("red"));
/// let base = CartState::default();
/// let pending = [CartAction::Remove { key }, CartAction::Toggle];
///
/// let speculative = project(&base, &pending);
/// assert!(speculative.items.is_empty());
/// assert!(speculative.is_open);
/// ```
#[must_use]
pub fn project<'a, I>(base: &CartState, pending: I) -> CartState
where
    I: IntoIterator<Item = &'a CartAction>,
{
    let mut state = base.clone();
    for action in pending {
        // Refused actions are no-ops by contract
        let _ = action.apply(&mut state);
    }
    state
}
