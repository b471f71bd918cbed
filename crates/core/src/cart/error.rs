//! Cart validation errors.

use super::line_item::LineKey;

/// A cart action was refused.
///
/// Refused actions are always no-ops: the collection is left exactly as it
/// was before the call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The quantity was zero or negative where a positive one is required.
    #[error("quantity must be a positive integer (got {0})")]
    NonPositiveQuantity(i64),

    /// The quantity does not fit a single line.
    #[error("quantity {0} exceeds the per-line maximum")]
    QuantityTooLarge(i64),

    /// Merging into an existing line would overflow its quantity.
    #[error("quantity overflow on line {0}")]
    QuantityOverflow(LineKey),

    /// The cart's subtotal would exceed the largest representable price.
    #[error("subtotal would exceed the maximum price after changing line {0}")]
    AmountTooLarge(LineKey),

    /// No line with this identity key exists.
    #[error("no line item with key {0}")]
    UnknownLine(LineKey),
}
