//! Cart domain: line items, the ordered collection, actions, and totals.
//!
//! Everything in this module is pure. The authoritative store and the
//! optimistic controller in `kago-cart` both mutate state exclusively through
//! [`CartAction::apply`], which is what keeps a speculative projection and the
//! committed state in agreement.

pub mod action;
pub mod collection;
pub mod error;
pub mod line_item;
pub mod projection;
pub mod totals;

pub use action::{CartAction, CartState};
pub use collection::CartCollection;
pub use error::CartError;
pub use line_item::{LineItem, LineKey, Product, Quantity};
pub use projection::project;
pub use totals::{DerivedTotals, PricingPolicy, subtotal, total_items};
