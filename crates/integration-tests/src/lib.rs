//! Integration tests for Kago.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kago-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Store behavior and derived totals end to end
//! - `optimistic_controller` - Speculative reads, ordering, and teardown
//! - `persistence` - File-backed storage and recovery from bad data
//!
//! This crate only exposes fixtures shared by those test files.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use kago_cart::{CartPersistence, CartStorage, CartStore, DEFAULT_STORAGE_KEY};
use kago_core::{ColorId, LineKey, Price, PricingPolicy, Product, ProductId, SizeId};

/// Size used by every fixture line.
pub const SIZE: &str = "M";
/// Color used by every fixture line.
pub const COLOR: &str = "red";

/// Product priced in whole yen.
#[must_use]
pub fn product(id: &str, yen: u64) -> Product {
    Product::new(ProductId::new(id), Price::from_yen(yen))
}

/// Key of a fixture line for `id`.
#[must_use]
pub fn key(id: &str) -> LineKey {
    LineKey::new(ProductId::new(id), SizeId::new(SIZE), ColorId::new(COLOR))
}

/// Open a store with the default policy on the default key of `storage`.
///
/// # Panics
///
/// Never: the default storage key is always valid.
#[must_use]
pub fn open_store<S: CartStorage + 'static>(storage: Arc<S>) -> CartStore {
    let persistence = CartPersistence::new(storage, DEFAULT_STORAGE_KEY)
        .unwrap_or_else(|e| panic!("default storage key rejected: {e}"));
    CartStore::open(persistence, PricingPolicy::default())
}

/// Add `quantity` of a fixture line directly on the store.
///
/// # Panics
///
/// Panics if the store refuses the add.
pub fn add(store: &mut CartStore, id: &str, yen: u64, quantity: i64) {
    store
        .add_item(&product(id, yen), SizeId::new(SIZE), ColorId::new(COLOR), quantity)
        .unwrap_or_else(|e| panic!("add {id} x{quantity} refused: {e}"));
}
