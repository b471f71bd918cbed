//! Kago Cart - the stateful half of the cart core.
//!
//! # Architecture
//!
//! - [`store::CartStore`] owns the authoritative collection and persists after
//!   every mutation through an injectable [`persistence::CartStorage`]
//! - [`commit::CommitWorker`] is the store's only owner at runtime; it applies
//!   queued actions strictly in sequence order and publishes snapshots
//! - [`controller::OptimisticCart`] projects pending actions over the latest
//!   snapshot so reads reflect an action before it commits
//!
//! There are no locks around the cart: one task writes, everyone else reads
//! published snapshots.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kago_cart::{CartPersistence, CartStore, MemoryStorage, OptimisticCart};
//!
//! let persistence = CartPersistence::new(Arc::new(MemoryStorage::new()), "cart-storage")?;
//! let store = CartStore::open(persistence, PricingPolicy::default());
//! let (mut cart, worker) = OptimisticCart::spawn(store);
//!
//! cart.add_item(product, size_id, color_id, 1)?;   // visible immediately
//! assert_eq!(cart.totals().total_items, 1);
//!
//! drop(cart);                                       // worker drains the queue
//! let store = worker.await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commit;
pub mod controller;
pub mod error;
pub mod persistence;
pub mod store;

pub use commit::{CommitHandle, CommitReceipt, CommitSequencer, CommitWorker};
pub use controller::OptimisticCart;
pub use error::{CommitError, PersistenceError};
pub use persistence::{
    CartPersistence, CartStorage, DEFAULT_STORAGE_KEY, FileStorage, MemoryStorage,
};
pub use store::{CartSnapshot, CartStore};
