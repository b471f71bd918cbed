//! Persistence adapter for the cart's line items.
//!
//! # Storage layout
//!
//! One JSON record per namespace key:
//!
//! ```json
//! { "items": [
//!     { "id": "P1-M-red", "productId": "P1", "sizeId": "M", "colorId": "red",
//!       "quantity": 2, "price": 1000.0 }
//! ] }
//! ```
//!
//! Only the items are stored. The cart's open/closed flag and all derived
//! totals are reset or recomputed on load.
//!
//! # Failure policy
//!
//! Persistence is best-effort. [`CartPersistence::load`] falls back to an
//! empty cart on absent or corrupt data and [`CartPersistence::save`] logs and
//! swallows write errors; the in-memory cart stays authoritative either way.
//! The `try_*` variants expose the underlying error for diagnostics.

mod file;
mod memory;
mod record;

use std::sync::Arc;

use kago_core::CartCollection;
use tracing::{debug, error, instrument, warn};

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use record::{PersistedCart, StoredLineItem};

use crate::error::PersistenceError;

/// Default namespace key for the persisted cart.
pub const DEFAULT_STORAGE_KEY: &str = "cart-storage";

const MAX_KEY_LENGTH: usize = 128;

/// A string key/value store that survives restarts.
///
/// Implementations must be safe to call from the commit worker task.
pub trait CartStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Serializes the cart's items to a [`CartStorage`] under a fixed key.
#[derive(Clone)]
pub struct CartPersistence {
    storage: Arc<dyn CartStorage>,
    key: String,
}

impl std::fmt::Debug for CartPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartPersistence")
            .field("key", &self.key)
            .field("storage", &"dyn CartStorage")
            .finish()
    }
}

impl CartPersistence {
    /// Create an adapter for `key` on `storage`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidKey`] if the key is empty, too long,
    /// or contains characters other than ASCII alphanumerics, `-`, `_`, `.`.
    pub fn new(
        storage: Arc<dyn CartStorage>,
        key: impl Into<String>,
    ) -> Result<Self, PersistenceError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self { storage, key })
    }

    /// Namespace key this adapter reads and writes.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored cart.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend fails or the record does
    /// not decode.
    pub fn try_load(&self) -> Result<Option<CartCollection>, PersistenceError> {
        let Some(raw) = self.storage.load(&self.key)? else {
            return Ok(None);
        };
        let record: PersistedCart = serde_json::from_str(&raw)?;
        Ok(Some(record.into()))
    }

    /// Read the stored cart, falling back to an empty one.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn load(&self) -> CartCollection {
        match self.try_load() {
            Ok(Some(items)) => {
                debug!(lines = items.len(), "Loaded persisted cart");
                items
            }
            Ok(None) => {
                debug!("No persisted cart, starting empty");
                CartCollection::new()
            }
            Err(e) => {
                warn!(error = %e, "Persisted cart unreadable, starting empty");
                CartCollection::new()
            }
        }
    }

    /// Write the cart's items.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if encoding or the backend write fails.
    pub fn try_save(&self, items: &CartCollection) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(&PersistedCart::from(items))?;
        self.storage.save(&self.key, &raw)
    }

    /// Write the cart's items, logging and swallowing failures.
    ///
    /// Returns `true` if the write succeeded.
    #[instrument(skip(self, items), fields(key = %self.key, lines = items.len()))]
    pub fn save(&self, items: &CartCollection) -> bool {
        match self.try_save(items) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to persist cart");
                false
            }
        }
    }
}

fn validate_key(key: &str) -> Result<(), PersistenceError> {
    let invalid = |reason| PersistenceError::InvalidKey {
        key: key.to_owned(),
        reason,
    };

    if key.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(invalid("must be at most 128 characters"));
    }
    if key.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid("may only contain ASCII letters, digits, '-', '_', '.'"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kago_core::{ColorId, Price, Product, ProductId, SizeId};

    use super::*;

    /// Storage that refuses every operation.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn load(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
            Err(PersistenceError::Backend("unavailable".to_string()))
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Backend("unavailable".to_string()))
        }
    }

    fn sample_cart() -> CartCollection {
        let mut items = CartCollection::new();
        items
            .add(
                &Product::new(ProductId::new("P1"), Price::from_yen(1000)),
                SizeId::new("M"),
                ColorId::new("red"),
                2,
            )
            .unwrap();
        items
            .add(
                &Product::new(ProductId::new("P2"), Price::from_yen(2500)),
                SizeId::new("L"),
                ColorId::new("navy"),
                1,
            )
            .unwrap();
        items
    }

    #[test]
    fn test_round_trip() {
        let storage = MemoryStorage::new();
        let persistence = CartPersistence::new(Arc::new(storage), DEFAULT_STORAGE_KEY).unwrap();
        let items = sample_cart();

        assert!(persistence.save(&items));
        assert_eq!(persistence.load(), items);
    }

    #[test]
    fn test_stored_shape() {
        let storage = MemoryStorage::new();
        let persistence =
            CartPersistence::new(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY).unwrap();
        persistence.save(&sample_cart());

        let raw = storage.get(DEFAULT_STORAGE_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 1, "only items are persisted");
        let first = &value["items"][0];
        assert_eq!(first["id"], "P1-M-red");
        assert_eq!(first["productId"], "P1");
        assert_eq!(first["sizeId"], "M");
        assert_eq!(first["colorId"], "red");
        assert_eq!(first["quantity"], 2);
        assert_eq!(first["price"].as_f64(), Some(1000.0));
    }

    #[test]
    fn test_absent_loads_empty() {
        let persistence =
            CartPersistence::new(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY).unwrap();

        assert!(persistence.try_load().unwrap().is_none());
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_corrupt_loads_empty() {
        let storage = MemoryStorage::new();
        storage.insert(DEFAULT_STORAGE_KEY, "{not json");
        let persistence = CartPersistence::new(Arc::new(storage), DEFAULT_STORAGE_KEY).unwrap();

        assert!(matches!(
            persistence.try_load(),
            Err(PersistenceError::Serialization(_))
        ));
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_invalid_quantity_loads_empty() {
        let storage = MemoryStorage::new();
        storage.insert(
            DEFAULT_STORAGE_KEY,
            r#"{"items":[{"id":"P1-M-red","productId":"P1","sizeId":"M","colorId":"red","quantity":0,"price":1000}]}"#,
        );
        let persistence = CartPersistence::new(Arc::new(storage), DEFAULT_STORAGE_KEY).unwrap();

        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_backend_failures_are_swallowed() {
        let persistence = CartPersistence::new(Arc::new(BrokenStorage), "cart").unwrap();

        assert!(persistence.load().is_empty());
        assert!(!persistence.save(&sample_cart()));
        assert!(matches!(
            persistence.try_save(&sample_cart()),
            Err(PersistenceError::Backend(_))
        ));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("cart-storage").is_ok());
        assert!(validate_key("cart_v2.json").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("has space").is_err());
        assert!(validate_key(&"k".repeat(129)).is_err());
    }
}
