//! Error types for persistence and the commit queue.
//!
//! Neither kind is meant to reach the end user: persistence failures are
//! recovered inside [`crate::persistence::CartPersistence`], and commit
//! failures are only observable through a [`crate::CommitHandle`].

use kago_core::CartError;
use thiserror::Error;

/// Durable storage could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored cart could not be encoded or decoded.
    #[error("cart serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage key is not usable as a namespace.
    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey {
        /// Rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// An issued action did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The commit worker stopped before the action was applied.
    #[error("commit queue closed")]
    QueueClosed,

    /// The store refused the action.
    #[error("commit rejected: {0}")]
    Rejected(#[from] CartError),

    /// The sequence number was already applied or already queued.
    #[error("commit {seq} is stale (next expected {expected})")]
    Stale {
        /// Sequence number of the refused commit.
        seq: u64,
        /// Next sequence number the worker will apply.
        expected: u64,
    },
}
