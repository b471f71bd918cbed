//! Commit queue: applies dispatched actions to the store in issuance order.
//!
//! The controller sends each action with a monotonic sequence number over an
//! unbounded channel. [`CommitWorker`] owns the [`CartStore`] and is the only
//! writer; it feeds arrivals through a [`CommitSequencer`] so that actions are
//! applied strictly in sequence order even if they arrive out of order, and
//! stale or duplicate sequence numbers are refused instead of re-applied.
//!
//! After each applied commit the worker publishes a fresh [`CartSnapshot`]
//! on a `watch` channel, which is the authoritative cell the controller
//! projects over.

use std::collections::BTreeMap;

use kago_core::CartAction;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

use crate::error::CommitError;
use crate::store::{CartSnapshot, CartStore};

/// Proof that an action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Sequence number of the applied action.
    pub seq: u64,
    /// Store revision after applying it.
    pub revision: u64,
}

/// A queued action on its way to the worker.
#[derive(Debug)]
pub(crate) struct Commit {
    pub(crate) seq: u64,
    pub(crate) action: CartAction,
    pub(crate) reply: oneshot::Sender<Result<CommitReceipt, CommitError>>,
}

/// Caller-side handle for one dispatched action.
///
/// Awaiting it is optional: dropping the handle does not cancel the commit.
#[derive(Debug)]
pub struct CommitHandle {
    seq: u64,
    reply: oneshot::Receiver<Result<CommitReceipt, CommitError>>,
}

impl CommitHandle {
    pub(crate) const fn new(
        seq: u64,
        reply: oneshot::Receiver<Result<CommitReceipt, CommitError>>,
    ) -> Self {
        Self { seq, reply }
    }

    /// Sequence number assigned at dispatch.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Wait for the worker to apply the action.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError::Rejected`] if the store refused it,
    /// [`CommitError::Stale`] if its sequence number was already used, or
    /// [`CommitError::QueueClosed`] if the worker stopped first.
    pub async fn committed(self) -> Result<CommitReceipt, CommitError> {
        self.reply.await.map_err(|_| CommitError::QueueClosed)?
    }
}

/// Reorder buffer that releases items strictly in sequence order.
///
/// # Example
///
/// ```rust
/// use kago_cart::CommitSequencer;
///
/// let mut sequencer = CommitSequencer::new(1);
/// assert!(sequencer.accept(2, "b").unwrap().is_empty());
/// assert_eq!(sequencer.accept(1, "a").unwrap(), vec![(1, "a"), (2, "b")]);
/// assert!(sequencer.accept(1, "again").is_err());
/// ```
#[derive(Debug)]
pub struct CommitSequencer<T> {
    next: u64,
    buffered: BTreeMap<u64, T>,
}

impl<T> CommitSequencer<T> {
    /// Create a sequencer expecting `next` as the first sequence number.
    #[must_use]
    pub const fn new(next: u64) -> Self {
        Self {
            next,
            buffered: BTreeMap::new(),
        }
    }

    /// Next sequence number that will be released.
    #[must_use]
    pub const fn next_seq(&self) -> u64 {
        self.next
    }

    /// Number of early arrivals waiting for a gap to fill.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffered.len()
    }

    /// Whether `seq` was already released or is already buffered.
    #[must_use]
    pub fn is_stale(&self, seq: u64) -> bool {
        seq < self.next || self.buffered.contains_key(&seq)
    }

    /// Accept an arrival and return every item now releasable, in order.
    ///
    /// # Errors
    ///
    /// Hands `item` back if `seq` is stale.
    pub fn accept(&mut self, seq: u64, item: T) -> Result<Vec<(u64, T)>, T> {
        if self.is_stale(seq) {
            return Err(item);
        }
        self.buffered.insert(seq, item);

        let mut ready = Vec::new();
        while let Some(item) = self.buffered.remove(&self.next) {
            ready.push((self.next, item));
            self.next += 1;
        }
        Ok(ready)
    }
}

/// Sole owner of the [`CartStore`] while the controller is running.
#[derive(Debug)]
pub struct CommitWorker {
    store: CartStore,
    queue: mpsc::UnboundedReceiver<Commit>,
    publish: watch::Sender<CartSnapshot>,
    sequencer: CommitSequencer<Commit>,
}

impl CommitWorker {
    pub(crate) const fn new(
        store: CartStore,
        queue: mpsc::UnboundedReceiver<Commit>,
        publish: watch::Sender<CartSnapshot>,
        first_seq: u64,
    ) -> Self {
        Self {
            store,
            queue,
            publish,
            sequencer: CommitSequencer::new(first_seq),
        }
    }

    /// Apply commits until every sender is gone, then hand the store back.
    ///
    /// Commits already queued when the controller is dropped are still
    /// applied and persisted.
    #[instrument(skip_all, name = "commit_worker")]
    pub async fn run(mut self) -> CartStore {
        while let Some(commit) = self.queue.recv().await {
            let seq = commit.seq;
            match self.sequencer.accept(seq, commit) {
                Ok(ready) => {
                    for (seq, commit) in ready {
                        self.apply(seq, commit);
                    }
                }
                Err(stale) => {
                    let expected = self.sequencer.next_seq();
                    warn!(seq, expected, "Refusing stale commit");
                    let _ = stale.reply.send(Err(CommitError::Stale { seq, expected }));
                }
            }
        }

        if self.sequencer.buffered() > 0 {
            warn!(
                abandoned = self.sequencer.buffered(),
                next = self.sequencer.next_seq(),
                "Commit queue closed with a sequence gap"
            );
        }
        info!(
            committed_seq = self.store.committed_seq(),
            revision = self.store.revision(),
            "Commit queue drained"
        );
        self.store
    }

    fn apply(&mut self, seq: u64, commit: Commit) {
        let result = self.store.apply(&commit.action);
        self.store.mark_committed(seq);
        self.publish.send_replace(self.store.snapshot());

        debug!(
            seq,
            kind = commit.action.kind(),
            ok = result.is_ok(),
            "Commit applied"
        );

        let outcome = result
            .map(|()| CommitReceipt {
                seq,
                revision: self.store.revision(),
            })
            .map_err(CommitError::from);
        // The caller may have dropped its handle
        let _ = commit.reply.send(outcome);
    }
}
