//! Optimistic cart controller.
//!
//! Reads come from a speculative view: the latest published snapshot with
//! every not-yet-committed action projected over it. Writes are validated
//! against that view, assigned the next sequence number, and queued for the
//! [`CommitWorker`]. A dispatched action is visible on the very next read,
//! before the worker has touched it.

use std::collections::VecDeque;
use std::sync::Arc;

use kago_core::{
    CartAction, CartCollection, CartError, CartState, ColorId, DerivedTotals, LineKey,
    PricingPolicy, Product, SizeId, project,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::commit::{Commit, CommitHandle, CommitWorker};
use crate::error::CommitError;
use crate::store::{CartSnapshot, CartStore};

/// Front door for cart reads and writes while the store is owned by a worker.
///
/// Dropping the controller closes the queue; the worker applies whatever is
/// still queued and then returns the store through its [`JoinHandle`].
#[derive(Debug)]
pub struct OptimisticCart {
    base: watch::Receiver<CartSnapshot>,
    queue: mpsc::UnboundedSender<Commit>,
    pending: VecDeque<(u64, CartAction)>,
    next_seq: u64,
    policy: PricingPolicy,
}

impl OptimisticCart {
    /// Hand `store` to a new commit worker and return a controller for it.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(store: CartStore) -> (Self, JoinHandle<CartStore>) {
        let (controller, worker) = Self::new(store);
        (controller, tokio::spawn(worker.run()))
    }

    /// Build a controller and its worker without spawning anything.
    ///
    /// Useful when the caller wants to drive [`CommitWorker::run`] itself.
    #[must_use]
    pub fn new(store: CartStore) -> (Self, CommitWorker) {
        let policy = *store.policy();
        let first_seq = store.committed_seq() + 1;
        let (publish, base) = watch::channel(store.snapshot());
        let (queue, commits) = mpsc::unbounded_channel();

        let controller = Self {
            base,
            queue,
            pending: VecDeque::new(),
            next_seq: first_seq,
            policy,
        };
        let worker = CommitWorker::new(store, commits, publish, first_seq);
        (controller, worker)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Validate `action` against the speculative view and queue it.
    ///
    /// Refused actions are not queued and consume no sequence number. If the
    /// worker has already stopped, the returned handle resolves to
    /// [`CommitError::QueueClosed`] and nothing becomes visible.
    ///
    /// # Errors
    ///
    /// Returns the [`CartError`] the action would produce on the current
    /// speculative state.
    #[instrument(skip_all, fields(kind = action.kind()))]
    pub fn dispatch(&mut self, action: CartAction) -> Result<CommitHandle, CartError> {
        self.prune();

        let mut speculative = self.speculative();
        if let Err(e) = action.apply(&mut speculative) {
            debug!(error = %e, "Action refused before queueing");
            return Err(e);
        }

        let seq = self.next_seq;
        let (reply, receipt) = oneshot::channel();
        let commit = Commit {
            seq,
            action: action.clone(),
            reply,
        };

        if self.queue.send(commit).is_err() {
            warn!(seq, "Commit worker is gone; action dropped");
            return Ok(CommitHandle::new(seq, receipt));
        }

        self.next_seq += 1;
        self.pending.push_back((seq, action));
        debug!(seq, pending = self.pending.len(), "Action queued");
        Ok(CommitHandle::new(seq, receipt))
    }

    /// Add units of a product configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for a non-positive or overflowing quantity.
    pub fn add_item(
        &mut self,
        product: Product,
        size_id: SizeId,
        color_id: ColorId,
        quantity: i64,
    ) -> Result<CommitHandle, CartError> {
        self.dispatch(CartAction::Add {
            product,
            size_id,
            color_id,
            quantity,
        })
    }

    /// Remove a line. Absent keys are accepted.
    ///
    /// # Errors
    ///
    /// Never refused; the `Result` mirrors [`Self::dispatch`].
    pub fn remove_item(&mut self, key: LineKey) -> Result<CommitHandle, CartError> {
        self.dispatch(CartAction::Remove { key })
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] for a positive quantity on a key
    /// that is not in the speculative cart.
    pub fn update_quantity(
        &mut self,
        key: LineKey,
        quantity: i64,
    ) -> Result<CommitHandle, CartError> {
        self.dispatch(CartAction::Update { key, quantity })
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Never refused; the `Result` mirrors [`Self::dispatch`].
    pub fn clear_cart(&mut self) -> Result<CommitHandle, CartError> {
        self.dispatch(CartAction::Clear)
    }

    /// Flip the cart UI's visibility.
    ///
    /// # Errors
    ///
    /// Never refused; the `Result` mirrors [`Self::dispatch`].
    pub fn toggle_cart(&mut self) -> Result<CommitHandle, CartError> {
        self.dispatch(CartAction::Toggle)
    }

    /// Open or close the cart UI.
    ///
    /// # Errors
    ///
    /// Never refused; the `Result` mirrors [`Self::dispatch`].
    pub fn set_cart_open(&mut self, open: bool) -> Result<CommitHandle, CartError> {
        self.dispatch(CartAction::SetOpen(open))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The cart as the user should see it right now.
    #[must_use]
    pub fn speculative(&self) -> CartState {
        let (state, committed) = {
            let snapshot = self.base.borrow();
            (Arc::clone(&snapshot.state), snapshot.committed_seq)
        };
        project(
            &state,
            self.pending
                .iter()
                .filter(|(seq, _)| *seq > committed)
                .map(|(_, action)| action),
        )
    }

    /// Speculative line items.
    #[must_use]
    pub fn items(&self) -> CartCollection {
        self.speculative().items
    }

    /// Derived totals of the speculative cart.
    #[must_use]
    pub fn totals(&self) -> DerivedTotals {
        self.policy.totals(&self.speculative().items)
    }

    /// Speculative visibility flag.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.speculative().is_open
    }

    /// Latest committed snapshot, without pending actions.
    #[must_use]
    pub fn authoritative(&self) -> CartSnapshot {
        self.base.borrow().clone()
    }

    /// Number of dispatched actions the worker has not applied yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let committed = self.base.borrow().committed_seq;
        self.pending
            .iter()
            .filter(|(seq, _)| *seq > committed)
            .count()
    }

    /// Pricing policy for derived totals.
    #[must_use]
    pub const fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Wait until every dispatched action has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError::QueueClosed`] if the worker stopped first.
    pub async fn settle(&mut self) -> Result<CartSnapshot, CommitError> {
        let target = self.next_seq - 1;
        let snapshot = self
            .base
            .wait_for(|snapshot| snapshot.committed_seq >= target)
            .await
            .map_err(|_| CommitError::QueueClosed)?
            .clone();
        self.prune();
        Ok(snapshot)
    }

    fn prune(&mut self) {
        let committed = self.base.borrow().committed_seq;
        while self
            .pending
            .front()
            .is_some_and(|(seq, _)| *seq <= committed)
        {
            self.pending.pop_front();
        }
    }
}
