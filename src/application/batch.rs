//! # Batch Handles
//!
//! Caller-facing staging area for RPC calls.
//!
//! A [`BatchHandle`] collects calls locally and hands them to the hub's
//! [`BatchAggregator`](crate::application::aggregation::BatchAggregator) on
//! [`execute`](BatchHandle::execute). Handles are independent and disposable;
//! any number may stage calls concurrently, and calls executed within the
//! same scheduling turn still coalesce into a single wire batch.

use std::mem;

use crate::application::aggregation::{BatchAggregator, CallFuture, QueuedCall};
use crate::infrastructure::rpc::RpcCall;

/// Stages RPC calls and forwards them to the shared aggregator.
///
/// `add` is purely local; nothing reaches the aggregator (or the wire)
/// until `execute`. A handle is reusable: after `execute` it is empty and
/// ready to stage the next round. Dropping a handle with staged calls
/// resolves their futures with
/// [`RpcError::Dropped`](crate::infrastructure::rpc::RpcError::Dropped).
#[derive(Debug)]
pub struct BatchHandle {
    aggregator: BatchAggregator,
    staged: Vec<QueuedCall>,
}

impl BatchHandle {
    pub(crate) fn new(aggregator: BatchAggregator) -> Self {
        Self {
            aggregator,
            staged: Vec::new(),
        }
    }

    /// Stages `call` and returns the future resolving to its outcome.
    ///
    /// The future stays pending until the call's window is flushed and the
    /// backend responds.
    pub fn add(&mut self, call: RpcCall) -> CallFuture {
        let (queued, future) = QueuedCall::new(call);
        self.staged.push(queued);
        future
    }

    /// Hands all staged calls to the aggregator, leaving the handle empty.
    ///
    /// Staged order is preserved. Does nothing when no calls are staged.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn execute(&mut self) {
        self.aggregator.enqueue(mem::take(&mut self.staged));
    }

    /// Returns the number of staged, not yet executed calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Returns `true` when no calls are staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}
