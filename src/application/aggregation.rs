//! # Batch Aggregation
//!
//! The coalescing core: merges RPC calls issued independently through any
//! number of batch handles into the minimum number of wire batches.
//!
//! One [`BatchAggregator`] exists per hub. Calls accumulate in an
//! aggregation window; the window closes either the moment it reaches the
//! configured maximum batch size (immediately, inside `enqueue`) or at the
//! end of the current scheduling turn (a deferred flush task that every
//! later `enqueue` in the same turn supersedes). Each closed window becomes
//! exactly one wire batch, dispatched through the shared
//! [`RpcBackend`](crate::infrastructure::rpc::RpcBackend).
//!
//! The window and the deferred-flush token live under one mutex, guarding
//! append-then-check-threshold and drain-then-reset as atomic sections. The
//! mutex is never held across an await point; `enqueue` and `flush` are
//! synchronous.

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::infrastructure::rpc::{CallOutcome, RpcBackend, RpcCall, RpcError};

/// Default upper bound on the number of calls per wire batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// An RPC call captured together with its completion callback.
///
/// Created by [`QueuedCall::new`], which also yields the caller-side
/// [`CallFuture`]. Carries no chain or transport identity; the aggregator
/// only needs the call description and somewhere to deliver its outcome.
pub struct QueuedCall {
    call: RpcCall,
    callback: oneshot::Sender<CallOutcome>,
}

impl QueuedCall {
    /// Captures `call` and returns it paired with its completion future.
    #[must_use]
    pub fn new(call: RpcCall) -> (Self, CallFuture) {
        let (callback, receiver) = oneshot::channel();
        (Self { call, callback }, CallFuture { receiver })
    }

    /// Returns the captured call description.
    #[must_use]
    pub fn call(&self) -> &RpcCall {
        &self.call
    }

    fn into_parts(self) -> (RpcCall, oneshot::Sender<CallOutcome>) {
        (self.call, self.callback)
    }
}

impl fmt::Debug for QueuedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedCall")
            .field("method", &self.call.method)
            .finish_non_exhaustive()
    }
}

/// Completion observer for one queued call.
///
/// Resolves to the call's own outcome once the wire batch carrying it
/// resolves: a response value, a per-call RPC error, or the batch-level
/// failure shared by every call of a failed batch. Resolves to
/// [`RpcError::Dropped`] if the call is discarded before execution.
#[derive(Debug)]
#[must_use = "call futures do nothing unless awaited"]
pub struct CallFuture {
    receiver: oneshot::Receiver<CallOutcome>,
}

impl Future for CallFuture {
    type Output = CallOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RpcError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Window state guarded by the aggregator mutex.
#[derive(Default)]
struct Window {
    calls: Vec<QueuedCall>,
    deferred: Option<AbortHandle>,
}

struct Shared {
    backend: Arc<dyn RpcBackend>,
    max_batch_size: usize,
    window: Mutex<Window>,
}

/// Coalesces calls from arbitrarily many batch handles into wire batches.
///
/// Cheap to clone; clones share one window. Calls preserve FIFO order
/// within a window, and windows are closed (and handed to dispatch) in
/// order. Calls added while a flush executes belong to the next window.
#[derive(Clone)]
pub struct BatchAggregator {
    shared: Arc<Shared>,
}

impl BatchAggregator {
    /// Creates an aggregator dispatching through `backend`.
    ///
    /// `max_batch_size` is clamped to at least 1.
    #[must_use]
    pub fn new(backend: Arc<dyn RpcBackend>, max_batch_size: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                max_batch_size: max_batch_size.max(1),
                window: Mutex::new(Window::default()),
            }),
        }
    }

    /// Creates an aggregator with the default maximum batch size.
    #[must_use]
    pub fn with_defaults(backend: Arc<dyn RpcBackend>) -> Self {
        Self::new(backend, DEFAULT_MAX_BATCH_SIZE)
    }

    /// Returns the configured upper bound on calls per wire batch.
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.shared.max_batch_size
    }

    /// Returns the number of calls waiting in the current window.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.window.lock().calls.len()
    }

    /// Appends `calls`, in the order given, to the current window.
    ///
    /// Every time the window reaches the maximum batch size it is closed
    /// and dispatched immediately, synchronously with respect to this call;
    /// any remainder stays in the fresh window. A non-empty window
    /// (re)schedules the deferred end-of-turn flush, superseding a
    /// previously scheduled one. Superseding never drops queued calls; they
    /// carry over into whichever flush runs next.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn enqueue(&self, calls: Vec<QueuedCall>) {
        if calls.is_empty() {
            return;
        }
        let mut closed = Vec::new();
        {
            let mut window = self.shared.window.lock();
            for call in calls {
                window.calls.push(call);
                if window.calls.len() >= self.shared.max_batch_size {
                    if let Some(token) = window.deferred.take() {
                        token.abort();
                    }
                    closed.push(std::mem::take(&mut window.calls));
                }
            }
            if !window.calls.is_empty() {
                self.schedule_deferred(&mut window);
            }
        }
        for batch in closed {
            self.dispatch(batch);
        }
    }

    /// Drains the current window and dispatches it as one wire batch.
    ///
    /// Does nothing when the window is empty. The window is empty again the
    /// moment this returns; completion of the dispatched batch is observed
    /// through the per-call futures.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn flush(&self) {
        let batch = {
            let mut window = self.shared.window.lock();
            window.deferred = None;
            std::mem::take(&mut window.calls)
        };
        if batch.is_empty() {
            return;
        }
        self.dispatch(batch);
    }

    /// Schedules the end-of-turn flush, superseding a pending one.
    ///
    /// The task body has no await points, so an abort can only land before
    /// its drain; queued calls are never lost to supersession.
    fn schedule_deferred(&self, window: &mut Window) {
        if let Some(token) = window.deferred.take() {
            token.abort();
        }
        let aggregator = self.clone();
        let task = tokio::spawn(async move { aggregator.flush() });
        window.deferred = Some(task.abort_handle());
    }

    /// Executes one closed window as a single wire batch on its own task.
    fn dispatch(&self, batch: Vec<QueuedCall>) {
        tracing::debug!(calls = batch.len(), "dispatching aggregated batch");
        let backend = Arc::clone(&self.shared.backend);
        tokio::spawn(async move {
            let (calls, callbacks): (Vec<_>, Vec<_>) =
                batch.into_iter().map(QueuedCall::into_parts).unzip();
            match backend.execute_batch(calls).await {
                Ok(outcomes) => {
                    let mut outcomes = outcomes.into_iter();
                    for callback in callbacks {
                        let outcome = outcomes.next().unwrap_or_else(|| {
                            Err(RpcError::batch_failed("missing outcome in batch response"))
                        });
                        let _ = callback.send(outcome);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "batch execution failed");
                    let failure = RpcError::batch_failed(err.to_string());
                    for callback in callbacks {
                        let _ = callback.send(Err(failure.clone()));
                    }
                }
            }
        });
    }
}

impl fmt::Debug for BatchAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchAggregator")
            .field("max_batch_size", &self.shared.max_batch_size)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::rpc::{BackendError, BackendResult};
    use async_trait::async_trait;
    use futures::future::join_all;
    use serde_json::{json, Value};
    use tokio_test::assert_pending;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        /// Echo each call's method as its outcome.
        Echo,
        /// Fail the whole batch at the transport level.
        FailBatch,
        /// Echo, but drop the last outcome from the response.
        Truncate,
    }

    #[derive(Debug)]
    struct MockBackend {
        mode: Mode,
        batches: Mutex<Vec<Vec<RpcCall>>>,
    }

    impl MockBackend {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                batches: Mutex::new(Vec::new()),
            })
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().iter().map(Vec::len).collect()
        }

        fn recorded_methods(&self) -> Vec<Vec<String>> {
            self.batches
                .lock()
                .iter()
                .map(|batch| batch.iter().map(|call| call.method.clone()).collect())
                .collect()
        }
    }

    #[async_trait]
    impl RpcBackend for MockBackend {
        async fn execute_batch(&self, calls: Vec<RpcCall>) -> BackendResult<Vec<CallOutcome>> {
            self.batches.lock().push(calls.clone());
            match self.mode {
                Mode::FailBatch => Err(BackendError::transport("socket closed")),
                Mode::Echo | Mode::Truncate => {
                    let mut outcomes: Vec<CallOutcome> = calls
                        .iter()
                        .map(|call| {
                            if call.method.starts_with("fail") {
                                Err(RpcError::call(-32000, "execution reverted"))
                            } else {
                                Ok(json!(call.method))
                            }
                        })
                        .collect();
                    if self.mode == Mode::Truncate {
                        outcomes.pop();
                    }
                    Ok(outcomes)
                }
            }
        }
    }

    fn calls(count: usize) -> (Vec<QueuedCall>, Vec<CallFuture>) {
        (0..count)
            .map(|i| QueuedCall::new(RpcCall::new(format!("m{}", i), Value::Null)))
            .unzip()
    }

    #[tokio::test]
    async fn deferred_flush_batches_one_window_in_order() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (queued, futures) = calls(3);
        aggregator.enqueue(queued);
        assert_eq!(aggregator.pending(), 3);

        let outcomes = join_all(futures).await;
        assert_eq!(backend.recorded_methods(), vec![vec!["m0", "m1", "m2"]]);
        assert_eq!(outcomes[0].as_ref().unwrap(), &json!("m0"));
        assert_eq!(outcomes[2].as_ref().unwrap(), &json!("m2"));
        assert_eq!(aggregator.pending(), 0);
    }

    #[tokio::test]
    async fn enqueues_within_one_turn_merge_into_one_batch() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (first, first_future) = QueuedCall::new(RpcCall::new("a", Value::Null));
        aggregator.enqueue(vec![first]);
        let (second, second_future) = QueuedCall::new(RpcCall::new("b", Value::Null));
        let (third, third_future) = QueuedCall::new(RpcCall::new("c", Value::Null));
        aggregator.enqueue(vec![second, third]);

        join_all(vec![first_future, second_future, third_future]).await;

        assert_eq!(backend.batch_sizes(), vec![3]);
        assert_eq!(backend.recorded_methods(), vec![vec!["a", "b", "c"]]);
    }

    #[tokio::test]
    async fn reaching_max_size_flushes_immediately() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 4);

        let (queued, futures) = calls(4);
        aggregator.enqueue(queued);
        // Closed synchronously: nothing carries into the next window.
        assert_eq!(aggregator.pending(), 0);

        join_all(futures).await;
        assert_eq!(backend.batch_sizes(), vec![4]);
    }

    #[tokio::test]
    async fn threshold_counts_calls_across_separate_enqueues() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 4);

        let (queued, first_futures) = calls(2);
        aggregator.enqueue(queued);
        let (queued, second_futures) = calls(2);
        aggregator.enqueue(queued);
        // The second enqueue completes the window and flushes it in place.
        assert_eq!(aggregator.pending(), 0);

        let mut futures = first_futures;
        futures.extend(second_futures);
        join_all(futures).await;
        assert_eq!(backend.batch_sizes(), vec![4]);
    }

    #[tokio::test]
    async fn burst_over_max_leaves_exact_remainder_pending() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (queued, futures) = calls(15);
        aggregator.enqueue(queued);
        assert_eq!(aggregator.pending(), 5);

        let outcomes = join_all(futures).await;
        assert!(outcomes.iter().all(Result::is_ok));
        assert_eq!(backend.batch_sizes(), vec![10, 5]);
        assert_eq!(aggregator.pending(), 0);
    }

    #[tokio::test]
    async fn burst_crossing_max_repeatedly_closes_windows_in_order() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 4);

        let (queued, futures) = calls(9);
        aggregator.enqueue(queued);
        assert_eq!(aggregator.pending(), 1);

        join_all(futures).await;
        assert_eq!(backend.batch_sizes(), vec![4, 4, 1]);
        let recorded = backend.recorded_methods();
        assert_eq!(recorded[0], vec!["m0", "m1", "m2", "m3"]);
        assert_eq!(recorded[2], vec!["m8"]);
    }

    #[tokio::test]
    async fn batch_failure_reaches_every_pending_call() {
        let backend = MockBackend::new(Mode::FailBatch);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (queued, futures) = calls(3);
        aggregator.enqueue(queued);
        let outcomes = join_all(futures).await;

        for outcome in &outcomes {
            let err = outcome.as_ref().unwrap_err();
            assert!(err.is_batch_failure());
            assert!(err.to_string().contains("socket closed"));
        }

        // The failure is local to that window; new calls land in a fresh one.
        let (queued, futures) = calls(2);
        aggregator.enqueue(queued);
        join_all(futures).await;
        assert_eq!(backend.batch_sizes(), vec![3, 2]);
    }

    #[tokio::test]
    async fn per_call_failure_leaves_siblings_untouched() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (ok_call, ok_future) = QueuedCall::new(RpcCall::new("m0", Value::Null));
        let (bad_call, bad_future) = QueuedCall::new(RpcCall::new("fail0", Value::Null));
        aggregator.enqueue(vec![ok_call, bad_call]);

        assert_eq!(ok_future.await.unwrap(), json!("m0"));
        let err = bad_future.await.unwrap_err();
        assert!(err.is_call_error());
        assert_eq!(backend.batch_sizes(), vec![2]);
    }

    #[tokio::test]
    async fn short_backend_response_fails_the_unmatched_tail() {
        let backend = MockBackend::new(Mode::Truncate);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (queued, futures) = calls(3);
        aggregator.enqueue(queued);
        let mut outcomes = join_all(futures).await;

        let last = outcomes.pop().unwrap().unwrap_err();
        assert!(last.is_batch_failure());
        assert!(outcomes.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn empty_enqueue_schedules_nothing() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        aggregator.enqueue(Vec::new());
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert!(backend.batch_sizes().is_empty());
        assert_eq!(aggregator.pending(), 0);
    }

    #[tokio::test]
    async fn manual_flush_drains_ahead_of_the_deferred_task() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (queued, futures) = calls(2);
        aggregator.enqueue(queued);
        aggregator.flush();
        assert_eq!(aggregator.pending(), 0);

        join_all(futures).await;
        tokio::task::yield_now().await;
        // The superseded deferred task finds an empty window and does nothing.
        assert_eq!(backend.batch_sizes(), vec![2]);
    }

    #[tokio::test]
    async fn call_future_is_pending_until_its_window_flushes() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::new(backend.clone(), 10);

        let (queued, future) = QueuedCall::new(RpcCall::new("m0", Value::Null));
        let mut future = tokio_test::task::spawn(future);
        aggregator.enqueue(vec![queued]);
        assert_pending!(future.poll());

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(future.await.unwrap(), json!("m0"));
    }

    #[tokio::test]
    async fn dropped_call_resolves_its_future_with_dropped() {
        let (queued, future) = QueuedCall::new(RpcCall::new("m0", Value::Null));
        drop(queued);
        assert_eq!(future.await.unwrap_err(), RpcError::Dropped);
    }

    #[test]
    fn max_batch_size_is_clamped_to_one() {
        let backend = MockBackend::new(Mode::Echo);
        assert_eq!(BatchAggregator::new(backend, 0).max_batch_size(), 1);
    }

    #[test]
    fn default_max_batch_size() {
        let backend = MockBackend::new(Mode::Echo);
        let aggregator = BatchAggregator::with_defaults(backend);
        assert_eq!(aggregator.max_batch_size(), DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(aggregator.max_batch_size(), 500);
    }

    #[test]
    fn queued_call_debug_shows_method_only() {
        let (queued, _future) = QueuedCall::new(RpcCall::new("eth_chainId", Value::Null));
        let debug = format!("{:?}", queued);
        assert!(debug.contains("eth_chainId"));
        assert_eq!(queued.call().method, "eth_chainId");
    }
}
