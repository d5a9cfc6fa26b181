//! # Connection Cache
//!
//! Lazily opened, cached RPC connections keyed by chain and transport.
//!
//! The first request for a chain/transport pair dials through the
//! configured [`Connector`]; every later request returns the cached
//! [`ClientHandle`]. The first successfully opened connection is also
//! bound as the hub-wide execution backend, which is what makes
//! cross-chain call coalescing possible: the aggregator needs one wire
//! to put merged batches on.

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::application::aggregation::{BatchAggregator, CallFuture, QueuedCall};
use crate::application::batch::BatchHandle;
use crate::application::registry::ChainRegistry;
use crate::domain::chain::{Chain, ChainKey};
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::transport::Transport;
use crate::infrastructure::rpc::{
    BackendError, BackendResult, CallOutcome, Connector, RpcBackend, RpcCall,
};

/// Hub-wide execution backend, bound to the first opened connection.
///
/// Starts empty; [`bind`](Self::bind) is first-write-wins. Batches
/// dispatched before any connection exists fail with
/// [`BackendError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBackend {
    slot: Arc<OnceLock<Arc<dyn RpcBackend>>>,
}

impl SharedBackend {
    /// Binds `backend` as the execution backend unless one is bound already.
    pub(crate) fn bind(&self, backend: &Arc<dyn RpcBackend>) {
        let _ = self.slot.set(Arc::clone(backend));
    }
}

#[async_trait]
impl RpcBackend for SharedBackend {
    async fn execute_batch(&self, calls: Vec<RpcCall>) -> BackendResult<Vec<CallOutcome>> {
        match self.slot.get() {
            Some(backend) => backend.execute_batch(calls).await,
            None => Err(BackendError::unavailable("no rpc connection opened yet")),
        }
    }
}

/// An open connection to one chain over one transport.
///
/// Obtained from [`ConnectionCache::for_chain`] and shared; all handles
/// for the same chain/transport pair are the same instance. Calls issued
/// through [`batch`](Self::batch) or [`request`](Self::request) flow into
/// the hub-wide aggregator and may share a wire batch with calls from
/// other chains.
pub struct ClientHandle {
    chain: Arc<Chain>,
    transport: Transport,
    url: String,
    backend: Arc<dyn RpcBackend>,
    aggregator: BatchAggregator,
}

impl ClientHandle {
    /// Returns the chain this connection belongs to.
    #[must_use]
    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    /// Returns the transport the connection was opened over.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Returns the endpoint URL the connection was opened against.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the connection's own backend, bypassing aggregation.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn RpcBackend> {
        &self.backend
    }

    /// Returns a fresh batch handle feeding the hub-wide aggregator.
    #[must_use]
    pub fn batch(&self) -> BatchHandle {
        BatchHandle::new(self.aggregator.clone())
    }

    /// Enqueues a single call and returns its completion future.
    ///
    /// Equivalent to a one-call batch; the call still coalesces with
    /// whatever else the current aggregation window holds.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn request(&self, call: RpcCall) -> CallFuture {
        let (queued, future) = QueuedCall::new(call);
        self.aggregator.enqueue(vec![queued]);
        future
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("chain", &self.chain.id())
            .field("transport", &self.transport)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Opens connections on first use and caches them per chain and transport.
pub struct ConnectionCache {
    registry: Arc<ChainRegistry>,
    connector: Arc<dyn Connector>,
    aggregator: BatchAggregator,
    shared: SharedBackend,
    handles: DashMap<(u64, Transport), Arc<ClientHandle>>,
}

impl ConnectionCache {
    pub(crate) fn new(
        registry: Arc<ChainRegistry>,
        connector: Arc<dyn Connector>,
        aggregator: BatchAggregator,
        shared: SharedBackend,
    ) -> Self {
        Self {
            registry,
            connector,
            aggregator,
            shared,
            handles: DashMap::new(),
        }
    }

    /// Returns the connection for `key` over `transport`, opening it on
    /// first use.
    ///
    /// The connector runs at most once per chain/transport pair; a failed
    /// attempt is not cached and the next call dials again.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown chain,
    /// [`RegistryError::UnresolvedTransport`] when the chain has no URL
    /// for `transport`, and [`RegistryError::Connection`] when the
    /// connector fails.
    pub fn for_chain(
        &self,
        key: impl Into<ChainKey>,
        transport: Transport,
    ) -> RegistryResult<Arc<ClientHandle>> {
        let chain = self.registry.get_chain(key)?;
        match self.handles.entry((chain.chain_id(), transport)) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(slot) => {
                let url = chain
                    .url()
                    .url(transport)
                    .ok_or_else(|| RegistryError::unresolved_transport(chain.id(), transport))?
                    .to_owned();
                let backend = self
                    .connector
                    .connect(&chain, transport, &url)
                    .map_err(|err| RegistryError::connection(err.to_string()))?;
                self.shared.bind(&backend);
                tracing::debug!(chain = %chain.id(), transport = %transport, "opened rpc connection");
                let handle = Arc::new(ClientHandle {
                    chain,
                    transport,
                    url,
                    backend,
                    aggregator: self.aggregator.clone(),
                });
                slot.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` when no connection has been opened yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl fmt::Debug for ConnectionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("connections", &self.handles.len())
            .finish_non_exhaustive()
    }
}
