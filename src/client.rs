//! # Chain Hub
//!
//! The assembled client: registry, connection cache, and one shared
//! batch aggregator.
//!
//! A [`ChainHub`] is built once, from an explicit descriptor list or the
//! built-in one, and handed around behind an `Arc` or by reference. All
//! connections opened through it feed the same aggregator, so RPC calls
//! issued anywhere in the process within one scheduling turn travel in
//! one wire batch.

use std::fmt;
use std::sync::Arc;

use crate::application::aggregation::{BatchAggregator, DEFAULT_MAX_BATCH_SIZE};
use crate::application::registry::ChainRegistry;
use crate::domain::chain::{Chain, ChainKey, ChainKind};
use crate::domain::descriptor::{ChainDescriptor, EnvSource};
use crate::domain::errors::RegistryResult;
use crate::domain::transport::Transport;
use crate::infrastructure::chainlist;
use crate::infrastructure::connection::{ClientHandle, ConnectionCache, SharedBackend};
use crate::infrastructure::rpc::Connector;

/// Multi-chain RPC client with coalescing request batching.
///
/// Owns the [`ChainRegistry`], the [`ConnectionCache`], and the hub-wide
/// [`BatchAggregator`]. Constructed through [`ChainHub::new`] or, when
/// the aggregation window size or environment source needs overriding,
/// through [`ChainHub::builder`].
pub struct ChainHub {
    registry: Arc<ChainRegistry>,
    connections: ConnectionCache,
    aggregator: BatchAggregator,
}

impl ChainHub {
    /// Builds a hub from `descriptors`, or the built-in list when `None`.
    ///
    /// Endpoint references resolve against the process environment and
    /// the aggregation window uses [`DEFAULT_MAX_BATCH_SIZE`].
    #[must_use]
    pub fn new(descriptors: Option<Vec<ChainDescriptor>>, connector: Arc<dyn Connector>) -> Self {
        let mut builder = Self::builder(connector);
        if let Some(descriptors) = descriptors {
            builder = builder.with_descriptors(descriptors);
        }
        builder.build()
    }

    /// Returns a builder for a hub dialing through `connector`.
    #[must_use]
    pub fn builder(connector: Arc<dyn Connector>) -> ChainHubBuilder {
        ChainHubBuilder {
            connector,
            descriptors: None,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            env: EnvSource::Process,
        }
    }

    /// Looks up a chain by string identifier or numeric chain id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`](crate::domain::errors::RegistryError::NotFound)
    /// when no registered chain matches `key`.
    pub fn get_chain(&self, key: impl Into<ChainKey>) -> RegistryResult<Arc<Chain>> {
        self.registry.get_chain(key)
    }

    /// Returns all registered chains of `kind`, in registration order.
    #[must_use]
    pub fn chains_of_kind(&self, kind: ChainKind) -> Vec<Arc<Chain>> {
        self.registry.chains_of_kind(kind)
    }

    /// Returns the connection for `key` over `transport`, opening it on
    /// first use.
    ///
    /// # Errors
    ///
    /// See [`ConnectionCache::for_chain`].
    pub fn for_chain(
        &self,
        key: impl Into<ChainKey>,
        transport: Transport,
    ) -> RegistryResult<Arc<ClientHandle>> {
        self.connections.for_chain(key, transport)
    }

    /// Returns the chain registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    /// Returns the connection cache.
    #[must_use]
    pub fn connections(&self) -> &ConnectionCache {
        &self.connections
    }

    /// Returns the hub-wide batch aggregator.
    #[must_use]
    pub fn aggregator(&self) -> &BatchAggregator {
        &self.aggregator
    }
}

impl fmt::Debug for ChainHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainHub")
            .field("registry", &self.registry)
            .field("connections", &self.connections)
            .field("aggregator", &self.aggregator)
            .finish()
    }
}

/// Configures and assembles a [`ChainHub`].
#[derive(Debug)]
pub struct ChainHubBuilder {
    connector: Arc<dyn Connector>,
    descriptors: Option<Vec<ChainDescriptor>>,
    max_batch_size: usize,
    env: EnvSource,
}

impl ChainHubBuilder {
    /// Uses `descriptors` instead of the built-in chain list.
    #[must_use]
    pub fn with_descriptors(mut self, descriptors: Vec<ChainDescriptor>) -> Self {
        self.descriptors = Some(descriptors);
        self
    }

    /// Overrides the aggregation window size. Clamped to at least 1.
    #[must_use]
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Resolves endpoint references against `env` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// Assembles the hub.
    ///
    /// Descriptors that resolve no endpoint are skipped, so this never
    /// fails; a hub over an empty registry simply answers every lookup
    /// with not-found.
    #[must_use]
    pub fn build(self) -> ChainHub {
        let descriptors = self
            .descriptors
            .unwrap_or_else(chainlist::default_descriptors);
        let registry = Arc::new(ChainRegistry::with_env(descriptors, &self.env));
        let shared = SharedBackend::default();
        let aggregator = BatchAggregator::new(Arc::new(shared.clone()), self.max_batch_size);
        let connections = ConnectionCache::new(
            Arc::clone(&registry),
            self.connector,
            aggregator.clone(),
            shared,
        );
        ChainHub {
            registry,
            connections,
            aggregator,
        }
    }
}
