//! # chainhub
//!
//! Multi-chain RPC client registry with coalescing request batching.
//!
//! A hub is built from declarative chain descriptors whose endpoint URLs
//! resolve from the environment, indexes the resulting chains by string
//! identifier and numeric chain id, opens connections lazily per chain
//! and transport, and merges RPC calls issued anywhere in the process
//! within one scheduling turn into single wire batches.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain`): Chain model, descriptors, endpoint
//!   resolution, and the error taxonomy
//! - **Application Layer** (`application`): Registry construction and the
//!   batch aggregation core
//! - **Infrastructure Layer** (`infrastructure`): RPC backend seams,
//!   connection caching, and the built-in chain list
//! - **Client** (`client`): The assembled [`ChainHub`] facade
//!
//! ## Example
//!
//! ```rust
//! use chainhub::{ChainDescriptor, ChainKind, ChainRegistry, Currency, EndpointSpec};
//!
//! # fn main() -> Result<(), chainhub::RegistryError> {
//! let registry = ChainRegistry::new(vec![ChainDescriptor::new(
//!     "ethereum-mainnet",
//!     1,
//!     ChainKind::Mainnet,
//!     EndpointSpec::http_only("https://rpc.example"),
//!     Currency::new("Ether", "ETH", 18),
//! )]);
//!
//! let chain = registry.get_chain(1u64)?;
//! assert_eq!(chain.id(), "ethereum-mainnet");
//! assert_eq!(chain.url().http(), Some("https://rpc.example"));
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod client;
pub mod domain;
pub mod infrastructure;

pub use application::{
    BatchAggregator, BatchHandle, CallFuture, ChainRegistry, QueuedCall, DEFAULT_MAX_BATCH_SIZE,
};
pub use client::{ChainHub, ChainHubBuilder};
pub use domain::{
    Chain, ChainDescriptor, ChainKey, ChainKind, Currency, EndpointSpec, EndpointUrls, EnvSource,
    RegistryError, RegistryResult, Transport, ENV_URL_PREFIX,
};
pub use infrastructure::chainlist::{default_descriptors, descriptors_from_json};
pub use infrastructure::{
    BackendError, BackendResult, CallOutcome, ClientHandle, ConnectionCache, Connector,
    ConnectorError, ConnectorResult, RpcBackend, RpcCall, RpcError,
};
