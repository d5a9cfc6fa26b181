//! # Domain Layer
//!
//! Chain model, descriptors, and the registry error taxonomy.
//!
//! ## Available Components
//!
//! - [`Chain`]: Resolved, usable blockchain network
//! - [`ChainDescriptor`]: Declarative JSON-compatible chain description
//! - [`ChainKind`]: Mainnet / testnet / localnet category
//! - [`ChainKey`]: String-or-numeric lookup key
//! - [`Transport`]: HTTP / WebSocket endpoint kind
//! - [`EnvSource`]: Environment backing `env:` URL resolution
//! - [`RegistryError`]: Lookup and connection error taxonomy

pub mod chain;
pub mod descriptor;
pub mod errors;
pub mod transport;

pub use chain::{Chain, ChainKey, ChainKind, Currency, EndpointUrls};
pub use descriptor::{ChainDescriptor, EndpointSpec, EnvSource, ENV_URL_PREFIX};
pub use errors::{RegistryError, RegistryResult};
pub use transport::Transport;
