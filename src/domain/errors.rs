//! # Registry Errors
//!
//! Error taxonomy for chain lookup and client-handle construction.
//!
//! Registry construction itself never fails; unresolvable descriptors are
//! dropped silently. These errors only surface when an unknown chain or an
//! unresolved transport is actually used.

use thiserror::Error;

use super::chain::ChainKey;
use super::transport::Transport;

/// Error type for registry and connection-cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Requested chain is not present in the resolved registry.
    #[error("chain not found: {0}")]
    NotFound(ChainKey),

    /// Chain exists but has no resolved URL for the requested transport.
    #[error("no {transport} url resolved for chain {chain}")]
    UnresolvedTransport {
        /// String identifier of the chain.
        chain: String,
        /// Transport the chain has no URL for.
        transport: Transport,
    },

    /// Underlying client construction failed.
    #[error("connection error: {0}")]
    Connection(String),
}

impl RegistryError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(key: impl Into<ChainKey>) -> Self {
        Self::NotFound(key.into())
    }

    /// Creates an unresolved-transport error.
    #[must_use]
    pub fn unresolved_transport(chain: impl Into<String>, transport: Transport) -> Self {
        Self::UnresolvedTransport {
            chain: chain.into(),
            transport,
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Returns true if the requested chain was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if the chain lacked a URL for the requested transport.
    #[must_use]
    pub const fn is_unresolved_transport(&self) -> bool {
        matches!(self, Self::UnresolvedTransport { .. })
    }
}

/// Result type for registry and connection-cache operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
