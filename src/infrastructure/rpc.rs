//! # RPC Black-Box Seams
//!
//! Call descriptions and the two traits behind which the underlying RPC
//! client lives.
//!
//! This crate does not speak the JSON-RPC wire protocol. It only needs two
//! capabilities from the client implementation: open a client for one
//! resolved endpoint ([`Connector`]) and execute a prepared batch of calls
//! as a single wire operation ([`RpcBackend`]). Encoding, transport, and
//! response correlation stay on the other side of these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::chain::Chain;
use crate::domain::transport::Transport;

/// An already-encoded RPC call description.
///
/// Opaque to the batching layer: it is appended to wire batches verbatim and
/// never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcCall {
    /// RPC method name, e.g. `"eth_blockNumber"`.
    pub method: String,
    /// Positional or named parameters.
    #[serde(default)]
    pub params: Value,
}

impl RpcCall {
    /// Creates a call description.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

impl fmt::Display for RpcCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method)
    }
}

/// Error delivered to a single call's completion observer.
///
/// `Clone` because a batch-level failure fans out to every call pending in
/// that batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// RPC-level failure of this call only; sibling calls in the same batch
    /// are unaffected.
    #[error("rpc error {code}: {message}")]
    Call {
        /// RPC error code.
        code: i64,
        /// RPC error message.
        message: String,
    },

    /// The wire batch carrying this call failed before per-call resolution;
    /// every call of that batch receives this error.
    #[error("batch execution failed: {0}")]
    BatchFailed(String),

    /// The call was dropped before its batch could complete.
    #[error("call dropped before completion")]
    Dropped,
}

impl RpcError {
    /// Creates a per-call RPC error.
    #[must_use]
    pub fn call(code: i64, message: impl Into<String>) -> Self {
        Self::Call {
            code,
            message: message.into(),
        }
    }

    /// Creates a batch-level execution error.
    #[must_use]
    pub fn batch_failed(msg: impl Into<String>) -> Self {
        Self::BatchFailed(msg.into())
    }

    /// Returns true for per-call RPC errors.
    #[must_use]
    pub const fn is_call_error(&self) -> bool {
        matches!(self, Self::Call { .. })
    }

    /// Returns true for batch-level failures.
    #[must_use]
    pub const fn is_batch_failure(&self) -> bool {
        matches!(self, Self::BatchFailed(_))
    }
}

/// Outcome of one call within a batch.
pub type CallOutcome = Result<Value, RpcError>;

/// Error type for batch execution by the underlying client.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Wire-level failure before any per-call dispatch.
    #[error("transport failure: {0}")]
    Transport(String),

    /// No usable backend is available for this batch.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Creates a transport failure.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an unavailable-backend error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Result type for batch execution.
pub type BackendResult<T> = Result<T, BackendError>;

/// The underlying RPC client, consumed as a black box.
///
/// One instance is bound to one resolved endpoint URL.
#[async_trait]
pub trait RpcBackend: Send + Sync + fmt::Debug {
    /// Executes `calls` as a single wire-level batch.
    ///
    /// The returned outcomes correspond to `calls` by position and carry
    /// each call's own result: a response value, or an RPC-level error for
    /// that call alone.
    ///
    /// # Errors
    ///
    /// Returns an error only when the batch as a whole failed before
    /// per-call resolution (for example a transport failure); per-call
    /// errors belong inside the outcome vector.
    async fn execute_batch(&self, calls: Vec<RpcCall>) -> BackendResult<Vec<CallOutcome>>;
}

/// Error type for client construction.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// Client construction failed.
    #[error("connection failed: {0}")]
    Failed(String),

    /// The connector does not support the requested transport.
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(Transport),
}

impl ConnectorError {
    /// Creates a construction failure.
    #[must_use]
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Result type for client construction.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Factory opening an RPC client for one resolved endpoint.
///
/// Injected at hub construction; called lazily, at most once per
/// (chain, transport) key, by the connection cache.
pub trait Connector: Send + Sync + fmt::Debug {
    /// Opens a client for `chain` over `transport` at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed; the failure is
    /// surfaced to the caller and nothing is cached.
    fn connect(
        &self,
        chain: &Chain,
        transport: Transport,
        url: &str,
    ) -> ConnectorResult<Arc<dyn RpcBackend>>;
}
