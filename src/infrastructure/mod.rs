//! # Infrastructure Layer
//!
//! RPC seams, connection caching, and the built-in chain list.
//!
//! ## Available Components
//!
//! - [`RpcBackend`]: Wire-level batch execution seam
//! - [`Connector`]: Opens a backend for a chain endpoint
//! - [`ConnectionCache`]: Per chain/transport connection reuse
//! - [`ClientHandle`]: One cached connection, entry point for calls
//! - [`chainlist`]: Default descriptor list resolved from the environment

pub mod chainlist;
pub mod connection;
pub mod rpc;

pub use connection::{ClientHandle, ConnectionCache};
pub use rpc::{
    BackendError, BackendResult, CallOutcome, Connector, ConnectorError, ConnectorResult,
    RpcBackend, RpcCall, RpcError,
};
