//! # Application Layer
//!
//! Registry construction and request-batch aggregation.
//!
//! ## Available Components
//!
//! - [`ChainRegistry`]: Environment-resolved chain catalogue and network graph
//! - [`BatchAggregator`]: Coalesces calls from all handles into wire batches
//! - [`BatchHandle`]: Caller-facing staging area for RPC calls
//! - [`CallFuture`]: Per-call completion future
//! - [`QueuedCall`]: Call plus completion callback, as queued in a window

pub mod aggregation;
pub mod batch;
pub mod registry;

pub use aggregation::{BatchAggregator, CallFuture, QueuedCall, DEFAULT_MAX_BATCH_SIZE};
pub use batch::BatchHandle;
pub use registry::ChainRegistry;
