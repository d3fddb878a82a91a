//! Query-result streaming.
//!
//! This module contains:
//! - [`ResultStream`]: consumer-facing async iterator and the lifecycle state machine
//! - [`ResultSink`]: producer handle the engine pushes results through
//! - `shared`: lock-protected state both sides operate on
//! - `pending`: FIFO of units that arrived while the stream had no demand
//!
//! Lifecycle: `Idle → Running ⇄ Paused → Draining → Closed | Errored`, with
//! `Aborted` reachable from any live state. Only `Idle`, `Running` and
//! `Paused` accept engine items.

mod pending;
mod result_stream;
mod shared;
mod sink;

pub use result_stream::{ResultStream, StreamAbortHandle};
pub use sink::ResultSink;

/// Default size of the delivery buffer before the engine is paused.
pub const DEFAULT_DELIVERY_CAPACITY: usize = 64;
