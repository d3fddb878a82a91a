//! Contract with the external query engine.
//!
//! The engine runs queries on its own threads and pushes results through a
//! [`ResultSink`]. The bridge talks back with advisory flow-control signals
//! and releases the execution exactly once when the stream terminates.

use std::collections::BTreeMap;
use std::fmt;

use crate::{
    error::Result,
    models::{Placeholder, TypedValue},
    stream::ResultSink,
};

/// Opaque engine-side identifier of one query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionHandle(u64);

impl ExecutionHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec#{}", self.0)
    }
}

/// Frozen query definition handed to [`QueryEngine::start`].
///
/// Built by [`Query::execute`](crate::Query::execute) from a snapshot of the
/// query's bindings, so rebinding the query afterwards never affects a
/// running execution.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub text: String,
    pub collection: Option<String>,
    pub bindings: BTreeMap<Placeholder, TypedValue>,
    pub limit: Option<u64>,
    pub explain: bool,
}

impl QuerySpec {
    pub fn binding(&self, key: &Placeholder) -> Option<&TypedValue> {
        self.bindings.get(key)
    }
}

/// Query engine collaborator.
///
/// Engine threads deliver results by calling [`ResultSink::push`] once per
/// document (or once with a scalar), then once with the end sentinel, or
/// [`ResultSink::fail`] on failure. The sink never blocks the calling thread.
///
/// `pause`, `resume` and `abort` are invoked while the stream holds its
/// internal lock. Implementations must only flip flags / wake their own
/// threads there: they must not block and must not call back into the sink.
/// A thread parked because of `pause` must be released by either `resume` or
/// `destroy`.
pub trait QueryEngine: Send + Sync {
    /// Begin producing results for `spec`.
    ///
    /// The execution must not push anything until the first `resume`. Items
    /// pushed earlier are still accepted and queued, but they defeat the
    /// stream's flow control.
    fn start(&self, spec: QuerySpec, sink: ResultSink) -> Result<ExecutionHandle>;

    /// Stop pushing new items until resumed or destroyed.
    fn pause(&self, handle: ExecutionHandle);

    /// Permission to produce (again).
    fn resume(&self, handle: ExecutionHandle);

    /// Stop producing as soon as possible. Must be idempotent.
    fn abort(&self, handle: ExecutionHandle);

    /// Release every engine-side resource of the execution. Called exactly
    /// once per started execution, never from inside a sink call.
    fn destroy(&self, handle: ExecutionHandle);
}
