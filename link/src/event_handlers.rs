//! Stream lifecycle event handlers.
//!
//! Provides callback-based hooks for observing result streams:
//!
//! - [`on_explain`](StreamHandlers::on_explain): Fired once with the engine's explain log
//! - [`on_complete`](StreamHandlers::on_complete): Fired once when a stream reaches a terminal state
//!
//! Handlers always run on the consumer side (inside `next()`, `abort()`,
//! `close()` or `Drop`), never on the engine thread and never while the
//! stream's internal lock is held.
//!
//! # Example
//!
//! ```rust
//! use jql_link::{StreamHandlers, StreamOutcome};
//!
//! let handlers = StreamHandlers::new()
//!     .on_explain(|log| println!("plan: {}", log))
//!     .on_complete(|outcome| {
//!         if outcome != StreamOutcome::Completed {
//!             eprintln!("stream ended early: {}", outcome);
//!         }
//!     });
//! assert!(handlers.has_any());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::models::StreamOutcome;

/// Type alias for the on_explain callback.
pub type OnExplainCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Type alias for the on_complete callback.
pub type OnCompleteCallback = Arc<dyn Fn(StreamOutcome) + Send + Sync>;

/// Result stream lifecycle handlers.
///
/// All handlers are optional. Handlers are `Send + Sync` so a single set can
/// be shared by every stream a client creates.
#[derive(Clone, Default)]
pub struct StreamHandlers {
    /// Called with the first explain log the engine attaches to a result.
    pub(crate) on_explain: Option<OnExplainCallback>,

    /// Called when the stream completes, is aborted, or fails.
    pub(crate) on_complete: Option<OnCompleteCallback>,
}

impl fmt::Debug for StreamHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("on_explain", &self.on_explain.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl StreamHandlers {
    /// Create a new empty `StreamHandlers` (no callbacks registered).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with the execution's explain log.
    ///
    /// Only streams executed with `explain` enabled receive a log, and the
    /// callback fires at most once per stream.
    pub fn on_explain(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_explain = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked once per stream with its terminal outcome.
    ///
    /// # Example
    /// ```rust
    /// use jql_link::StreamHandlers;
    ///
    /// let handlers = StreamHandlers::new()
    ///     .on_complete(|outcome| println!("stream {}", outcome));
    /// ```
    pub fn on_complete(mut self, f: impl Fn(StreamOutcome) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }

    /// Returns `true` if any handler is registered.
    pub fn has_any(&self) -> bool {
        self.on_explain.is_some() || self.on_complete.is_some()
    }

    pub(crate) fn emit_explain(&self, log: &str) {
        if let Some(cb) = &self.on_explain {
            cb(log);
        }
    }

    pub(crate) fn emit_complete(&self, outcome: StreamOutcome) {
        if let Some(cb) = &self.on_complete {
            cb(outcome);
        }
    }
}
