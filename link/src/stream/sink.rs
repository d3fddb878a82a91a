use std::fmt;
use std::sync::{Arc, Weak};

use super::shared::StreamShared;
use crate::models::{EngineError, EngineItem, StreamState};

/// Producer handle given to the engine by [`QueryEngine::start`](crate::QueryEngine::start).
///
/// Every method is synchronous and never blocks on the consumer: units are
/// handed off to the stream's queues under a short lock. The sink only holds
/// a weak reference, so an engine that outlives the stream keeps pushing
/// into nothing and sees `false`.
#[derive(Clone)]
pub struct ResultSink {
    shared: Weak<StreamShared>,
    stream_id: u64,
}

impl ResultSink {
    pub(crate) fn new(shared: &Arc<StreamShared>) -> Self {
        Self {
            shared: Arc::downgrade(shared),
            stream_id: shared.id(),
        }
    }

    /// Hand one unit to the stream.
    ///
    /// Returns `false` when the unit was discarded because the stream is
    /// gone, aborted, failed, or already received its completion sentinel.
    pub fn push(&self, item: EngineItem) -> bool {
        match self.shared.upgrade() {
            Some(shared) => shared.push(item),
            None => false,
        }
    }

    /// Report a terminal failure. Items pushed earlier are still delivered
    /// before the error.
    pub fn fail(&self, error: EngineError) -> bool {
        match self.shared.upgrade() {
            Some(shared) => shared.fail(error),
            None => {
                log::debug!(
                    "[JQL_STREAM] stream#{} gone, dropping engine failure: {}",
                    self.stream_id,
                    error
                );
                false
            },
        }
    }

    /// `true` once the consumer aborted, closed or dropped the stream.
    /// Engines may poll this to stop early even without an `abort` signal.
    pub fn is_cancelled(&self) -> bool {
        self.shared
            .upgrade()
            .map(|shared| shared.is_cancelled())
            .unwrap_or(true)
    }

    /// Current stream state, or `None` if the stream was dropped.
    pub fn stream_state(&self) -> Option<StreamState> {
        self.shared.upgrade().map(|shared| shared.state())
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }
}

impl fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSink")
            .field("stream_id", &self.stream_id)
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}
