use std::fmt;

/// Lifecycle state of a [`ResultStream`](crate::ResultStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Created, engine has not been given permission to produce yet.
    Idle,
    /// Consumer has demand; engine items go straight to the delivery buffer.
    Running,
    /// Demand withdrawn; engine items are parked in the pending queue.
    Paused,
    /// Completion sentinel or engine failure received; buffered units are
    /// still being delivered.
    Draining,
    /// Every item and the sentinel have been delivered.
    Closed,
    /// Cancelled before natural completion.
    Aborted,
    /// The engine's failure has been delivered to the consumer.
    Errored,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Closed | StreamState::Aborted | StreamState::Errored)
    }

    /// States in which units pushed by the engine are still accepted.
    pub(crate) fn accepts_engine_items(self) -> bool {
        matches!(self, StreamState::Idle | StreamState::Running | StreamState::Paused)
    }

    /// Terminal outcome reported to handlers, `None` while still live.
    pub fn outcome(self) -> Option<StreamOutcome> {
        match self {
            StreamState::Closed => Some(StreamOutcome::Completed),
            StreamState::Aborted => Some(StreamOutcome::Aborted),
            StreamState::Errored => Some(StreamOutcome::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamState::Idle => "idle",
            StreamState::Running => "running",
            StreamState::Paused => "paused",
            StreamState::Draining => "draining",
            StreamState::Closed => "closed",
            StreamState::Aborted => "aborted",
            StreamState::Errored => "errored",
        };
        write!(f, "{}", name)
    }
}

/// How a stream ended, passed to the `on_complete` handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamOutcome {
    Completed,
    Aborted,
    Failed,
}

impl fmt::Display for StreamOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOutcome::Completed => write!(f, "completed"),
            StreamOutcome::Aborted => write!(f, "aborted"),
            StreamOutcome::Failed => write!(f, "failed"),
        }
    }
}
