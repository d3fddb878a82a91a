//! State shared by a [`ResultStream`](super::ResultStream), its
//! [`ResultSink`](super::ResultSink) and any abort handles.
//!
//! Every mutation happens under one `parking_lot::Mutex`. Critical sections
//! only move units between queues, flip state and send the advisory
//! pause / resume / abort signals. Releasing the engine execution and running
//! user handlers is deferred until the lock is dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::pending::{Delivery, PendingQueue};
use crate::{
    engine::{ExecutionHandle, QueryEngine},
    error::{LinkError, Result},
    event_handlers::StreamHandlers,
    models::{Document, EngineError, EngineItem, ResultItem, StreamOutcome, StreamState},
};

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct StreamShared {
    id: u64,
    engine: Arc<dyn QueryEngine>,
    /// Delivery buffer size at which the engine is asked to pause.
    capacity: usize,
    handlers: StreamHandlers,
    inner: Mutex<StreamInner>,
    notify: Notify,
}

struct StreamInner {
    state: StreamState,
    /// Delivery buffer: units the consumer can take without waiting.
    ready: VecDeque<Delivery>,
    pending: PendingQueue,
    demand: bool,
    handle: Option<ExecutionHandle>,
    explain: Option<String>,
    explain_reported: bool,
    /// `None` has been handed to the consumer.
    end_observed: bool,
    /// `close()` or `Drop` ran.
    released: bool,
    outcome_reported: bool,
}

/// Work collected under the lock and carried out after it is released.
#[derive(Debug, Default)]
#[must_use]
pub(crate) struct Deferred {
    destroy: Option<ExecutionHandle>,
    explain: Option<String>,
    outcome: Option<StreamOutcome>,
}

/// Result of one non-blocking attempt to take the next unit.
pub(crate) enum Poll {
    Ready(Option<Result<ResultItem>>),
    Pending,
}

impl StreamShared {
    pub(crate) fn new(engine: Arc<dyn QueryEngine>, capacity: usize, handlers: StreamHandlers) -> Self {
        Self {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            engine,
            capacity: capacity.max(1),
            handlers,
            inner: Mutex::new(StreamInner {
                state: StreamState::Idle,
                ready: VecDeque::new(),
                pending: PendingQueue::new(),
                demand: false,
                handle: None,
                explain: None,
                explain_reported: false,
                end_observed: false,
                released: false,
                outcome_reported: false,
            }),
            notify: Notify::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn engine(&self) -> &Arc<dyn QueryEngine> {
        &self.engine
    }

    /// Record the execution handle returned by `QueryEngine::start`.
    pub(crate) fn attach(&self, handle: ExecutionHandle) {
        let mut inner = self.inner.lock();
        log::debug!("[JQL_STREAM] stream#{} attached to {}", self.id, handle);
        if inner.state == StreamState::Aborted {
            self.engine.abort(handle);
        }
        inner.handle = Some(handle);
    }

    /// `QueryEngine::start` refused the query: the stream is born failed.
    pub(crate) fn fail_start(&self, err: LinkError) {
        let mut inner = self.inner.lock();
        log::warn!("[JQL_STREAM] stream#{} failed to start: {}", self.id, err);
        inner.ready.push_back(Delivery::Error(err));
        self.transition(&mut inner, StreamState::Draining);
    }

    // ---------------------------------------------------------------
    // Engine side
    // ---------------------------------------------------------------

    pub(crate) fn push(&self, mut item: EngineItem) -> bool {
        {
            let mut inner = self.inner.lock();
            if !inner.state.accepts_engine_items() {
                log::debug!(
                    "[JQL_STREAM] stream#{} discarding engine item in state {}",
                    self.id,
                    inner.state
                );
                return false;
            }

            if let Some(log) = item.take_explain() {
                if inner.explain.is_none() {
                    inner.explain = Some(log);
                }
            }

            match item {
                EngineItem::Document { id, payload, .. } => {
                    let doc = ResultItem::Document(Document::new(id, payload));
                    self.enqueue(&mut inner, Delivery::Item(doc));
                    if inner.state == StreamState::Running && inner.ready.len() >= self.capacity {
                        self.transition(&mut inner, StreamState::Paused);
                        self.signal_pause(&inner);
                    }
                },
                EngineItem::Scalar { value, .. } => {
                    self.enqueue(&mut inner, Delivery::Item(ResultItem::Scalar(value)));
                    self.enqueue(&mut inner, Delivery::End);
                    self.transition(&mut inner, StreamState::Draining);
                },
                EngineItem::End { .. } => {
                    self.enqueue(&mut inner, Delivery::End);
                    self.transition(&mut inner, StreamState::Draining);
                },
            }
        }
        self.notify.notify_one();
        true
    }

    pub(crate) fn fail(&self, error: EngineError) -> bool {
        {
            let mut inner = self.inner.lock();
            if !inner.state.accepts_engine_items() {
                log::debug!(
                    "[JQL_STREAM] stream#{} ignoring engine failure in state {}: {}",
                    self.id,
                    inner.state,
                    error
                );
                return false;
            }
            log::warn!("[JQL_STREAM] stream#{} engine failure: {}", self.id, error);
            // `Errored` is entered once the consumer takes the error; until
            // then the stream drains and can still be aborted silently.
            self.enqueue(&mut inner, Delivery::Error(error.into()));
            self.transition(&mut inner, StreamState::Draining);
        }
        self.notify.notify_one();
        true
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        let inner = self.inner.lock();
        inner.state == StreamState::Aborted || inner.released
    }

    // ---------------------------------------------------------------
    // Consumer side
    // ---------------------------------------------------------------

    /// Suspend until a unit is available or the stream has ended.
    pub(crate) async fn next(&self) -> Option<Result<ResultItem>> {
        loop {
            let (poll, deferred) = self.poll_next();
            self.run_deferred(deferred);
            match poll {
                Poll::Ready(result) => return result,
                // A wake-up sent between `poll_next` and here is kept as a
                // permit, so this never misses a push.
                Poll::Pending => self.notify.notified().await,
            }
        }
    }

    pub(crate) fn poll_next(&self) -> (Poll, Deferred) {
        let mut deferred = Deferred::default();
        let mut inner = self.inner.lock();
        if inner.released {
            return (Poll::Ready(Some(Err(LinkError::StreamClosed))), deferred);
        }

        inner.demand = true;
        self.refill(&mut inner);
        let unit = inner.ready.pop_front();
        self.refill(&mut inner);
        self.maybe_resume(&mut inner);

        let poll = match unit {
            Some(Delivery::Item(item)) => Poll::Ready(Some(Ok(item))),
            Some(Delivery::Error(err)) => {
                self.transition(&mut inner, StreamState::Errored);
                Poll::Ready(Some(Err(err)))
            },
            Some(Delivery::End) => {
                if !inner.state.is_terminal() {
                    self.transition(&mut inner, StreamState::Closed);
                }
                inner.end_observed = true;
                Poll::Ready(None)
            },
            None if inner.state.is_terminal() => {
                if inner.end_observed {
                    Poll::Ready(Some(Err(LinkError::StreamClosed)))
                } else {
                    inner.end_observed = true;
                    Poll::Ready(None)
                }
            },
            None => Poll::Pending,
        };

        self.collect(&mut inner, &mut deferred);
        (poll, deferred)
    }

    /// Withdraw demand. The engine is asked to pause if it is producing.
    pub(crate) fn pause(&self) {
        let mut inner = self.inner.lock();
        if inner.released || inner.state.is_terminal() {
            return;
        }
        inner.demand = false;
        if inner.state == StreamState::Running {
            self.transition(&mut inner, StreamState::Paused);
            self.signal_pause(&inner);
        }
    }

    /// Re-assert demand without taking an item.
    pub(crate) fn resume(&self) {
        let mut inner = self.inner.lock();
        if inner.released || inner.state.is_terminal() {
            return;
        }
        inner.demand = true;
        self.refill(&mut inner);
        self.maybe_resume(&mut inner);
    }

    pub(crate) fn abort(&self) {
        let deferred = {
            let mut inner = self.inner.lock();
            let mut deferred = Deferred::default();
            self.abort_locked(&mut inner);
            self.collect(&mut inner, &mut deferred);
            deferred
        };
        self.notify.notify_one();
        self.run_deferred(deferred);
    }

    /// Final release by `close()` or `Drop`. Idempotent.
    pub(crate) fn release(&self) {
        let deferred = {
            let mut inner = self.inner.lock();
            if inner.released {
                return;
            }
            if inner.state == StreamState::Draining
                && inner.ready.iter().all(Delivery::is_end)
                && inner.pending.holds_only_end()
            {
                // Everything but the sentinel was consumed.
                inner.ready.clear();
                inner.pending.clear();
                self.transition(&mut inner, StreamState::Closed);
            }
            self.abort_locked(&mut inner);

            let mut deferred = Deferred::default();
            self.collect(&mut inner, &mut deferred);
            if !inner.outcome_reported {
                inner.outcome_reported = true;
                deferred.outcome = inner.state.outcome();
            }
            inner.ready.clear();
            inner.pending.clear();
            inner.released = true;
            inner.end_observed = true;
            log::debug!(
                "[JQL_STREAM] stream#{} released ({}, {} unit(s) went through pending)",
                self.id,
                inner.state,
                inner.pending.total_enqueued()
            );
            deferred
        };
        self.notify.notify_one();
        self.run_deferred(deferred);
    }

    // ---------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------

    pub(crate) fn state(&self) -> StreamState {
        self.inner.lock().state
    }

    pub(crate) fn is_released(&self) -> bool {
        self.inner.lock().released
    }

    pub(crate) fn explain_log(&self) -> Option<String> {
        self.inner.lock().explain.clone()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub(crate) fn buffered_len(&self) -> usize {
        self.inner.lock().ready.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    // ---------------------------------------------------------------
    // Internal helpers (lock held)
    // ---------------------------------------------------------------

    fn transition(&self, inner: &mut StreamInner, next: StreamState) {
        if inner.state != next {
            log::debug!("[JQL_STREAM] stream#{} {} -> {}", self.id, inner.state, next);
            inner.state = next;
        }
    }

    /// New units may only bypass `pending` while the stream is running and
    /// nothing is parked, so earlier arrivals are always delivered first.
    fn enqueue(&self, inner: &mut StreamInner, unit: Delivery) {
        if inner.state == StreamState::Running && inner.pending.is_empty() {
            inner.ready.push_back(unit);
        } else {
            inner.pending.push_back(unit);
        }
    }

    fn refill(&self, inner: &mut StreamInner) {
        while inner.ready.len() < self.capacity {
            match inner.pending.pop_front() {
                Some(unit) => inner.ready.push_back(unit),
                None => break,
            }
        }
    }

    fn maybe_resume(&self, inner: &mut StreamInner) {
        let resumable = matches!(inner.state, StreamState::Idle | StreamState::Paused);
        if inner.demand
            && resumable
            && inner.pending.is_empty()
            && inner.ready.len() < self.capacity
        {
            self.transition(inner, StreamState::Running);
            if let Some(handle) = inner.handle {
                self.engine.resume(handle);
            }
        }
    }

    fn signal_pause(&self, inner: &StreamInner) {
        if let Some(handle) = inner.handle {
            self.engine.pause(handle);
        }
    }

    fn abort_locked(&self, inner: &mut StreamInner) {
        if inner.state.is_terminal() {
            return;
        }
        if let Some(handle) = inner.handle {
            // A paused engine thread must be let go before it can see the abort.
            if matches!(inner.state, StreamState::Idle | StreamState::Paused) {
                self.engine.resume(handle);
            }
            self.engine.abort(handle);
        }
        let discarded = inner.ready.len() + inner.pending.clear();
        inner.ready.clear();
        inner.demand = false;
        self.transition(inner, StreamState::Aborted);
        log::debug!(
            "[JQL_STREAM] stream#{} aborted, {} buffered unit(s) discarded",
            self.id,
            discarded
        );
    }

    fn collect(&self, inner: &mut StreamInner, deferred: &mut Deferred) {
        if !inner.explain_reported {
            if let Some(log) = &inner.explain {
                deferred.explain = Some(log.clone());
                inner.explain_reported = true;
            }
        }
        if inner.state.is_terminal() {
            deferred.destroy = inner.handle.take();
            if !inner.outcome_reported && inner.ready.is_empty() && inner.pending.is_empty() {
                inner.outcome_reported = true;
                deferred.outcome = inner.state.outcome();
            }
        }
    }

    fn run_deferred(&self, deferred: Deferred) {
        if let Some(handle) = deferred.destroy {
            log::debug!("[JQL_STREAM] stream#{} destroying {}", self.id, handle);
            self.engine.destroy(handle);
        }
        if let Some(log) = deferred.explain {
            self.handlers.emit_explain(&log);
        }
        if let Some(outcome) = deferred.outcome {
            log::debug!("[JQL_STREAM] stream#{} finished: {}", self.id, outcome);
            self.handlers.emit_complete(outcome);
        }
    }
}
