use std::fmt;
use std::sync::{Arc, Weak};

use futures_util::stream::{self, Stream};

use super::shared::StreamShared;
use super::sink::ResultSink;
use crate::{
    engine::{QueryEngine, QuerySpec},
    error::Result,
    event_handlers::StreamHandlers,
    models::{ResultItem, StreamState},
};

/// Pull-based async iterator over the results of one query execution.
///
/// The engine produces on its own threads; the stream hands it permission to
/// produce (`resume`) only while the consumer has demand and the delivery
/// buffer has room, and parks anything that arrives in between so that items
/// are always delivered in engine order.
///
/// # Examples
///
/// ```rust,no_run
/// use jql_link::{JqlLinkClient, ResultItem};
///
/// # async fn example(client: JqlLinkClient) -> jql_link::Result<()> {
/// let mut query = client.create_query("/[age > :age]", Some("users"));
/// query.bind("age", 21_i64)?;
///
/// let mut stream = query.execute();
/// while let Some(item) = stream.next().await {
///     if let ResultItem::Document(doc) = item? {
///         println!("{}: {}", doc.id(), doc.raw());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ResultStream {
    shared: Arc<StreamShared>,
}

impl ResultStream {
    /// Start `spec` on `engine` and wrap the execution in a stream.
    ///
    /// The engine gets no permission to produce until the first pull. A
    /// start failure is not returned here: it becomes the stream's terminal
    /// error, observed by the first `next()`.
    pub(crate) fn start(
        engine: Arc<dyn QueryEngine>,
        spec: QuerySpec,
        capacity: usize,
        handlers: StreamHandlers,
    ) -> Self {
        let shared = Arc::new(StreamShared::new(engine, capacity, handlers));
        let sink = ResultSink::new(&shared);
        log::debug!(
            "[JQL_STREAM] stream#{} starting query '{}' (collection={:?}, bindings={})",
            shared.id(),
            spec.text,
            spec.collection,
            spec.bindings.len()
        );
        match shared.engine().start(spec, sink) {
            Ok(handle) => shared.attach(handle),
            Err(err) => shared.fail_start(err),
        }
        Self { shared }
    }

    /// Receive the next result item.
    ///
    /// Returns `None` exactly once when the end is observed, whether by
    /// natural completion or abort. Later calls, and any call after
    /// [`close`](Self::close), return `Err(LinkError::StreamClosed)`.
    /// An engine failure is returned as `Some(Err(_))` after every item
    /// accepted before it.
    ///
    /// Dropping the returned future before it resolves loses nothing.
    pub async fn next(&mut self) -> Option<Result<ResultItem>> {
        self.shared.next().await
    }

    /// Withdraw demand: the engine is asked to pause, anything it still
    /// pushes is parked until demand comes back.
    pub fn pause(&self) {
        self.shared.pause();
    }

    /// Re-assert demand without taking an item. `next()` does this implicitly.
    pub fn resume(&self) {
        self.shared.resume();
    }

    /// Cancel the execution. Buffered and later items are discarded and a
    /// suspended `next()` wakes up with `None`. No-op on a terminal stream.
    pub fn abort(&self) {
        self.shared.abort();
    }

    /// Abort if still live, release engine resources and mark the stream as
    /// released. Safe to call multiple times.
    pub fn close(&mut self) {
        self.shared.release();
    }

    /// A cloneable handle that can abort this stream from another task.
    pub fn abort_handle(&self) -> StreamAbortHandle {
        StreamAbortHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Process-unique stream id used in log messages.
    pub fn id(&self) -> u64 {
        self.shared.id()
    }

    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Returns `true` if `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.is_released()
    }

    /// The first explain log attached by the engine, if any.
    pub fn explain_log(&self) -> Option<String> {
        self.shared.explain_log()
    }

    /// Units parked while the stream had no demand.
    pub fn pending_len(&self) -> usize {
        self.shared.pending_len()
    }

    /// Units in the delivery buffer, ready to be taken without waiting.
    pub fn buffered_len(&self) -> usize {
        self.shared.buffered_len()
    }

    /// Delivery buffer size at which the engine is paused.
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Adapt into a [`futures_util::Stream`]. The stream ends after the
    /// first `None`; a terminal error is yielded as its last item.
    pub fn into_stream(self) -> impl Stream<Item = Result<ResultItem>> + Send + 'static {
        stream::unfold(self, |mut results| async move {
            results.next().await.map(|item| (item, results))
        })
    }
}

impl fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStream")
            .field("id", &self.shared.id())
            .field("state", &self.shared.state())
            .field("buffered", &self.shared.buffered_len())
            .field("pending", &self.shared.pending_len())
            .finish()
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        // No-op when close() already ran. Otherwise a live execution is
        // aborted so a paused engine thread is never left parked.
        self.shared.release();
    }
}

/// Aborts a [`ResultStream`] from outside the task that consumes it.
///
/// Holds a weak reference: once the stream is dropped, `abort` does nothing.
#[derive(Clone)]
pub struct StreamAbortHandle {
    shared: Weak<StreamShared>,
}

impl StreamAbortHandle {
    pub fn abort(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.abort();
        }
    }

    /// `true` if the stream is gone or has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.shared
            .upgrade()
            .map(|shared| shared.state().is_terminal())
            .unwrap_or(true)
    }
}

impl fmt::Debug for StreamAbortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamAbortHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
