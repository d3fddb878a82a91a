//! # jql-link
//!
//! Async streaming bridge between a document query engine and Rust
//! consumers.
//!
//! The engine runs queries on its own threads and pushes each matching
//! document into a [`ResultSink`]. Consumers pull results from a
//! [`ResultStream`] with backpressure: the engine is paused while the
//! consumer's delivery buffer is full, results are delivered in engine order
//! across every pause and resume, and abandoning a stream aborts the
//! execution and releases it exactly once.
//!
//! ## Example
//!
//! ```rust,no_run
//! use jql_link::{JqlLinkClient, QueryEngine, ResultItem};
//!
//! # async fn example(engine: impl QueryEngine + 'static) -> jql_link::Result<()> {
//! let client = JqlLinkClient::builder().engine(engine).build()?;
//!
//! let mut query = client.create_query("/[status = :status]", Some("orders"));
//! query.set_string("status", "open")?;
//!
//! let mut stream = query.execute();
//! while let Some(item) = stream.next().await {
//!     if let ResultItem::Document(doc) = item? {
//!         println!("{} => {}", doc.id(), doc.json()?);
//!     }
//! }
//!
//! let open = client
//!     .create_query("/[status = open] | count", Some("orders"))
//!     .scalar_int()
//!     .await?;
//! println!("{} open orders", open);
//! # Ok(())
//! # }
//! ```

mod adapters;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod query;
pub mod stream;

pub use client::{JqlLinkClient, JqlLinkClientBuilder};
pub use config::{StreamConfig, StreamConfigBuilder};
pub use engine::{ExecutionHandle, QueryEngine, QuerySpec};
pub use error::{LinkError, Result};
pub use event_handlers::{OnCompleteCallback, OnExplainCallback, StreamHandlers};
pub use models::{
    Document, EngineError, EngineItem, IntoPlaceholder, Placeholder, ResultItem, StreamOptions,
    StreamOutcome, StreamState, TypedValue,
};
pub use query::Query;
pub use stream::{ResultSink, ResultStream, StreamAbortHandle, DEFAULT_DELIVERY_CAPACITY};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
