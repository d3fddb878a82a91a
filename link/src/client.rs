//! Main jql-link client with builder pattern.
//!
//! Binds a query engine to the stream configuration and lifecycle handlers
//! every query created through it will use.

use std::fmt;
use std::sync::Arc;

use crate::{
    config::StreamConfig,
    engine::QueryEngine,
    error::{LinkError, Result},
    event_handlers::StreamHandlers,
    query::Query,
};

/// Main jql-link client.
///
/// Cheap to clone: clones share the engine.
///
/// # Examples
///
/// ```rust,no_run
/// use jql_link::{JqlLinkClient, QueryEngine, StreamConfig};
///
/// # async fn example(engine: impl QueryEngine + 'static) -> jql_link::Result<()> {
/// let client = JqlLinkClient::builder()
///     .engine(engine)
///     .config(StreamConfig::builder().delivery_capacity(32).build()?)
///     .build()?;
///
/// let docs = client.create_query("/*", Some("users")).list(Some(10)).await?;
/// println!("{} documents", docs.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JqlLinkClient {
    engine: Arc<dyn QueryEngine>,
    config: StreamConfig,
    handlers: StreamHandlers,
}

impl JqlLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> JqlLinkClientBuilder {
        JqlLinkClientBuilder::new()
    }

    /// Create a query over `text`, optionally bound to a collection.
    ///
    /// The query text may name its collection itself (`@users/*`), in which
    /// case `collection` can be `None`.
    pub fn create_query(&self, text: impl Into<String>, collection: Option<&str>) -> Query {
        Query::new(
            self.engine.clone(),
            self.config.clone(),
            self.handlers.clone(),
            text,
            collection.map(str::to_string),
        )
    }

    /// Get the stream configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn QueryEngine> {
        &self.engine
    }
}

impl fmt::Debug for JqlLinkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JqlLinkClient")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Builder for configuring [`JqlLinkClient`] instances.
#[derive(Default)]
pub struct JqlLinkClientBuilder {
    engine: Option<Arc<dyn QueryEngine>>,
    config: StreamConfig,
    handlers: StreamHandlers,
}

impl JqlLinkClientBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Set the query engine
    pub fn engine(mut self, engine: impl QueryEngine + 'static) -> Self {
        let engine: Arc<dyn QueryEngine> = Arc::new(engine);
        self.engine = Some(engine);
        self
    }

    /// Set an engine that is already shared elsewhere
    pub fn engine_arc(mut self, engine: Arc<dyn QueryEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set stream configuration for every query created by the client
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Set lifecycle handlers shared by every stream
    pub fn event_handlers(mut self, handlers: StreamHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<JqlLinkClient> {
        let engine = self
            .engine
            .ok_or_else(|| LinkError::ConfigurationError("engine is required".into()))?;
        self.config.validate()?;
        log::debug!(
            "[CLIENT] Built client (delivery_capacity={}, default_limit={:?}, explain={})",
            self.config.delivery_capacity,
            self.config.default_limit,
            self.config.explain
        );

        Ok(JqlLinkClient {
            engine,
            config: self.config,
            handlers: self.handlers,
        })
    }
}
