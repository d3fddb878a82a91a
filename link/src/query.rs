//! Query definition and placeholder binding.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use serde_json::Value as JsonValue;

use crate::{
    config::StreamConfig,
    engine::{QueryEngine, QuerySpec},
    error::Result,
    event_handlers::StreamHandlers,
    models::{IntoPlaceholder, Placeholder, ResultItem, StreamOptions, TypedValue},
    stream::ResultStream,
};

/// Query text, an optional collection, and the values bound to its
/// placeholders.
///
/// Bindings are local until [`execute`](Self::execute), which snapshots them:
/// rebinding afterwards only affects later executions.
///
/// # Examples
///
/// ```rust,no_run
/// use jql_link::JqlLinkClient;
///
/// # async fn example(client: JqlLinkClient) -> jql_link::Result<()> {
/// let mut query = client.create_query("@users/[name re :name] and /[age > :0]", None);
/// query.set_regexp("name", "^Jo")?.set_i64(0, 30)?;
///
/// let adults = query.list(None).await?;
/// let count = client.create_query("@users/* | count", None).scalar_int().await?;
/// println!("{} of {} match", adults.len(), count);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Query {
    engine: Arc<dyn QueryEngine>,
    config: StreamConfig,
    handlers: StreamHandlers,
    text: String,
    collection: Option<String>,
    bindings: BTreeMap<Placeholder, TypedValue>,
}

impl Query {
    pub(crate) fn new(
        engine: Arc<dyn QueryEngine>,
        config: StreamConfig,
        handlers: StreamHandlers,
        text: impl Into<String>,
        collection: Option<String>,
    ) -> Self {
        Self {
            engine,
            config,
            handlers,
            text: text.into(),
            collection,
            bindings: BTreeMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn bindings(&self) -> &BTreeMap<Placeholder, TypedValue> {
        &self.bindings
    }

    pub fn binding(&self, key: impl IntoPlaceholder) -> Option<&TypedValue> {
        let key = key.into_placeholder().ok()?;
        self.bindings.get(&key)
    }

    /// Bind `value` to a placeholder, overwriting any earlier binding.
    ///
    /// `key` is a 0-based position (any integer type, negatives rejected) or
    /// a name, with or without its leading `:`. Whether the key exists in the
    /// query text is only checked by the engine at execution time.
    pub fn bind(
        &mut self,
        key: impl IntoPlaceholder,
        value: impl Into<TypedValue>,
    ) -> Result<&mut Self> {
        let key = key.into_placeholder()?;
        let value = value.into();
        value.validate()?;
        debug!("[JQL_QUERY] bind {} = {} ({})", key, value, value.kind());
        if self.bindings.insert(key.clone(), value).is_some() {
            debug!("[JQL_QUERY] placeholder {} rebound", key);
        }
        Ok(self)
    }

    pub fn set_string(&mut self, key: impl IntoPlaceholder, value: impl Into<String>) -> Result<&mut Self> {
        self.bind(key, TypedValue::String(value.into()))
    }

    pub fn set_json(&mut self, key: impl IntoPlaceholder, value: JsonValue) -> Result<&mut Self> {
        self.bind(key, TypedValue::Json(value))
    }

    /// Bind pre-serialized JSON text. The text must parse.
    pub fn set_json_str(&mut self, key: impl IntoPlaceholder, text: &str) -> Result<&mut Self> {
        let value = TypedValue::json_text(text)?;
        self.bind(key, value)
    }

    /// Bind a regular expression. `/pattern/flags` literals are accepted.
    pub fn set_regexp(&mut self, key: impl IntoPlaceholder, pattern: impl Into<String>) -> Result<&mut Self> {
        let value = TypedValue::regexp(pattern)?;
        self.bind(key, value)
    }

    pub fn set_i64(&mut self, key: impl IntoPlaceholder, value: i64) -> Result<&mut Self> {
        self.bind(key, TypedValue::Integer(value))
    }

    /// Bind a float. NaN and infinities are rejected.
    pub fn set_f64(&mut self, key: impl IntoPlaceholder, value: f64) -> Result<&mut Self> {
        self.bind(key, TypedValue::Float(value))
    }

    pub fn set_bool(&mut self, key: impl IntoPlaceholder, value: bool) -> Result<&mut Self> {
        self.bind(key, TypedValue::Boolean(value))
    }

    pub fn set_null(&mut self, key: impl IntoPlaceholder) -> Result<&mut Self> {
        self.bind(key, TypedValue::Null)
    }

    /// Remove every binding.
    pub fn clear_bindings(&mut self) -> &mut Self {
        self.bindings.clear();
        self
    }

    /// Start the query with the client's default options.
    pub fn execute(&self) -> ResultStream {
        self.execute_with(self.config.default_options())
    }

    /// Start the query with per-execution options.
    ///
    /// A missing `limit` falls back to the configured default; `explain` is
    /// enabled if either the options or the configuration ask for it.
    pub fn execute_with(&self, options: StreamOptions) -> ResultStream {
        let spec = QuerySpec {
            text: self.text.clone(),
            collection: self.collection.clone(),
            bindings: self.bindings.clone(),
            limit: options.limit.or(self.config.default_limit),
            explain: options.explain || self.config.explain,
        };
        debug!(
            "[JQL_QUERY] Executing query: \"{}\" (len={}, limit={:?}, explain={})",
            preview(&self.text),
            self.text.len(),
            spec.limit,
            spec.explain
        );
        ResultStream::start(
            self.engine.clone(),
            spec,
            self.config.delivery_capacity,
            self.handlers.clone(),
        )
    }

    /// A configured default limit still wins when it is smaller.
    fn execute_limited(&self, n: usize) -> ResultStream {
        let mut options = self.config.default_options();
        let n = n as u64;
        options.limit = Some(options.limit.map_or(n, |default| default.min(n)));
        self.execute_with(options)
    }

    // ---------------------------------------------------------------
    // One-shot shortcuts: execute and consume in a single call
    // ---------------------------------------------------------------

    /// Execute and collect up to `limit` items.
    ///
    /// The limit is forwarded to the engine as well, so it stops producing
    /// on its own instead of running until the stream is aborted.
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<ResultItem>> {
        match limit {
            Some(0) => Ok(Vec::new()),
            Some(n) => self.execute_limited(n).list(limit).await,
            None => self.execute().list(None).await,
        }
    }

    /// Execute with an engine-side limit of `n` and collect the result.
    pub async fn first_n(&self, n: usize) -> Result<Vec<ResultItem>> {
        self.list(Some(n)).await
    }

    /// Execute and return the first item, if any.
    pub async fn first(&self) -> Result<Option<ResultItem>> {
        Ok(self.first_n(1).await?.into_iter().next())
    }

    /// Execute and return the single scalar result (e.g. `| count`).
    pub async fn scalar_int(&self) -> Result<i64> {
        self.execute().scalar_int().await
    }

    /// Execute for side effects only (updates, deletes).
    pub async fn completion(&self) -> Result<()> {
        self.execute().completion().await
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("text", &self.text)
            .field("collection", &self.collection)
            .field("bindings", &self.bindings)
            .finish()
    }
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(80).collect();
    if preview.len() < text.len() {
        preview.push_str("...");
    }
    preview.replace('\n', " ")
}
