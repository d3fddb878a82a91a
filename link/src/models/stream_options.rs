use serde::{Deserialize, Serialize};

/// Per-execution options passed to the engine with the query.
///
/// # Example
///
/// ```rust
/// use jql_link::StreamOptions;
///
/// let options = StreamOptions::new().with_limit(10).with_explain(true);
/// assert_eq!(options.limit, Some(10));
/// assert!(options.explain);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Maximum number of documents the engine should produce.
    /// Default: None (the query's own limit applies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Ask the engine to attach an explain log to its results.
    #[serde(default)]
    pub explain: bool,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }
}
