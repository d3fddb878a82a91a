//! Stream configuration.
//!
//! Defaults match the engine binding's historical behaviour: a delivery
//! buffer of 64 units before the engine is paused, no limit and no explain
//! log unless a query asks for them.

use std::collections::HashMap;

use crate::error::{LinkError, Result};
use crate::models::StreamOptions;
use crate::stream::DEFAULT_DELIVERY_CAPACITY;

/// Configuration shared by every stream a client creates.
///
/// # Examples
///
/// ```rust
/// use jql_link::StreamConfig;
///
/// // Use defaults
/// let config = StreamConfig::default();
/// assert_eq!(config.delivery_capacity, 64);
///
/// // Custom configuration using the builder
/// let config = StreamConfig::builder()
///     .delivery_capacity(16)
///     .default_limit(1000)
///     .build()
///     .unwrap();
/// assert_eq!(config.default_limit, Some(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Units the consumer-side delivery buffer holds before the engine is
    /// asked to pause. Must be at least 1.
    /// Default: 64
    pub delivery_capacity: usize,

    /// Document limit applied to executions that do not set their own.
    /// Default: None
    pub default_limit: Option<u64>,

    /// Ask the engine for an explain log on every execution.
    /// Default: false
    pub explain: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
            default_limit: None,
            explain: false,
        }
    }
}

impl StreamConfig {
    /// Create a new builder for custom stream configuration.
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder::new()
    }

    /// Small delivery buffer: the engine never runs more than a few
    /// documents ahead of the consumer. Useful in tests, where pause and
    /// resume should happen early and often.
    pub fn fast() -> Self {
        Self {
            delivery_capacity: 4,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.delivery_capacity == 0 {
            return Err(LinkError::ConfigurationError(
                "delivery_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Options used by [`Query::execute`](crate::Query::execute).
    pub fn default_options(&self) -> StreamOptions {
        StreamOptions {
            limit: self.default_limit,
            explain: self.explain,
        }
    }

    /// Build a configuration from string key/value pairs.
    ///
    /// Accepts snake_case keys or their dotted aliases:
    /// `delivery_capacity` / `delivery.capacity`, `default_limit` /
    /// `query.limit`, `explain` / `query.explain`. Unknown keys are ignored.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = get_str(map, "delivery_capacity", "delivery.capacity") {
            config.delivery_capacity = parse_usize(&value, "delivery_capacity")?;
        }
        if let Some(value) = get_str(map, "default_limit", "query.limit") {
            config.default_limit = parse_limit(&value)?;
        }
        if let Some(value) = get_str(map, "explain", "query.explain") {
            config.explain = parse_bool(&value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Builder for creating custom [`StreamConfig`] configurations.
#[derive(Debug, Clone)]
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    fn new() -> Self {
        Self {
            config: StreamConfig::default(),
        }
    }

    /// Set the delivery buffer size that triggers a pause.
    pub fn delivery_capacity(mut self, capacity: usize) -> Self {
        self.config.delivery_capacity = capacity;
        self
    }

    /// Set the default document limit.
    pub fn default_limit(mut self, limit: u64) -> Self {
        self.config.default_limit = Some(limit);
        self
    }

    /// Request explain logs by default.
    pub fn explain(mut self, explain: bool) -> Self {
        self.config.explain = explain;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<StreamConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn get_str(map: &HashMap<String, String>, key: &str, alias: &str) -> Option<String> {
    map.get(key).cloned().or_else(|| map.get(alias).cloned())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(LinkError::ConfigurationError(format!("Invalid boolean value: {}", value))),
    }
}

fn parse_usize(value: &str, field: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        LinkError::ConfigurationError(format!("Invalid {} value: {}", field, value))
    })
}

/// `none`, an empty string or `0` mean "no limit".
fn parse_limit(value: &str) -> Result<Option<u64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let limit = trimmed.parse::<u64>().map_err(|_| {
        LinkError::ConfigurationError(format!("Invalid default_limit value: {}", value))
    })?;
    Ok(if limit == 0 { None } else { Some(limit) })
}
