use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure reported by the engine through
/// [`ResultSink::fail`](crate::ResultSink::fail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    pub code: i64,
    pub message: String,
}

impl EngineError {
    /// Record not found.
    pub const NOT_FOUND: i64 = 75001;
    /// Query text could not be parsed.
    pub const QUERY_PARSE: i64 = 87001;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(Self::QUERY_PARSE, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Self::NOT_FOUND, message)
    }

    pub fn is_parse_error(&self) -> bool {
        self.code == Self::QUERY_PARSE
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Self::NOT_FOUND
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
