//! Error types for jql-link.
//!
//! Engine failures are never raised on the engine thread. They travel through
//! the result stream like any other unit and turn into a [`LinkError`] only
//! when the consumer pulls them.

use crate::models::EngineError;
use thiserror::Error;

/// Errors that can occur while building, executing or consuming a query.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Malformed placeholder key or a value with an invalid shape for its kind.
    #[error("Invalid placeholder: {0}")]
    InvalidPlaceholder(String),

    /// The engine rejected the query text.
    #[error("Query parse error: {0}")]
    QueryParseError(String),

    /// The engine failed while producing results (storage fault, resource limits).
    #[error("Engine execution error ({code}): {message}")]
    EngineExecutionError { code: i64, message: String },

    /// The stream was already released or has already reported its end.
    #[error("Stream is closed")]
    StreamClosed,

    /// A result was required but the query produced none.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The stream delivered an item of the wrong shape for the adapter in use.
    #[error("Unexpected result item: {0}")]
    UnexpectedItem(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// A consumer callback passed to `for_each` failed.
    #[error("Callback error: {0}")]
    CallbackError(String),
}

impl LinkError {
    /// Returns `true` for zero-result outcomes, including the engine's own
    /// not-found code.
    pub fn is_not_found(&self) -> bool {
        match self {
            LinkError::NotFound(_) => true,
            LinkError::EngineExecutionError { code, .. } => *code == EngineError::NOT_FOUND,
            _ => false,
        }
    }

    /// Returns `true` if the engine rejected the query text.
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, LinkError::QueryParseError(_))
    }

    /// Returns `true` if this error was reported by the engine collaborator.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            LinkError::QueryParseError(_) | LinkError::EngineExecutionError { .. }
        )
    }
}

impl From<EngineError> for LinkError {
    fn from(err: EngineError) -> Self {
        if err.is_parse_error() {
            LinkError::QueryParseError(err.message)
        } else {
            LinkError::EngineExecutionError {
                code: err.code,
                message: err.message,
            }
        }
    }
}

/// Result type for jql-link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_maps_to_query_parse_error() {
        let err: LinkError = EngineError::parse_error("unexpected token '|'").into();
        assert!(err.is_invalid_query());
        assert!(err.is_engine_error());
        assert_eq!(err.to_string(), "Query parse error: unexpected token '|'");
    }

    #[test]
    fn test_other_codes_map_to_execution_error() {
        let err: LinkError = EngineError::new(70002, "sort buffer overflow").into();
        match &err {
            LinkError::EngineExecutionError { code, message } => {
                assert_eq!(*code, 70002);
                assert_eq!(message, "sort buffer overflow");
            },
            other => panic!("unexpected variant: {:?}", other),
        }
        assert!(!err.is_invalid_query());
    }

    #[test]
    fn test_not_found_predicate() {
        assert!(LinkError::NotFound("no rows".into()).is_not_found());
        let engine_nf: LinkError = EngineError::new(EngineError::NOT_FOUND, "missing").into();
        assert!(engine_nf.is_not_found());
        assert!(!LinkError::StreamClosed.is_not_found());
    }
}
