use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::{LinkError, Result};

/// A value bound to a query placeholder.
///
/// One variant per kind the engine understands. Shape is checked when the
/// value is bound (see [`TypedValue::validate`]); whether the kind makes sense
/// for the placeholder's position in the query is left to the engine.
///
/// # Examples
///
/// ```rust
/// use jql_link::TypedValue;
/// use serde_json::json;
///
/// let age = TypedValue::from(42_i64);
/// let name = TypedValue::from("Alice");
/// let filter = TypedValue::Json(json!({"status": "active"}));
/// assert_eq!(age.kind(), "integer");
/// assert_eq!(name.kind(), "string");
/// assert_eq!(filter.kind(), "json");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    String(String),
    Json(JsonValue),
    /// Regular expression source as handed to the engine.
    Regexp(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl TypedValue {
    /// Parse pre-serialized JSON text into a [`TypedValue::Json`].
    pub fn json_text(text: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(text).map_err(|e| {
            LinkError::InvalidPlaceholder(format!("Invalid JSON placeholder value: {}", e))
        })?;
        Ok(TypedValue::Json(value))
    }

    /// Build a [`TypedValue::Regexp`] from a pattern, kept verbatim.
    ///
    /// `"/usr/"` is bound as the five characters `/usr/`. Use
    /// [`TypedValue::regexp_literal`] for the `/pattern/flags` form.
    pub fn regexp(pattern: impl Into<String>) -> Result<Self> {
        let value = TypedValue::Regexp(pattern.into());
        value.validate()?;
        Ok(value)
    }

    /// Build a [`TypedValue::Regexp`] from a `/pattern/flags` literal,
    /// stripping the delimiters and trailing flags.
    pub fn regexp_literal(literal: &str) -> Result<Self> {
        let source = literal
            .strip_prefix('/')
            .and_then(|rest| rest.rfind('/').map(|end| &rest[..end]))
            .ok_or_else(|| {
                LinkError::InvalidPlaceholder(format!("Not a /pattern/flags literal: {}", literal))
            })?;
        Self::regexp(source)
    }

    /// Short lowercase name of the value kind, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::String(_) => "string",
            TypedValue::Json(_) => "json",
            TypedValue::Regexp(_) => "regexp",
            TypedValue::Integer(_) => "integer",
            TypedValue::Float(_) => "float",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Null => "null",
        }
    }

    /// Check the value's shape independently of any query.
    pub fn validate(&self) -> Result<()> {
        match self {
            TypedValue::Regexp(pattern) if pattern.is_empty() => Err(
                LinkError::InvalidPlaceholder("Regexp placeholder value must not be empty".into()),
            ),
            TypedValue::Float(v) if !v.is_finite() => Err(LinkError::InvalidPlaceholder(format!(
                "Float placeholder value must be finite, got {}",
                v
            ))),
            _ => Ok(()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => write!(f, "{:?}", s),
            TypedValue::Json(v) => write!(f, "{}", v),
            TypedValue::Regexp(p) => write!(f, "/{}/", p),
            TypedValue::Integer(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Boolean(v) => write!(f, "{}", v),
            TypedValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::String(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::String(value.to_string())
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Integer(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::Integer(i64::from(value))
    }
}

impl From<u32> for TypedValue {
    fn from(value: u32) -> Self {
        TypedValue::Integer(i64::from(value))
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        TypedValue::Float(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Boolean(value)
    }
}

impl From<JsonValue> for TypedValue {
    fn from(value: JsonValue) -> Self {
        TypedValue::Json(value)
    }
}

impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TypedValue::Null)
    }
}
