use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LinkError, Result};

/// Placeholder slot in query text: a 0-based position or a name.
///
/// Keys are unique per query; binding the same key twice overwrites the
/// earlier value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Placeholder {
    Index(usize),
    Name(String),
}

impl Placeholder {
    /// Parse a textual key.
    ///
    /// A key made only of ASCII digits is positional. A leading `:` is
    /// accepted for named keys and stripped (`":age"` and `"age"` are the same
    /// slot).
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LinkError::InvalidPlaceholder(
                "Placeholder name must not be empty".into(),
            ));
        }
        if key.bytes().all(|b| b.is_ascii_digit()) {
            return key.parse::<usize>().map(Placeholder::Index).map_err(|_| {
                LinkError::InvalidPlaceholder(format!("Placeholder index out of range: {}", key))
            });
        }
        let name = key.strip_prefix(':').unwrap_or(key);
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(LinkError::InvalidPlaceholder(format!(
                "Invalid placeholder name: '{}'",
                key
            )));
        }
        Ok(Placeholder::Name(name.to_string()))
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Placeholder::Index(_))
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Index(i) => write!(f, "{}", i),
            Placeholder::Name(n) => write!(f, ":{}", n),
        }
    }
}

/// Conversion into a validated [`Placeholder`].
///
/// Implemented for unsigned and signed integers (negative indexes are
/// rejected) and for strings.
pub trait IntoPlaceholder {
    fn into_placeholder(self) -> Result<Placeholder>;
}

impl IntoPlaceholder for Placeholder {
    fn into_placeholder(self) -> Result<Placeholder> {
        match self {
            Placeholder::Name(name) => Placeholder::parse(&name),
            index => Ok(index),
        }
    }
}

impl IntoPlaceholder for usize {
    fn into_placeholder(self) -> Result<Placeholder> {
        Ok(Placeholder::Index(self))
    }
}

impl IntoPlaceholder for u32 {
    fn into_placeholder(self) -> Result<Placeholder> {
        Ok(Placeholder::Index(self as usize))
    }
}

impl IntoPlaceholder for i32 {
    fn into_placeholder(self) -> Result<Placeholder> {
        i64::from(self).into_placeholder()
    }
}

impl IntoPlaceholder for i64 {
    fn into_placeholder(self) -> Result<Placeholder> {
        usize::try_from(self).map(Placeholder::Index).map_err(|_| {
            LinkError::InvalidPlaceholder(format!(
                "Placeholder index must be non-negative, got {}",
                self
            ))
        })
    }
}

impl IntoPlaceholder for &str {
    fn into_placeholder(self) -> Result<Placeholder> {
        Placeholder::parse(self)
    }
}

impl IntoPlaceholder for String {
    fn into_placeholder(self) -> Result<Placeholder> {
        Placeholder::parse(&self)
    }
}

impl IntoPlaceholder for &String {
    fn into_placeholder(self) -> Result<Placeholder> {
        Placeholder::parse(self)
    }
}
