use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::Result;

/// A matched document: engine-assigned id plus its raw JSON text.
///
/// The JSON tree is parsed on first access and cached, so consumers that only
/// forward raw payloads never pay for parsing.
#[derive(Clone)]
pub struct Document {
    id: u64,
    raw: String,
    json: OnceCell<JsonValue>,
}

impl Document {
    pub fn new(id: u64, raw: impl Into<String>) -> Self {
        Self {
            id,
            raw: raw.into(),
            json: OnceCell::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Raw JSON text as produced by the engine.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed JSON tree. Malformed payloads surface here, not at delivery.
    pub fn json(&self) -> Result<&JsonValue> {
        self.json
            .get_or_try_init(|| serde_json::from_str(&self.raw))
            .map_err(Into::into)
    }

    /// Deserialize the payload into a caller-provided type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.raw)?)
    }

    pub fn into_json(self) -> Result<JsonValue> {
        match self.json.into_inner() {
            Some(value) => Ok(value),
            None => Ok(serde_json::from_str(&self.raw)?),
        }
    }

    pub fn into_raw(self) -> String {
        self.raw
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.raw == other.raw
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("raw", &self.raw)
            .finish()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document({}): {}", self.id, self.raw)
    }
}
