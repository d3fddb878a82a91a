//! Data models for the jql-link streaming bridge.
//!
//! Defines the units exchanged with the query engine, the items delivered to
//! consumers, and the typed placeholder values bound to queries.

pub mod document;
pub mod engine_error;
pub mod engine_item;
pub mod placeholder;
pub mod result_item;
pub mod stream_options;
pub mod stream_state;
pub mod typed_value;


pub use document::Document;
pub use engine_error::EngineError;
pub use engine_item::EngineItem;
pub use placeholder::{IntoPlaceholder, Placeholder};
pub use result_item::ResultItem;
pub use stream_options::StreamOptions;
pub use stream_state::{StreamOutcome, StreamState};
pub use typed_value::TypedValue;
