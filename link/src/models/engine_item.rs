/// A unit pushed by the query engine into a [`ResultSink`](crate::ResultSink).
///
/// Any unit may carry the execution's explain log. Only the first log seen by
/// a stream is kept; later ones are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineItem {
    /// A matched document with its raw JSON payload.
    Document {
        id: u64,
        payload: String,
        explain: Option<String>,
    },
    /// A scalar result. Completes the stream on its own.
    Scalar { value: i64, explain: Option<String> },
    /// Completion sentinel.
    End { explain: Option<String> },
}

impl EngineItem {
    pub fn document(id: u64, payload: impl Into<String>) -> Self {
        EngineItem::Document {
            id,
            payload: payload.into(),
            explain: None,
        }
    }

    pub fn scalar(value: i64) -> Self {
        EngineItem::Scalar {
            value,
            explain: None,
        }
    }

    pub fn end() -> Self {
        EngineItem::End { explain: None }
    }

    /// Attach an explain log to this unit.
    pub fn with_explain(mut self, log: impl Into<String>) -> Self {
        let slot = match &mut self {
            EngineItem::Document { explain, .. }
            | EngineItem::Scalar { explain, .. }
            | EngineItem::End { explain } => explain,
        };
        *slot = Some(log.into());
        self
    }

    pub(crate) fn take_explain(&mut self) -> Option<String> {
        match self {
            EngineItem::Document { explain, .. }
            | EngineItem::Scalar { explain, .. }
            | EngineItem::End { explain } => explain.take(),
        }
    }

    /// Whether this unit terminates the stream (sentinel or scalar).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EngineItem::Document { .. })
    }
}
