use super::Document;

/// A unit delivered to the consumer of a [`ResultStream`](crate::ResultStream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultItem {
    /// A matched document.
    Document(Document),
    /// A computed scalar (e.g. a count). Always the only item of its stream.
    Scalar(i64),
}

impl ResultItem {
    /// Document id, or `None` for scalar results.
    pub fn id(&self) -> Option<u64> {
        match self {
            ResultItem::Document(doc) => Some(doc.id()),
            ResultItem::Scalar(_) => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            ResultItem::Document(doc) => Some(doc),
            ResultItem::Scalar(_) => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            ResultItem::Document(doc) => Some(doc),
            ResultItem::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<i64> {
        match self {
            ResultItem::Scalar(value) => Some(*value),
            ResultItem::Document(_) => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, ResultItem::Scalar(_))
    }
}
