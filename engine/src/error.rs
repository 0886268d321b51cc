use thiserror::Error;

use crate::document::DocumentId;

/// Validation failures surfaced by the engine. All of them are detected
/// synchronously from the inputs; none is transient or retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A negative id, or an id that is already present in the index.
    #[error("invalid document id {0}")]
    InvalidId(DocumentId),
    /// A word (in document text, query text or the stop-word set) contains a
    /// control character below U+0020.
    #[error("word {0:?} contains a control character")]
    InvalidWord(String),
    /// Malformed exclusion-marker usage in a query: a bare `-` or a `--`
    /// prefixed token.
    #[error("invalid query token {0:?}")]
    InvalidQuery(String),
    /// An operation referenced a document id that is not in the index.
    #[error("no document with id {0}")]
    UnknownDocument(DocumentId),
}

pub type Result<T> = std::result::Result<T, SearchError>;
