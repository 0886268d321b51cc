//! Embeddable, in-memory full-text search engine.
//!
//! Documents are indexed into a pair of mirrored posting maps (word → per
//! document term frequency and document → per word term frequency), queries
//! are parsed into inclusion/exclusion word sets, and matches are ranked by
//! TF-IDF with an optional status or predicate filter. Ranking, matching and
//! removal each come in a sequential and a data-parallel flavor selected by
//! an [`ExecutionPolicy`]; the parallel flavor accumulates scores through a
//! sharded, lock-per-bucket [`ConcurrentMap`].
//!
//! The index is a single-process, single-writer structure: calls against one
//! instance must be serialized externally, and parallelism never escapes an
//! individual call.

pub mod batch;
pub mod concurrent_map;
pub mod dedup;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod request_queue;
pub mod tokenizer;

pub use batch::{process_queries, process_queries_joined};
pub use concurrent_map::ConcurrentMap;
pub use dedup::remove_duplicates;
pub use document::{Document, DocumentId, DocumentStatus};
pub use error::{Result, SearchError};
pub use index::{DocumentFilter, ExecutionPolicy, SearchIndex, MAX_RESULT_DOCUMENT_COUNT};
pub use query::Query;
pub use request_queue::{RequestQueue, REQUEST_WINDOW};
