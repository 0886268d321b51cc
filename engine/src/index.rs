//! The inverted-index store: document table, mirrored word/document posting
//! maps, and the search operations over them.
//!
//! Every operation with a data-parallel variant is a single implementation
//! parameterized by [`ExecutionPolicy`]; the policy only selects sequential
//! or parallel primitives for the map/filter/reduce steps, so both modes
//! produce identical results by construction.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use lazy_static::lazy_static;
use rayon::prelude::*;

use crate::concurrent_map::ConcurrentMap;
use crate::document::{average_rating, Document, DocumentData, DocumentId, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::query::Query;
use crate::tokenizer::{is_valid_word, split_into_words};

/// Result lists from [`SearchIndex::find_top_documents`] never exceed this
/// many entries.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;

/// Relevance scores closer than this are tied and fall back to the rating.
const RELEVANCE_EPSILON: f64 = 1e-6;

/// Bucket count for the per-call relevance accumulator in parallel mode.
const ACCUMULATOR_BUCKETS: usize = 101;

/// Execution strategy for operations that have a data-parallel variant.
///
/// Parallel calls fan out over rayon workers and join before returning;
/// callers observe a synchronous call either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    Parallel,
}

/// Predicate deciding which documents participate in ranking.
///
/// Implemented for [`DocumentStatus`] (exact status match) and for closures
/// over `(id, status, rating)`.
pub trait DocumentFilter: Sync {
    fn accepts(&self, document_id: DocumentId, status: DocumentStatus, rating: i32) -> bool;
}

impl DocumentFilter for DocumentStatus {
    fn accepts(&self, _document_id: DocumentId, status: DocumentStatus, _rating: i32) -> bool {
        *self == status
    }
}

impl<F> DocumentFilter for F
where
    F: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
{
    fn accepts(&self, document_id: DocumentId, status: DocumentStatus, rating: i32) -> bool {
        self(document_id, status, rating)
    }
}

/// Insertion-ordered set of live document ids.
///
/// A monotonic sequence number keys an ordered map, with a reverse map for
/// membership and removal, so excising an id never scans the whole order.
#[derive(Debug, Default)]
struct InsertionOrder {
    by_sequence: BTreeMap<u64, DocumentId>,
    sequence_of: HashMap<DocumentId, u64>,
    next_sequence: u64,
}

impl InsertionOrder {
    fn insert(&mut self, document_id: DocumentId) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.by_sequence.insert(sequence, document_id);
        self.sequence_of.insert(document_id, sequence);
    }

    fn remove(&mut self, document_id: DocumentId) {
        if let Some(sequence) = self.sequence_of.remove(&document_id) {
            self.by_sequence.remove(&sequence);
        }
    }

    fn contains(&self, document_id: DocumentId) -> bool {
        self.sequence_of.contains_key(&document_id)
    }

    fn iter(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.by_sequence.values().copied()
    }
}

lazy_static! {
    static ref EMPTY_WORD_FREQS: BTreeMap<String, f64> = BTreeMap::new();
}

/// In-memory full-text index with TF-IDF ranking.
///
/// The index is not internally synchronized: concurrent calls against the
/// same instance must be serialized externally. Parallelism is strictly
/// per-call; parallel reads write only into per-call accumulators, and
/// parallel removal touches only one document's non-overlapping word set.
#[derive(Debug, Default)]
pub struct SearchIndex {
    stop_words: BTreeSet<String>,
    word_to_document_freqs: HashMap<String, BTreeMap<DocumentId, f64>>,
    document_to_word_freqs: HashMap<DocumentId, BTreeMap<String, f64>>,
    documents: HashMap<DocumentId, DocumentData>,
    document_order: InsertionOrder,
}

impl SearchIndex {
    /// An index with no stop words.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index with the given stop words. Empty strings are dropped,
    /// duplicates collapse, and a word with a control character is rejected.
    pub fn with_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = BTreeSet::new();
        for word in stop_words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            words.insert(word.to_string());
        }
        Ok(SearchIndex {
            stop_words: words,
            ..Self::default()
        })
    }

    /// An index with stop words given as one whitespace-separated string.
    pub fn with_stop_words_text(text: &str) -> Result<Self> {
        Self::with_stop_words(split_into_words(text))
    }

    pub fn stop_words(&self) -> &BTreeSet<String> {
        &self.stop_words
    }

    /// Number of live documents.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Live document ids in insertion order.
    pub fn document_ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.document_order.iter()
    }

    /// The stored text of a document, if the id is live.
    pub fn document_text(&self, document_id: DocumentId) -> Option<&str> {
        self.documents.get(&document_id).map(|data| data.text.as_str())
    }

    /// Index a document under `document_id`.
    ///
    /// Fails with `InvalidId` for a negative or already-present id and with
    /// `InvalidWord` if any word of the text carries a control character
    /// (checked before stop-word filtering). On failure nothing is recorded.
    pub fn add_document(
        &mut self,
        document_id: DocumentId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if document_id < 0 || self.documents.contains_key(&document_id) {
            return Err(SearchError::InvalidId(document_id));
        }
        let words = self.split_into_words_no_stop(text)?;

        let inv_word_count = 1.0 / words.len() as f64;
        for &word in &words {
            *self
                .word_to_document_freqs
                .entry(word.to_string())
                .or_default()
                .entry(document_id)
                .or_insert(0.0) += inv_word_count;
            *self
                .document_to_word_freqs
                .entry(document_id)
                .or_default()
                .entry(word.to_string())
                .or_insert(0.0) += inv_word_count;
        }
        self.documents.insert(
            document_id,
            DocumentData {
                text: text.to_string(),
                rating: average_rating(ratings),
                status,
            },
        );
        self.document_order.insert(document_id);
        tracing::debug!(document_id, indexed_words = words.len(), "document added");
        Ok(())
    }

    /// Top matches for `raw_query` among documents with status
    /// [`DocumentStatus::Actual`], ranked sequentially.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, DocumentStatus::Actual)
    }

    /// Top matches for `raw_query` among documents accepted by `filter`.
    ///
    /// Scores accumulate `tf * idf` per inclusion word, documents posted by
    /// any exclusion word are dropped, and the survivors are sorted by
    /// descending relevance (ties within 1e-6 broken by descending rating)
    /// and truncated to [`MAX_RESULT_DOCUMENT_COUNT`].
    pub fn find_top_documents_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        filter: impl DocumentFilter,
    ) -> Result<Vec<Document>> {
        let query = Query::parse(raw_query, &self.stop_words)?;
        let mut relevance = self.accumulate_relevance(policy, &query, &filter);

        for word in &query.minus_words {
            if let Some(postings) = self.word_to_document_freqs.get(word) {
                for document_id in postings.keys() {
                    relevance.remove(document_id);
                }
            }
        }

        let mut matched: Vec<Document> = relevance
            .into_iter()
            .map(|(document_id, relevance)| Document {
                id: document_id,
                relevance,
                rating: self.documents[&document_id].rating,
            })
            .collect();
        matched.sort_by(compare_by_relevance_then_rating);
        matched.truncate(MAX_RESULT_DOCUMENT_COUNT);
        tracing::trace!(query = raw_query, results = matched.len(), "query ranked");
        Ok(matched)
    }

    /// Accumulate per-document relevance for the query's inclusion words.
    /// Sequential mode fills a plain map; parallel mode partitions by word
    /// and merges through a sharded accumulator. Same totals either way.
    fn accumulate_relevance(
        &self,
        policy: ExecutionPolicy,
        query: &Query,
        filter: &impl DocumentFilter,
    ) -> BTreeMap<DocumentId, f64> {
        match policy {
            ExecutionPolicy::Sequential => {
                let mut relevance = BTreeMap::new();
                for word in &query.plus_words {
                    let Some(postings) = self.word_to_document_freqs.get(word) else {
                        continue;
                    };
                    if postings.is_empty() {
                        continue;
                    }
                    let idf = self.inverse_document_freq(postings);
                    for (&document_id, &term_freq) in postings {
                        let data = &self.documents[&document_id];
                        if filter.accepts(document_id, data.status, data.rating) {
                            *relevance.entry(document_id).or_insert(0.0) += term_freq * idf;
                        }
                    }
                }
                relevance
            }
            ExecutionPolicy::Parallel => {
                let words: Vec<&str> = query
                    .plus_words
                    .par_iter()
                    .filter(|word| {
                        !query.minus_words.contains(word.as_str())
                            && self
                                .word_to_document_freqs
                                .get(word.as_str())
                                .map_or(false, |postings| !postings.is_empty())
                    })
                    .map(|word| word.as_str())
                    .collect();

                let accumulator = ConcurrentMap::new(ACCUMULATOR_BUCKETS);
                words.par_iter().for_each(|&word| {
                    let postings = &self.word_to_document_freqs[word];
                    let idf = self.inverse_document_freq(postings);
                    for (&document_id, &term_freq) in postings {
                        let data = &self.documents[&document_id];
                        if filter.accepts(document_id, data.status, data.rating) {
                            *accumulator.access(document_id) += term_freq * idf;
                        }
                    }
                });
                accumulator.into_ordinary_map()
            }
        }
    }

    fn inverse_document_freq(&self, postings: &BTreeMap<DocumentId, f64>) -> f64 {
        (self.documents.len() as f64 / postings.len() as f64).ln()
    }

    /// Remove a document and every trace of it. Unknown ids are a no-op.
    pub fn remove_document(&mut self, document_id: DocumentId) {
        self.remove_document_with(ExecutionPolicy::Sequential, document_id)
    }

    /// Remove a document, optionally erasing its word postings in parallel.
    ///
    /// Parallel mode partitions the erasure by the document's own word set;
    /// since that set has no duplicates, no two tasks touch the same posting
    /// entry. Removing two documents concurrently, or removing while a find
    /// or match is in flight, is not supported.
    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, document_id: DocumentId) {
        if !self.document_order.contains(document_id) {
            return;
        }
        let word_freqs = self
            .document_to_word_freqs
            .remove(&document_id)
            .unwrap_or_default();

        match policy {
            ExecutionPolicy::Sequential => {
                for word in word_freqs.keys() {
                    if let Some(postings) = self.word_to_document_freqs.get_mut(word) {
                        postings.remove(&document_id);
                    }
                }
            }
            ExecutionPolicy::Parallel => {
                let postings_of_document: Vec<&mut BTreeMap<DocumentId, f64>> = self
                    .word_to_document_freqs
                    .iter_mut()
                    .filter_map(|(word, postings)| {
                        word_freqs.contains_key(word).then_some(postings)
                    })
                    .collect();
                postings_of_document.into_par_iter().for_each(|postings| {
                    postings.remove(&document_id);
                });
            }
        }

        self.documents.remove(&document_id);
        self.document_order.remove(document_id);
        tracing::debug!(document_id, "document removed");
    }

    /// Match a query against one document.
    pub fn match_document(
        &self,
        raw_query: &str,
        document_id: DocumentId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, document_id)
    }

    /// Match a query against one document.
    ///
    /// If any exclusion word is posted against the document the matched-word
    /// list is empty; otherwise it holds the inclusion words posted against
    /// the document, in lexicographic order. Either way the document's
    /// status is returned. Fails with `UnknownDocument` for a dead id.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        document_id: DocumentId,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        if !self.document_order.contains(document_id) {
            return Err(SearchError::UnknownDocument(document_id));
        }
        let status = self.documents[&document_id].status;
        let query = Query::parse(raw_query, &self.stop_words)?;

        let posted_against = |word: &str| {
            self.word_to_document_freqs
                .get(word)
                .map_or(false, |postings| postings.contains_key(&document_id))
        };

        let excluded = match policy {
            ExecutionPolicy::Sequential => {
                query.minus_words.iter().any(|word| posted_against(word))
            }
            ExecutionPolicy::Parallel => {
                query.minus_words.par_iter().any(|word| posted_against(word))
            }
        };
        if excluded {
            return Ok((Vec::new(), status));
        }

        let matched = match policy {
            ExecutionPolicy::Sequential => query
                .plus_words
                .iter()
                .filter(|word| posted_against(word.as_str()))
                .cloned()
                .collect(),
            ExecutionPolicy::Parallel => {
                let words: Vec<&String> = query.plus_words.iter().collect();
                words
                    .into_par_iter()
                    .filter(|word| posted_against(word.as_str()))
                    .cloned()
                    .collect()
            }
        };
        Ok((matched, status))
    }

    /// The word → term-frequency view of a document, or a shared empty map
    /// for an unknown id. Never an error.
    pub fn word_frequencies(&self, document_id: DocumentId) -> &BTreeMap<String, f64> {
        self.document_to_word_freqs
            .get(&document_id)
            .unwrap_or(&EMPTY_WORD_FREQS)
    }

    /// Split document text, rejecting control characters before stop-word
    /// filtering so an invalid stop word still fails the add.
    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            if !self.stop_words.contains(word) {
                words.push(word);
            }
        }
        Ok(words)
    }
}

fn compare_by_relevance_then_rating(lhs: &Document, rhs: &Document) -> Ordering {
    if (lhs.relevance - rhs.relevance).abs() < RELEVANCE_EPSILON {
        rhs.rating.cmp(&lhs.rating)
    } else {
        rhs.relevance
            .partial_cmp(&lhs.relevance)
            .unwrap_or(Ordering::Equal)
    }
}
