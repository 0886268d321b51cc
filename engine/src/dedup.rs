//! Duplicate-document removal: two documents are duplicates when they index
//! the same word set, regardless of term frequencies.

use std::collections::BTreeSet;

use crate::document::DocumentId;
use crate::index::SearchIndex;

/// Remove every document whose word set was already seen on an earlier
/// (in insertion order) document. Returns the removed ids in the order they
/// were removed. Calling this twice in a row removes nothing the second
/// time.
pub fn remove_duplicates(index: &mut SearchIndex) -> Vec<DocumentId> {
    let mut seen_word_sets: BTreeSet<BTreeSet<String>> = BTreeSet::new();
    let mut duplicates = Vec::new();

    for document_id in index.document_ids() {
        let words: BTreeSet<String> = index
            .word_frequencies(document_id)
            .keys()
            .cloned()
            .collect();
        if !seen_word_sets.insert(words) {
            duplicates.push(document_id);
        }
    }

    for &document_id in &duplicates {
        tracing::info!(document_id, "removing duplicate document");
        index.remove_document(document_id);
    }
    duplicates
}
