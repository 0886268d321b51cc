//! Query parsing: raw text to deduplicated inclusion/exclusion word sets.

use std::collections::BTreeSet;

use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words};

/// A parsed query. Both sets are deduplicated, stripped of stop words, and
/// iterate in lexicographic order; that order is observable in match
/// results.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query {
    pub plus_words: BTreeSet<String>,
    pub minus_words: BTreeSet<String>,
}

struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
}

/// A leading `-` marks an exclusion word and is stripped before the checks.
/// What remains must be non-empty, must not start with another `-`, and must
/// not contain control characters.
fn parse_query_word(token: &str) -> Result<QueryWord<'_>> {
    let (data, is_minus) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if data.is_empty() || data.starts_with('-') {
        return Err(SearchError::InvalidQuery(token.to_string()));
    }
    if !is_valid_word(data) {
        return Err(SearchError::InvalidWord(data.to_string()));
    }
    Ok(QueryWord { data, is_minus })
}

impl Query {
    /// Parse raw query text against a stop-word set. Pure function of its
    /// inputs. Stop words are dropped after validation, so a stop word with
    /// an exclusion marker is silently discarded rather than rejected.
    pub fn parse(text: &str, stop_words: &BTreeSet<String>) -> Result<Self> {
        let mut query = Query::default();
        for token in split_into_words(text) {
            let word = parse_query_word(token)?;
            if stop_words.contains(word.data) {
                continue;
            }
            if word.is_minus {
                query.minus_words.insert(word.data.to_string());
            } else {
                query.plus_words.insert(word.data.to_string());
            }
        }
        Ok(query)
    }

    pub fn is_empty(&self) -> bool {
        self.plus_words.is_empty() && self.minus_words.is_empty()
    }
}
