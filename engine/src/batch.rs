//! Batch query fan-out: one independent search per query, results in query
//! order.

use rayon::prelude::*;

use crate::document::Document;
use crate::error::Result;
use crate::index::SearchIndex;

/// Run every query against the index, each as an independent sequential
/// search across rayon workers. The outer order matches the query order;
/// the first failing query fails the batch.
pub fn process_queries(index: &SearchIndex, queries: &[String]) -> Result<Vec<Vec<Document>>> {
    queries
        .par_iter()
        .map(|raw_query| index.find_top_documents(raw_query))
        .collect()
}

/// Like [`process_queries`], flattened into one list that preserves the
/// per-query result order.
pub fn process_queries_joined(index: &SearchIndex, queries: &[String]) -> Result<Vec<Document>> {
    Ok(process_queries(index, queries)?
        .into_iter()
        .flatten()
        .collect())
}
