//! Rolling-window wrapper over the index: remembers the last simulated day
//! of queries and tracks how many of them came back empty.

use std::collections::VecDeque;

use crate::document::{Document, DocumentStatus};
use crate::error::Result;
use crate::index::{DocumentFilter, ExecutionPolicy, SearchIndex};

/// Window length: one request per simulated minute, one day deep.
pub const REQUEST_WINDOW: usize = 1440;

#[derive(Debug)]
struct QueryRecord {
    raw_query: String,
    found: usize,
}

pub struct RequestQueue<'a> {
    index: &'a SearchIndex,
    requests: VecDeque<QueryRecord>,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(index: &'a SearchIndex) -> Self {
        RequestQueue {
            index,
            requests: VecDeque::new(),
            no_result_requests: 0,
        }
    }

    /// Run one search over `Actual` documents and record it in the window.
    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_with(raw_query, DocumentStatus::Actual)
    }

    /// Run one filtered search and record it in the window. A query that
    /// fails to parse is not recorded.
    pub fn add_find_request_with(
        &mut self,
        raw_query: &str,
        filter: impl DocumentFilter,
    ) -> Result<Vec<Document>> {
        let result =
            self.index
                .find_top_documents_with(ExecutionPolicy::Sequential, raw_query, filter)?;
        self.record(raw_query, result.len());
        Ok(result)
    }

    /// How many requests in the current window returned no documents.
    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    /// The remembered queries, oldest first.
    pub fn recent_queries(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().map(|record| record.raw_query.as_str())
    }

    fn record(&mut self, raw_query: &str, found: usize) {
        if found == 0 {
            self.no_result_requests += 1;
        }
        self.requests.push_back(QueryRecord {
            raw_query: raw_query.to_string(),
            found,
        });
        if self.requests.len() > REQUEST_WINDOW {
            if let Some(expired) = self.requests.pop_front() {
                if expired.found == 0 {
                    self.no_result_requests -= 1;
                }
            }
        }
    }
}
