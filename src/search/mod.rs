//! Search module
//!
//! Ranked keyword search over the lemma index, with highlighted snippets.

mod engine;
mod snippet;

use serde::{Deserialize, Serialize};

pub use engine::SearchEngine;
pub use snippet::build_snippet;

/// A search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    /// Free-text query
    pub query: String,

    /// Base URL of the site to search; all sites when absent
    #[serde(default)]
    pub site: Option<String>,

    /// Number of ranked results to skip
    #[serde(default)]
    pub offset: i64,

    /// Maximum number of results; the configured default when absent
    #[serde(default)]
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            site: None,
            offset: 0,
            limit: None,
        }
    }
}

/// One ranked page
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub site: String,
    pub site_name: String,
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}

/// A page of results together with the total number of matches
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<SearchResult>,
}
