//! Crawler module for fetching and indexing sites
//!
//! This module contains the crawl-and-index pipeline, including:
//! - HTTP fetching with the configured identity and timeouts
//! - HTML parsing, text and link extraction
//! - Per-site recursive crawling with a shared visited set
//! - Lemmatize-and-persist of each fetched page
//! - Overall run coordination (start, stop, single-page re-index)

mod context;
mod coordinator;
mod fetcher;
mod indexer;
mod page;
mod parser;

pub use coordinator::{Coordinator, RunSummary, STOPPED_BY_OPERATOR};
pub use fetcher::{build_http_client, FetchResult, HttpFetcher};
pub use indexer::{IndexedPage, PageIndexer};
pub use parser::{extract_content, parse_html, ParsedPage};
