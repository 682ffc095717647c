//! Per-site crawl context
//!
//! Everything the page tasks of one site share: the site record, the visited
//! set, the run's stop signal and the fetch budget. A fresh context is built
//! for every site of every run.

use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::indexer::PageIndexer;
use crate::state::StopSignal;
use crate::storage::SiteRecord;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub struct SiteCrawl {
    pub site: SiteRecord,
    /// Canonical site base URL, without trailing slash
    pub base: String,
    pub stop: Arc<StopSignal>,
    pub fetcher: Arc<HttpFetcher>,
    pub indexer: Arc<PageIndexer>,
    /// Caps in-flight fetches for this site
    pub fetch_permits: Semaphore,
    visited: Mutex<HashSet<String>>,
}

impl SiteCrawl {
    pub fn new(
        site: SiteRecord,
        base: String,
        stop: Arc<StopSignal>,
        fetcher: Arc<HttpFetcher>,
        indexer: Arc<PageIndexer>,
        max_pages_in_flight: usize,
    ) -> Self {
        Self {
            site,
            base,
            stop,
            fetcher,
            indexer,
            fetch_permits: Semaphore::new(max_pages_in_flight.max(1)),
            visited: Mutex::new(HashSet::new()),
        }
    }

    /// Records `url` as visited; returns false if it already was
    ///
    /// Check and insert happen under one lock, so two branches racing on the
    /// same URL cannot both win.
    pub fn mark_visited(&self, url: &str) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
