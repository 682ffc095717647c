//! Storage traits and error types
//!
//! This module defines the trait interface for the index store and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{IndexRecord, LemmaRecord, PageRecord, Posting, SiteRecord};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for index store implementations
///
/// Reads take `&self`; mutations take `&mut self`. The methods under
/// "Atomic Units" each apply all of their writes or none of them.
pub trait Storage {
    // ===== Site Management =====

    /// Creates a site row and returns its ID
    fn create_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64>;

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Sets the status of a site unconditionally, refreshing its status time
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<()>;

    /// Deletes a site together with its index rows, lemmas and pages
    fn delete_site(&mut self, site_id: i64) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts a page row without touching the index
    fn insert_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64>;

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    fn get_page_by_path(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>>;

    fn page_exists(&self, site_id: i64, path: &str) -> StorageResult<bool>;

    /// Counts pages of one site, or of every site when `site_id` is None
    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64>;

    // ===== Lemma Management =====

    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>>;

    fn create_lemma(&mut self, site_id: i64, lemma: &str, frequency: i64) -> StorageResult<i64>;

    fn update_lemma_frequency(&mut self, lemma_id: i64, frequency: i64) -> StorageResult<()>;

    /// Deletes a lemma and every index row referencing it
    fn delete_lemma(&mut self, lemma_id: i64) -> StorageResult<()>;

    fn list_lemmas(&self, site_id: i64) -> StorageResult<Vec<LemmaRecord>>;

    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64>;

    /// Number of pages containing `lemma`, within one site or across all sites
    fn lemma_page_frequency(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<u64>;

    // ===== Index Management =====

    fn insert_index(&mut self, page_id: i64, lemma_id: i64, rank: f64) -> StorageResult<i64>;

    fn list_index_by_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>>;

    fn delete_index_by_page(&mut self, page_id: i64) -> StorageResult<usize>;

    fn delete_index_by_lemma(&mut self, lemma_id: i64) -> StorageResult<usize>;

    /// Pages containing `lemma` with their rank, within one site or across all sites
    fn postings(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<Vec<Posting>>;

    // ===== Atomic Units =====

    /// Deletes any previous data for `url` and creates a fresh INDEXING site
    fn reset_site(&mut self, url: &str, name: &str) -> StorageResult<SiteRecord>;

    /// Inserts or re-indexes a page
    ///
    /// Existing index rows of the page are removed first and the frequency of
    /// every lemma they referenced is decremented (lemmas reaching zero are
    /// deleted). Then each lemma in `lemmas` gains one page of frequency and an
    /// index row with its occurrence count as rank.
    ///
    /// Returns the page ID.
    fn store_page_index(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
        lemmas: &HashMap<String, u32>,
    ) -> StorageResult<i64>;

    /// Removes a page and its index rows, decrementing lemma frequencies
    ///
    /// Returns false if the page did not exist.
    fn remove_page(&mut self, site_id: i64, path: &str) -> StorageResult<bool>;

    /// Moves every INDEXING site to FAILED with `error`; returns how many changed
    fn fail_indexing_sites(&mut self, error: &str) -> StorageResult<usize>;

    /// Moves a site out of INDEXING
    ///
    /// Returns false and changes nothing if the site is no longer INDEXING.
    fn finish_site(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<bool>;
}
