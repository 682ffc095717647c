//! Storage module for the search index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site lifecycle records
//! - Pages, site-scoped lemmas and the posting lists linking them
//! - The atomic units of index maintenance (page re-index, page removal, site reset)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared by the crawler, the search engine and the service
///
/// Every atomic unit runs while holding the lock, so readers never observe a
/// half-applied page update.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Opens (or creates) the index database and wraps it for sharing
pub fn open_storage(path: &Path) -> StorageResult<SharedStorage> {
    Ok(Arc::new(Mutex::new(SqliteStorage::new(path)?)))
}

/// Locks the shared storage
///
/// The guard must never be held across an `.await`.
pub fn lock(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

/// Represents a fetched page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// Represents a site-scoped lemma
#[derive(Debug, Clone, PartialEq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    pub frequency: i64,
}

/// Represents one posting list edge between a page and a lemma
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}

/// A page matching a lemma, as returned by [`Storage::postings`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub page_id: i64,
    pub site_id: i64,
    pub rank: f64,
}
