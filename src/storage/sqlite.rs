//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Atomic units run inside one transaction; the private helpers take a
//! `&Connection` so they work both on the connection and inside a transaction.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{IndexRecord, LemmaRecord, PageRecord, Posting, SiteRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let status: String = row.get(3)?;
    let status_time: String = row.get(4)?;
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&status)
            .ok_or_else(|| conversion_error(3, format!("unknown site status '{}'", status)))?,
        status_time: DateTime::parse_from_rfc3339(&status_time)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(4, e))?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn fetch_site(conn: &Connection, site_id: i64) -> StorageResult<SiteRecord> {
    conn.query_row(
        &format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS),
        params![site_id],
        site_from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::SiteNotFound(format!("Site ID {}", site_id)))
}

fn find_page_id(conn: &Connection, site_id: i64, path: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM pages WHERE site_id = ?1 AND path = ?2",
        params![site_id, path],
        |row| row.get(0),
    )
    .optional()
}

/// Deletes a site and everything that depends on it, leaf tables first
fn delete_site_rows(conn: &Connection, site_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM search_index WHERE page_id IN (SELECT id FROM pages WHERE site_id = ?1)",
        params![site_id],
    )?;
    conn.execute("DELETE FROM lemmas WHERE site_id = ?1", params![site_id])?;
    conn.execute("DELETE FROM pages WHERE site_id = ?1", params![site_id])?;
    conn.execute("DELETE FROM sites WHERE id = ?1", params![site_id])?;
    Ok(())
}

/// Removes the index rows of a page and releases its hold on each lemma
fn unlink_page(conn: &Connection, page_id: i64) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("SELECT lemma_id FROM search_index WHERE page_id = ?1")?;
    let lemma_ids = stmt
        .query_map(params![page_id], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    conn.execute("DELETE FROM search_index WHERE page_id = ?1", params![page_id])?;

    for lemma_id in lemma_ids {
        conn.execute(
            "UPDATE lemmas SET frequency = frequency - 1 WHERE id = ?1",
            params![lemma_id],
        )?;
        conn.execute(
            "DELETE FROM lemmas WHERE id = ?1 AND frequency <= 0",
            params![lemma_id],
        )?;
    }

    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn create_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sites (url, name, status, status_time) VALUES (?1, ?2, ?3, ?4)",
            params![url, name, status.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        fetch_site(&self.conn, site_id)
    }

    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, error, site_id],
        )?;
        if changed == 0 {
            return Err(StorageError::SiteNotFound(format!("Site ID {}", site_id)));
        }
        Ok(())
    }

    fn delete_site(&mut self, site_id: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        delete_site_rows(&tx, site_id)?;
        tx.commit()?;
        Ok(())
    }

    // ===== Page Management =====

    fn insert_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            params![site_id, path, code, content],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::PageNotFound(format!("Page ID {}", page_id)))
    }

    fn get_page_by_path(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE site_id = ?1 AND path = ?2",
                    PAGE_COLUMNS
                ),
                params![site_id, path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn page_exists(&self, site_id: i64, path: &str) -> StorageResult<bool> {
        Ok(find_page_id(&self.conn, site_id, path)?.is_some())
    }

    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE ?1 IS NULL OR site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Lemma Management =====

    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, site_id, lemma, frequency FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
                |row| {
                    Ok(LemmaRecord {
                        id: row.get(0)?,
                        site_id: row.get(1)?,
                        lemma: row.get(2)?,
                        frequency: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn create_lemma(&mut self, site_id: i64, lemma: &str, frequency: i64) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, ?3)",
            params![site_id, lemma, frequency],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_lemma_frequency(&mut self, lemma_id: i64, frequency: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE lemmas SET frequency = ?1 WHERE id = ?2",
            params![frequency, lemma_id],
        )?;
        Ok(())
    }

    fn delete_lemma(&mut self, lemma_id: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM search_index WHERE lemma_id = ?1",
            params![lemma_id],
        )?;
        tx.execute("DELETE FROM lemmas WHERE id = ?1", params![lemma_id])?;
        tx.commit()?;
        Ok(())
    }

    fn list_lemmas(&self, site_id: i64) -> StorageResult<Vec<LemmaRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, lemma, frequency FROM lemmas WHERE site_id = ?1 ORDER BY lemma",
        )?;
        let lemmas = stmt
            .query_map(params![site_id], |row| {
                Ok(LemmaRecord {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    lemma: row.get(2)?,
                    frequency: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lemmas)
    }

    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lemmas WHERE ?1 IS NULL OR site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn lemma_page_frequency(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(frequency), 0) FROM lemmas
             WHERE lemma = ?1 AND (?2 IS NULL OR site_id = ?2)",
            params![lemma, site_id],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    // ===== Index Management =====

    fn insert_index(&mut self, page_id: i64, lemma_id: i64, rank: f64) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO search_index (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)",
            params![page_id, lemma_id, rank],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_index_by_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, page_id, lemma_id, rank FROM search_index WHERE page_id = ?1 ORDER BY lemma_id",
        )?;
        let rows = stmt
            .query_map(params![page_id], |row| {
                Ok(IndexRecord {
                    id: row.get(0)?,
                    page_id: row.get(1)?,
                    lemma_id: row.get(2)?,
                    rank: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete_index_by_page(&mut self, page_id: i64) -> StorageResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM search_index WHERE page_id = ?1", params![page_id])?;
        Ok(deleted)
    }

    fn delete_index_by_lemma(&mut self, lemma_id: i64) -> StorageResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM search_index WHERE lemma_id = ?1",
            params![lemma_id],
        )?;
        Ok(deleted)
    }

    fn postings(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<Vec<Posting>> {
        let mut stmt = self.conn.prepare(
            "SELECT si.page_id, l.site_id, si.rank
             FROM search_index si
             JOIN lemmas l ON l.id = si.lemma_id
             WHERE l.lemma = ?1 AND (?2 IS NULL OR l.site_id = ?2)",
        )?;
        let postings = stmt
            .query_map(params![lemma, site_id], |row| {
                Ok(Posting {
                    page_id: row.get(0)?,
                    site_id: row.get(1)?,
                    rank: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(postings)
    }

    // ===== Atomic Units =====

    fn reset_site(&mut self, url: &str, name: &str) -> StorageResult<SiteRecord> {
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row("SELECT id FROM sites WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;
        if let Some(site_id) = existing {
            delete_site_rows(&tx, site_id)?;
        }

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO sites (url, name, status, status_time) VALUES (?1, ?2, ?3, ?4)",
            params![url, name, SiteStatus::Indexing.to_db_string(), now],
        )?;
        let site = fetch_site(&tx, tx.last_insert_rowid())?;

        tx.commit()?;
        Ok(site)
    }

    fn store_page_index(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
        lemmas: &HashMap<String, u32>,
    ) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        let page_id = match find_page_id(&tx, site_id, path)? {
            Some(page_id) => {
                unlink_page(&tx, page_id)?;
                tx.execute(
                    "UPDATE pages SET code = ?1, content = ?2 WHERE id = ?3",
                    params![code, content, page_id],
                )?;
                page_id
            }
            None => {
                tx.execute(
                    "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
                    params![site_id, path, code, content],
                )?;
                tx.last_insert_rowid()
            }
        };

        for (lemma, count) in lemmas {
            tx.execute(
                "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, 1)
                 ON CONFLICT(site_id, lemma) DO UPDATE SET frequency = frequency + 1",
                params![site_id, lemma],
            )?;
            let lemma_id: i64 = tx.query_row(
                "SELECT id FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO search_index (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)",
                params![page_id, lemma_id, f64::from(*count)],
            )?;
        }

        tx.commit()?;
        Ok(page_id)
    }

    fn remove_page(&mut self, site_id: i64, path: &str) -> StorageResult<bool> {
        let tx = self.conn.transaction()?;

        let Some(page_id) = find_page_id(&tx, site_id, path)? else {
            return Ok(false);
        };
        unlink_page(&tx, page_id)?;
        tx.execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;

        tx.commit()?;
        Ok(true)
    }

    fn fail_indexing_sites(&mut self, error: &str) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE status = ?4",
            params![
                SiteStatus::Failed.to_db_string(),
                now,
                error,
                SiteStatus::Indexing.to_db_string()
            ],
        )?;
        Ok(changed)
    }

    fn finish_site(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        error: Option<&str>,
    ) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3
             WHERE id = ?4 AND status = ?5",
            params![
                status.to_db_string(),
                now,
                error,
                site_id,
                SiteStatus::Indexing.to_db_string()
            ],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    fn frequencies(storage: &SqliteStorage, site_id: i64) -> Vec<(String, i64)> {
        storage
            .list_lemmas(site_id)
            .unwrap()
            .into_iter()
            .map(|l| (l.lemma, l.frequency))
            .collect()
    }

    /// (lemma text, rank) pairs of a page, sorted by lemma
    fn page_ranks(storage: &SqliteStorage, page_id: i64) -> Vec<(String, f64)> {
        let mut ranks: Vec<(String, f64)> = storage
            .list_index_by_page(page_id)
            .unwrap()
            .into_iter()
            .map(|r| {
                let lemma: String = storage
                    .conn
                    .query_row(
                        "SELECT lemma FROM lemmas WHERE id = ?1",
                        params![r.lemma_id],
                        |row| row.get(0),
                    )
                    .unwrap();
                (lemma, r.rank)
            })
            .collect();
        ranks.sort_by(|a, b| a.0.cmp(&b.0));
        ranks
    }

    /// Every lemma's frequency equals the number of index rows referencing it
    fn assert_frequencies_consistent(storage: &SqliteStorage, site_id: i64) {
        for lemma in storage.list_lemmas(site_id).unwrap() {
            let rows: i64 = storage
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM search_index WHERE lemma_id = ?1",
                    params![lemma.id],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(lemma.frequency, rows, "lemma {}", lemma.lemma);
            assert!(lemma.frequency > 0);
        }
    }

    fn new_site(storage: &mut SqliteStorage) -> i64 {
        storage
            .reset_site("https://example.com", "Example")
            .unwrap()
            .id
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_reset_site_creates_indexing_site() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = storage.reset_site("https://example.com", "Example").unwrap();

        assert_eq!(site.status, SiteStatus::Indexing);
        assert_eq!(site.name, "Example");
        assert!(site.last_error.is_none());
        assert_eq!(
            storage.get_site_by_url("https://example.com").unwrap().unwrap().id,
            site.id
        );
    }

    #[test]
    fn test_reset_site_discards_previous_data() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let old = new_site(&mut storage);
        storage
            .store_page_index(old, "/", 200, "<p>cat</p>", &counts(&[("cat", 1)]))
            .unwrap();

        let fresh = storage.reset_site("https://example.com", "Renamed").unwrap();

        assert_ne!(fresh.id, old);
        assert_eq!(storage.count_pages(None).unwrap(), 0);
        assert_eq!(storage.count_lemmas(None).unwrap(), 0);
        assert_eq!(storage.list_sites().unwrap().len(), 1);
        assert_eq!(fresh.name, "Renamed");
    }

    #[test]
    fn test_store_page_index_counts_pages_not_occurrences() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);

        storage
            .store_page_index(site, "/a", 200, "a", &counts(&[("cat", 5), ("dog", 1)]))
            .unwrap();
        storage
            .store_page_index(site, "/b", 200, "b", &counts(&[("cat", 2)]))
            .unwrap();

        assert_eq!(
            frequencies(&storage, site),
            vec![("cat".to_string(), 2), ("dog".to_string(), 1)]
        );
        assert_eq!(storage.lemma_page_frequency("cat", Some(site)).unwrap(), 2);
        assert_frequencies_consistent(&storage, site);

        let page = storage.get_page_by_path(site, "/a").unwrap().unwrap();
        let ranks: Vec<f64> = storage
            .list_index_by_page(page.id)
            .unwrap()
            .into_iter()
            .map(|r| r.rank)
            .collect();
        assert_eq!(ranks.iter().sum::<f64>(), 6.0);
    }

    #[test]
    fn test_reindex_with_same_content_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);
        let lemmas = counts(&[("cat", 3), ("dog", 1)]);

        let first = storage
            .store_page_index(site, "/a", 200, "x", &lemmas)
            .unwrap();
        storage
            .store_page_index(site, "/b", 200, "y", &counts(&[("cat", 1)]))
            .unwrap();
        let before = frequencies(&storage, site);
        let index_before = page_ranks(&storage, first);

        let second = storage
            .store_page_index(site, "/a", 200, "x", &lemmas)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(frequencies(&storage, site), before);
        assert_eq!(page_ranks(&storage, second), index_before);
        assert_eq!(storage.count_pages(Some(site)).unwrap(), 2);
        assert_frequencies_consistent(&storage, site);
    }

    #[test]
    fn test_reindex_with_new_content_moves_frequencies() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);

        storage
            .store_page_index(site, "/a", 200, "x", &counts(&[("cat", 1), ("dog", 1)]))
            .unwrap();
        storage
            .store_page_index(site, "/a", 200, "y", &counts(&[("dog", 2), ("fish", 1)]))
            .unwrap();

        assert_eq!(
            frequencies(&storage, site),
            vec![("dog".to_string(), 1), ("fish".to_string(), 1)]
        );
        let page = storage.get_page_by_path(site, "/a").unwrap().unwrap();
        assert_eq!(page.content, "y");
        assert_frequencies_consistent(&storage, site);
    }

    #[test]
    fn test_remove_page_restores_frequencies() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);

        storage
            .store_page_index(site, "/a", 200, "a", &counts(&[("cat", 1)]))
            .unwrap();
        let before = frequencies(&storage, site);

        storage
            .store_page_index(site, "/b", 200, "b", &counts(&[("cat", 4), ("wolf", 2)]))
            .unwrap();
        assert!(storage.remove_page(site, "/b").unwrap());

        assert_eq!(frequencies(&storage, site), before);
        assert!(storage.find_lemma(site, "wolf").unwrap().is_none());
        assert!(!storage.page_exists(site, "/b").unwrap());
        assert_frequencies_consistent(&storage, site);

        assert!(!storage.remove_page(site, "/missing").unwrap());
    }

    #[test]
    fn test_lemmas_are_scoped_per_site() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let one = storage.reset_site("https://one.example", "One").unwrap().id;
        let two = storage.reset_site("https://two.example", "Two").unwrap().id;

        storage
            .store_page_index(one, "/", 200, "", &counts(&[("cat", 1)]))
            .unwrap();
        storage
            .store_page_index(two, "/", 200, "", &counts(&[("cat", 2)]))
            .unwrap();

        assert_eq!(storage.count_lemmas(None).unwrap(), 2);
        assert_eq!(storage.lemma_page_frequency("cat", None).unwrap(), 2);
        assert_eq!(storage.lemma_page_frequency("cat", Some(two)).unwrap(), 1);
        assert_eq!(storage.postings("cat", None).unwrap().len(), 2);

        let postings = storage.postings("cat", Some(two)).unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].site_id, two);
        assert_eq!(postings[0].rank, 2.0);
    }

    #[test]
    fn test_delete_lemma_removes_its_index_rows() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);
        let page = storage
            .store_page_index(site, "/", 200, "", &counts(&[("cat", 1), ("dog", 1)]))
            .unwrap();

        let cat = storage.find_lemma(site, "cat").unwrap().unwrap();
        storage.delete_lemma(cat.id).unwrap();

        assert!(storage.find_lemma(site, "cat").unwrap().is_none());
        assert_eq!(storage.list_index_by_page(page).unwrap().len(), 1);
    }

    #[test]
    fn test_low_level_lemma_and_index_operations() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);
        let page = storage.insert_page(site, "/", 200, "<p>cat</p>").unwrap();

        let lemma = storage.create_lemma(site, "cat", 1).unwrap();
        storage.insert_index(page, lemma, 1.0).unwrap();
        storage.update_lemma_frequency(lemma, 3).unwrap();
        assert_eq!(storage.find_lemma(site, "cat").unwrap().unwrap().frequency, 3);

        assert_eq!(storage.delete_index_by_lemma(lemma).unwrap(), 1);
        storage.insert_index(page, lemma, 2.0).unwrap();
        assert_eq!(storage.delete_index_by_page(page).unwrap(), 1);
        assert!(storage.list_index_by_page(page).unwrap().is_empty());
    }

    #[test]
    fn test_fail_indexing_sites_only_touches_indexing() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let running = storage.reset_site("https://one.example", "One").unwrap().id;
        let done = storage.reset_site("https://two.example", "Two").unwrap().id;
        storage
            .update_site_status(done, SiteStatus::Indexed, None)
            .unwrap();

        assert_eq!(storage.fail_indexing_sites("stopped").unwrap(), 1);

        let failed = storage.get_site(running).unwrap();
        assert_eq!(failed.status, SiteStatus::Failed);
        assert_eq!(failed.last_error.as_deref(), Some("stopped"));
        assert_eq!(storage.get_site(done).unwrap().status, SiteStatus::Indexed);
    }

    #[test]
    fn test_finish_site_does_not_overwrite_failed() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);
        storage.fail_indexing_sites("stopped").unwrap();

        assert!(!storage
            .finish_site(site, SiteStatus::Indexed, None)
            .unwrap());
        assert_eq!(storage.get_site(site).unwrap().status, SiteStatus::Failed);
    }

    #[test]
    fn test_delete_site_cascades() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = new_site(&mut storage);
        storage
            .store_page_index(site, "/", 200, "", &counts(&[("cat", 1)]))
            .unwrap();

        storage.delete_site(site).unwrap();

        assert!(matches!(
            storage.get_site(site),
            Err(StorageError::SiteNotFound(_))
        ));
        assert_eq!(storage.count_pages(None).unwrap(), 0);
        assert_eq!(storage.count_lemmas(None).unwrap(), 0);
    }

    #[test]
    fn test_update_missing_site_is_an_error() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.update_site_status(42, SiteStatus::Indexed, None),
            Err(StorageError::SiteNotFound(_))
        ));
    }

    #[test]
    fn test_file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage.reset_site("https://example.com", "Example").unwrap();
        }

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.list_sites().unwrap().len(), 1);
    }
}
