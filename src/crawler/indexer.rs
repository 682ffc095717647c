//! Index builder
//!
//! Lemmatizes the text of a fetched page and hands the counts to the store,
//! which applies the page update as one atomic unit.

use crate::lemma::{count_lemmas, Lemmatizer};
use crate::storage::{self, SharedStorage, Storage};
use crate::state::StopSignal;
use crate::{Result, SitelexError};
use std::sync::Arc;

/// Outcome of indexing one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedPage {
    pub page_id: i64,
    /// Number of distinct lemmas recorded for the page
    pub lemmas: usize,
}

/// Lemmatize-and-persist step shared by the crawler and single-page re-index
pub struct PageIndexer {
    storage: SharedStorage,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl PageIndexer {
    pub fn new(storage: SharedStorage, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self {
            storage,
            lemmatizer,
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Indexes (or re-indexes) a page
    ///
    /// `content` is stored as the raw page; `text` is what gets lemmatized.
    pub fn index_document(
        &self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
        text: &str,
    ) -> Result<IndexedPage> {
        self.store(site_id, path, code, content, text, None)
    }

    /// Indexes a page unless `stop` has been raised
    ///
    /// The stop check and the write happen under one storage lock, so a page
    /// is never stored after the stop has failed its site.
    pub fn index_document_unless_stopped(
        &self,
        stop: &StopSignal,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
        text: &str,
    ) -> Result<IndexedPage> {
        self.store(site_id, path, code, content, text, Some(stop))
    }

    fn store(
        &self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
        text: &str,
        stop: Option<&StopSignal>,
    ) -> Result<IndexedPage> {
        let lemmas = count_lemmas(text, self.lemmatizer.as_ref());
        let page_id = {
            let mut storage = storage::lock(&self.storage)?;
            if stop.is_some_and(|stop| stop.is_stopped()) {
                return Err(SitelexError::Stopped);
            }
            storage.store_page_index(site_id, path, code, content, &lemmas)?
        };

        tracing::debug!(
            "Indexed page {} of site {} with {} lemmas",
            path,
            site_id,
            lemmas.len()
        );

        Ok(IndexedPage {
            page_id,
            lemmas: lemmas.len(),
        })
    }

    /// Removes a page and its index rows; returns false if it was not stored
    pub fn remove_document(&self, site_id: i64, path: &str) -> Result<bool> {
        Ok(storage::lock(&self.storage)?.remove_page(site_id, path)?)
    }

    pub fn page_exists(&self, site_id: i64, path: &str) -> Result<bool> {
        Ok(storage::lock(&self.storage)?.page_exists(site_id, path)?)
    }
}
