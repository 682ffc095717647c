//! Control surface over the indexer and the search engine
//!
//! `SearchService` wires the storage, lemmatizer, coordinator and search
//! engine together and answers every operation with a serializable response.
//! Internal failures are logged in full and reported with a generic message.

use crate::config::Config;
use crate::crawler::{Coordinator, RunSummary};
use crate::lemma::{Lemmatizer, SnowballLemmatizer};
use crate::output::{load_statistics, ApiResponse, SearchResponse, StatisticsResponse};
use crate::search::{SearchEngine, SearchQuery};
use crate::storage::{self, open_storage, SharedStorage};
use crate::{Result, SitelexError};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct SearchService {
    config: Arc<Config>,
    storage: SharedStorage,
    coordinator: Arc<Coordinator>,
    engine: SearchEngine,
}

impl SearchService {
    /// Opens the index database named in the configuration
    pub fn open(config: Config) -> Result<Self> {
        let storage = open_storage(Path::new(&config.storage.database_path))?;
        Self::with_storage(config, storage)
    }

    /// Builds a service over an already opened store
    pub fn with_storage(config: Config, storage: SharedStorage) -> Result<Self> {
        let config = Arc::new(config);
        let lemmatizer: Arc<dyn Lemmatizer> =
            Arc::new(SnowballLemmatizer::new(config.lemmatizer.language));
        let coordinator = Coordinator::new(config.clone(), storage.clone(), lemmatizer.clone())?;
        let engine = SearchEngine::new(storage.clone(), lemmatizer, config.search.clone());

        Ok(Self {
            config,
            storage,
            coordinator: Arc::new(coordinator),
            engine,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a full run and returns a handle that resolves when it ends
    pub fn begin_indexing(&self) -> Result<JoinHandle<RunSummary>> {
        self.coordinator.start()
    }

    /// Starts a full run in the background
    pub fn start_indexing(&self) -> ApiResponse {
        match self.begin_indexing() {
            Ok(_) => ApiResponse::ok(),
            Err(e) => failure("start indexing", e, ApiResponse::failed),
        }
    }

    /// Requests a stop of the active run
    pub fn stop_indexing(&self) -> ApiResponse {
        match self.coordinator.stop() {
            Ok(_) => ApiResponse::ok(),
            Err(e) => failure("stop indexing", e, ApiResponse::failed),
        }
    }

    pub fn is_indexing(&self) -> bool {
        self.coordinator.is_running()
    }

    /// Re-indexes one page of a configured site
    pub async fn index_page(&self, url: &str) -> ApiResponse {
        match self.coordinator.index_page(url).await {
            Ok(page) => {
                tracing::info!("Indexed {} with {} distinct lemma(s)", url, page.lemmas);
                ApiResponse::ok()
            }
            Err(e) => failure("index page", e, ApiResponse::failed),
        }
    }

    pub fn search(&self, query: &SearchQuery) -> SearchResponse {
        match self.engine.search(query) {
            Ok(results) => SearchResponse {
                result: true,
                count: Some(results.count),
                data: Some(results.data),
                error: None,
            },
            Err(e) => failure("search", e, SearchResponse::failed),
        }
    }

    pub fn statistics(&self) -> StatisticsResponse {
        match self.collect_statistics() {
            Ok(statistics) => StatisticsResponse {
                result: true,
                statistics: Some(statistics),
                error: None,
            },
            Err(e) => failure("collect statistics", e, StatisticsResponse::failed),
        }
    }

    fn collect_statistics(&self) -> Result<crate::output::IndexStatistics> {
        let indexing = self.is_indexing();
        let storage = storage::lock(&self.storage)?;
        load_statistics(&*storage, &self.config.sites, indexing)
    }
}

/// Logs a failed operation and converts it to a response
fn failure<T>(operation: &str, error: SitelexError, respond: fn(&SitelexError) -> T) -> T {
    if error.is_user_error() {
        tracing::info!("Could not {}: {}", operation, error);
    } else {
        tracing::error!("Could not {}: {}", operation, error);
    }
    respond(&error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::storage::SqliteStorage;
    use std::sync::Mutex;

    fn service() -> SearchService {
        let config = parse_config(
            r#"
[user-agent]
crawler-name = "SitelexBot"
crawler-version = "0.1"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[lemmatizer]
language = "english"

[[site]]
url = "http://127.0.0.1:9"
name = "Local"
"#,
        )
        .unwrap();
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        SearchService::with_storage(config, storage).unwrap()
    }

    #[test]
    fn test_search_on_empty_index_reports_not_ready() {
        let response = service().search(&SearchQuery::new("cat"));
        assert!(!response.result);
        assert_eq!(response.error.as_deref(), Some("Search index is not ready yet"));
    }

    #[test]
    fn test_stop_without_run_fails() {
        let service = service();
        let response = service.stop_indexing();
        assert!(!response.result);
        assert!(!service.is_indexing());
    }

    #[test]
    fn test_statistics_list_unindexed_site() {
        let response = service().statistics();
        assert!(response.result);
        let statistics = response.statistics.unwrap();
        assert_eq!(statistics.total.sites, 1);
        assert!(statistics.detailed[0].status.is_none());
    }

    #[tokio::test]
    async fn test_index_page_outside_sites_fails() {
        let response = service().index_page("https://elsewhere.example/").await;
        assert!(!response.result);
        assert!(response.error.unwrap().contains("outside the sites"));
    }
}
