//! Sitelex: a per-site lemma search engine
//!
//! This crate crawls a configured set of websites, builds a per-site inverted index
//! over lemmatized page text, and answers ranked keyword queries against that index.

pub mod config;
pub mod crawler;
pub mod lemma;
pub mod output;
pub mod search;
pub mod service;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sitelex operations
#[derive(Debug, Error)]
pub enum SitelexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Indexing is already running")]
    AlreadyRunning,

    #[error("Indexing is not running")]
    NotRunning,

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Invalid search parameters: {0}")]
    InvalidParameters(String),

    #[error("Search index is not ready yet")]
    IndexNotReady,

    #[error("Page {url} is outside the sites listed in the configuration")]
    OutsideConfiguredSites { url: String },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Indexing stopped by operator")]
    Stopped,

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task error: {0}")]
    Task(String),
}

impl SitelexError {
    /// Returns true for errors the caller can correct (misuse of the run state
    /// machine, bad search input, missing index data, out-of-scope URLs)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning
                | Self::NotRunning
                | Self::EmptyQuery
                | Self::InvalidParameters(_)
                | Self::IndexNotReady
                | Self::OutsideConfiguredSites { .. }
                | Self::Fetch { .. }
                | Self::Stopped
        )
    }

    /// Message suitable for end users
    ///
    /// Internal failures are reported with a generic message so storage and
    /// transport details never leak through the control surface.
    pub fn public_message(&self) -> String {
        if self.is_user_error() {
            self.to_string()
        } else {
            "An internal error occurred, see the server log for details".to_string()
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL {url} is outside site {site}")]
    OutOfScope { url: String, site: String },
}

/// Result type alias for Sitelex operations
pub type Result<T> = std::result::Result<T, SitelexError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use lemma::{Language, Lemmatizer, SnowballLemmatizer};
pub use search::{SearchEngine, SearchQuery, SearchResult, SearchResults};
pub use service::SearchService;
pub use state::SiteStatus;
pub use storage::{SharedStorage, SqliteStorage, Storage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_keep_their_message() {
        let err = SitelexError::AlreadyRunning;
        assert!(err.is_user_error());
        assert_eq!(err.public_message(), "Indexing is already running");
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = SitelexError::Storage(storage::StorageError::LockPoisoned);
        assert!(!err.is_user_error());
        assert!(!err.public_message().contains("poisoned"));
    }
}
