use crate::lemma::Language;
use serde::Deserialize;

/// Main configuration structure for Sitelex
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub lemmatizer: LemmatizerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Upper bound on sites crawled in parallel
    #[serde(rename = "max-concurrent-sites")]
    pub max_concurrent_sites: u32,

    /// Maximum number of in-flight page fetches per site
    #[serde(rename = "max-pages-in-flight")]
    pub max_pages_in_flight: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Pause before each fetch (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// How long a stopped run waits for site tasks before aborting them (milliseconds)
    #[serde(rename = "shutdown-grace-ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sites: 10,
            max_pages_in_flight: 8,
            request_timeout_ms: 10_000,
            request_delay_ms: 500,
            shutdown_grace_ms: 60_000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Referer header sent with every request
    #[serde(default)]
    pub referrer: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Index store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./sitelex.db".to_string(),
        }
    }
}

/// Lemmatizer configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LemmatizerConfig {
    /// Natural language whose alphabet and morphology are indexed
    pub language: Language,
}

/// Search behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Share of pages above which a lemma is too common to be used for matching
    #[serde(rename = "selectivity-threshold")]
    pub selectivity_threshold: f64,

    /// Minimum number of pages in the search scope before the threshold applies
    #[serde(rename = "selectivity-min-pages")]
    pub selectivity_min_pages: u64,

    /// Maximum snippet length in characters
    #[serde(rename = "snippet-length")]
    pub snippet_length: usize,

    /// Page size used when the caller gives no limit
    #[serde(rename = "default-limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            selectivity_threshold: 0.8,
            selectivity_min_pages: 2,
            snippet_length: 240,
            default_limit: 20,
        }
    }
}

/// A site to crawl and index
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Base URL; every page under it belongs to the site
    pub url: String,

    /// Human-readable site name
    pub name: String,
}
