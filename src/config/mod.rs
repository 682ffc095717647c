//! Configuration module for Sitelex
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitelex::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitelex.toml")).unwrap();
//! println!("Indexing {} sites", config.sites.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, LemmatizerConfig, SearchConfig, SiteEntry, StorageConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
