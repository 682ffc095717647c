use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so operators can tell which configuration a run used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lemma::Language;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
[user-agent]
crawler-name = "SitelexBot"
crawler-version = "0.1"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[[site]]
url = "https://example.com"
name = "Example"
"#;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].name, "Example");
        assert_eq!(config.crawler.max_concurrent_sites, 10);
        assert_eq!(config.search.selectivity_threshold, 0.8);
        assert_eq!(config.lemmatizer.language, Language::Russian);
        assert_eq!(config.storage.database_path, "./sitelex.db");
        assert!(config.user_agent.referrer.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
[crawler]
max-concurrent-sites = 4
max-pages-in-flight = 2
request-timeout-ms = 5000
request-delay-ms = 0
shutdown-grace-ms = 1000

[user-agent]
crawler-name = "SitelexBot"
crawler-version = "0.1"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"
referrer = "https://www.google.com"

[storage]
database-path = "/tmp/index.db"

[lemmatizer]
language = "english"

[search]
selectivity-threshold = 0.5
snippet-length = 120

[[site]]
url = "https://example.com"
name = "Example"

[[site]]
url = "https://docs.example.org/guide"
name = "Guide"
"#;
        let file = create_temp_config(content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_concurrent_sites, 4);
        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.lemmatizer.language, Language::English);
        assert_eq!(config.search.snippet_length, 120);
        assert_eq!(config.search.default_limit, 20);
        assert_eq!(config.sites.len(), 2);
        assert_eq!(
            config.user_agent.referrer.as_deref(),
            Some("https://www.google.com")
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/sitelex.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = MINIMAL.replace("[user-agent]", "[crawler]\nmax-concurrent-sites = 0\n\n[user-agent]");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
