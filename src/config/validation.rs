use crate::config::types::{
    Config, CrawlerConfig, SearchConfig, SiteEntry, StorageConfig, UserAgentConfig,
};
use crate::url::site_base;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_search_config(&config.search)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_sites < 1 || config.max_concurrent_sites > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sites must be between 1 and 100, got {}",
            config.max_concurrent_sites
        )));
    }

    if config.max_pages_in_flight < 1 || config.max_pages_in_flight > 100 {
        return Err(ConfigError::Validation(format!(
            "max_pages_in_flight must be between 1 and 100, got {}",
            config.max_pages_in_flight
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if let Some(referrer) = &config.referrer {
        Url::parse(referrer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referrer: {}", e)))?;
    }

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if !(config.selectivity_threshold > 0.0 && config.selectivity_threshold <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "selectivity_threshold must be in (0, 1], got {}",
            config.selectivity_threshold
        )));
    }

    if config.snippet_length < 40 {
        return Err(ConfigError::Validation(format!(
            "snippet_length must be >= 40, got {}",
            config.snippet_length
        )));
    }

    if config.default_limit == 0 {
        return Err(ConfigError::Validation(
            "default_limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the configured site list
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in sites {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a name",
                entry.url
            )));
        }

        let base = site_base(&entry.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", entry.url, e))
        })?;

        if !seen.insert(base.clone()) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' is listed more than once",
                base
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let (local, domain) = email.split_once('@').ok_or_else(|| {
        ConfigError::Validation(format!("Invalid email format: '{}'", email))
    })?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
