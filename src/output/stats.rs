//! Index statistics
//!
//! Totals across the whole index plus one entry per configured site.

use crate::config::SiteEntry;
use crate::state::SiteStatus;
use crate::storage::Storage;
use crate::url::site_base;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Index-wide totals
#[derive(Debug, Clone, Serialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: u64,
    pub lemmas: u64,
    /// True while an indexing run is active
    pub indexing: bool,
}

/// Per-site statistics
///
/// Sites that have never been indexed have no status, time or counts.
#[derive(Debug, Clone, Serialize)]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    pub status: Option<SiteStatus>,
    pub status_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub pages: u64,
    pub lemmas: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

/// Loads statistics for the configured sites
///
/// # Arguments
///
/// * `storage` - The index store to query
/// * `sites` - Configured sites, reported in configuration order
/// * `indexing` - Whether an indexing run is currently active
pub fn load_statistics(
    storage: &dyn Storage,
    sites: &[SiteEntry],
    indexing: bool,
) -> Result<IndexStatistics> {
    let mut detailed = Vec::with_capacity(sites.len());

    for entry in sites {
        let base = site_base(&entry.url)?;
        let stats = match storage.get_site_by_url(&base)? {
            Some(site) => SiteStatistics {
                url: site.url,
                name: entry.name.clone(),
                status: Some(site.status),
                status_time: Some(site.status_time),
                error: site.last_error,
                pages: storage.count_pages(Some(site.id))?,
                lemmas: storage.count_lemmas(Some(site.id))?,
            },
            None => SiteStatistics {
                url: base,
                name: entry.name.clone(),
                status: None,
                status_time: None,
                error: None,
                pages: 0,
                lemmas: 0,
            },
        };
        detailed.push(stats);
    }

    Ok(IndexStatistics {
        total: TotalStatistics {
            sites: sites.len(),
            pages: detailed.iter().map(|s| s.pages).sum(),
            lemmas: detailed.iter().map(|s| s.lemmas).sum(),
            indexing,
        },
        detailed,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total.sites);
    println!("  Pages indexed: {}", stats.total.pages);
    println!("  Lemmas: {}", stats.total.lemmas);
    println!(
        "  Indexing: {}",
        if stats.total.indexing { "running" } else { "idle" }
    );
    println!();

    println!("Sites:");
    for site in &stats.detailed {
        let status = site
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "NOT INDEXED".to_string());
        println!("  {} ({})", site.name, site.url);
        println!("    Status: {}", status);
        if let Some(time) = site.status_time {
            println!("    Updated: {}", time.to_rfc3339());
        }
        println!("    Pages: {}, lemmas: {}", site.pages, site.lemmas);
        if let Some(error) = &site.error {
            println!("    Error: {}", error);
        }
    }
}
