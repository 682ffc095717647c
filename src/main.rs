//! Sitelex main entry point
//!
//! This is the command-line interface for the Sitelex site search engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sitelex::config::{load_config_with_hash, Config};
use sitelex::output::print_statistics;
use sitelex::{SearchQuery, SearchService};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitelex: a per-site lemma search engine
///
/// Sitelex crawls the configured websites, indexes the lemmas of every page
/// and answers ranked keyword queries with highlighted snippets.
#[derive(Parser, Debug)]
#[command(name = "sitelex")]
#[command(version)]
#[command(about = "A per-site lemma search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and show what would be indexed
    Check,

    /// Index every configured site; Ctrl-C stops the run
    Crawl,

    /// Re-index a single page of a configured site
    IndexPage {
        /// Absolute URL of the page
        url: String,
    },

    /// Search the index
    Search {
        /// Free-text query
        query: String,

        /// Restrict the search to one configured site
        #[arg(long)]
        site: Option<String>,

        /// Number of results to skip
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,

        /// Maximum number of results
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Show index statistics
    Stats {
        /// Print JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Command::Check = cli.command {
        handle_check(&config);
        return Ok(());
    }

    let service = SearchService::open(config).context("failed to open the index database")?;

    match cli.command {
        Command::Check => {}
        Command::Crawl => handle_crawl(&service).await?,
        Command::IndexPage { url } => {
            let response = service.index_page(&url).await;
            print_json(&response)?;
            if !response.result {
                std::process::exit(1);
            }
        }
        Command::Search {
            query,
            site,
            offset,
            limit,
        } => {
            let response = service.search(&SearchQuery {
                query,
                site,
                offset,
                limit,
            });
            print_json(&response)?;
            if !response.result {
                std::process::exit(1);
            }
        }
        Command::Stats { json } => {
            let response = service.statistics();
            match (&response.statistics, json) {
                (Some(statistics), false) => print_statistics(statistics),
                _ => print_json(&response)?,
            }
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitelex=info,warn"),
            1 => EnvFilter::new("sitelex=debug,info"),
            2 => EnvFilter::new("sitelex=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so JSON on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handles `check`: shows the validated configuration
fn handle_check(config: &Config) {
    println!("=== Sitelex Configuration ===\n");

    println!("Crawler:");
    println!("  Sites in parallel: {}", config.crawler.max_concurrent_sites);
    println!("  Pages in flight per site: {}", config.crawler.max_pages_in_flight);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());
    if let Some(referrer) = &config.user_agent.referrer {
        println!("  Referer: {}", referrer);
    }

    println!("\nIndex:");
    println!("  Database: {}", config.storage.database_path);
    println!("  Language: {:?}", config.lemmatizer.language);
    println!(
        "  Selectivity threshold: {} (from {} pages)",
        config.search.selectivity_threshold, config.search.selectivity_min_pages
    );

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles `crawl`: runs a full indexing pass, stopping cleanly on Ctrl-C
async fn handle_crawl(service: &SearchService) -> anyhow::Result<()> {
    let sites = &service.config().sites;
    tracing::info!(
        "Crawling {} site(s): {}",
        sites.len(),
        sites.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
    );
    let mut run = service.begin_indexing()?;

    let summary = tokio::select! {
        joined = &mut run => joined?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping the indexing run");
            let response = service.stop_indexing();
            if let Some(error) = response.error {
                tracing::warn!("Stop request failed: {}", error);
            }
            run.await?
        }
    };

    print_json(&summary)?;
    Ok(())
}
