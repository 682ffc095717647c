//! Crawler coordinator - indexing run orchestration
//!
//! This module owns the indexing run lifecycle:
//! - Admitting at most one run (or single-page re-index) at a time
//! - Running one crawl per configured site on a bounded pool
//! - Recording each site's final status
//! - Cooperative stop with a bounded wait for in-flight site tasks

use crate::config::{Config, SiteEntry};
use crate::crawler::context::SiteCrawl;
use crate::crawler::fetcher::{FetchResult, HttpFetcher};
use crate::crawler::indexer::{IndexedPage, PageIndexer};
use crate::crawler::page::{crawl_site, REDIRECTED_OUTSIDE};
use crate::crawler::parser::parse_html;
use crate::lemma::Lemmatizer;
use crate::state::{RunGate, RunTicket, SiteStatus, StopSignal};
use crate::storage::{self, SharedStorage, SiteRecord, Storage};
use crate::url::{landing_url, normalize_url, owning_site, site_base, site_relative_path};
use crate::{Result, SitelexError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use url::Url;

/// Error recorded on sites that were mid-crawl when a stop was requested
pub const STOPPED_BY_OPERATOR: &str = "indexing stopped by operator";

/// How each site of a run ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub indexed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteOutcome {
    Indexed,
    Failed,
    Cancelled,
}

impl RunSummary {
    fn record(&mut self, joined: std::result::Result<SiteOutcome, JoinError>) {
        match joined {
            Ok(SiteOutcome::Indexed) => self.indexed += 1,
            Ok(SiteOutcome::Failed) => self.failed += 1,
            Ok(SiteOutcome::Cancelled) => self.cancelled += 1,
            Err(e) if e.is_cancelled() => self.cancelled += 1,
            Err(e) => {
                tracing::error!("Site task panicked: {}", e);
                self.failed += 1;
            }
        }
    }
}

/// Everything one site task needs, detached from the coordinator
struct SiteJob {
    entry: SiteEntry,
    permits: Arc<Semaphore>,
    stop: Arc<StopSignal>,
    storage: SharedStorage,
    fetcher: Arc<HttpFetcher>,
    indexer: Arc<PageIndexer>,
    max_pages_in_flight: usize,
}

/// Main indexing coordinator
pub struct Coordinator {
    config: Arc<Config>,
    storage: SharedStorage,
    fetcher: Arc<HttpFetcher>,
    indexer: Arc<PageIndexer>,
    gate: Arc<RunGate>,
}

impl Coordinator {
    /// Creates a coordinator; fails only if the HTTP client cannot be built
    pub fn new(
        config: Arc<Config>,
        storage: SharedStorage,
        lemmatizer: Arc<dyn Lemmatizer>,
    ) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent, &config.crawler)?;
        let indexer = PageIndexer::new(storage.clone(), lemmatizer);

        Ok(Self {
            config,
            storage,
            fetcher: Arc::new(fetcher),
            indexer: Arc::new(indexer),
            gate: Arc::new(RunGate::new()),
        })
    }

    /// Returns true while a run or a single-page re-index is active
    pub fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    /// Starts a full indexing run in the background
    ///
    /// Fails with `AlreadyRunning` if a run is active. The handle resolves
    /// once every site task has finished.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<RunSummary>> {
        let ticket = self.gate.try_begin()?;
        let coordinator = self.clone();
        Ok(tokio::spawn(async move { coordinator.run(ticket).await }))
    }

    /// Runs a full indexing run on the current task
    pub async fn run_to_completion(&self) -> Result<RunSummary> {
        let ticket = self.gate.try_begin()?;
        Ok(self.run(ticket).await)
    }

    /// Requests a cooperative stop of the active run
    ///
    /// Every site still INDEXING is failed immediately; returns how many.
    pub fn stop(&self) -> Result<usize> {
        self.gate.request_stop()?;
        let failed = storage::lock(&self.storage)?.fail_indexing_sites(STOPPED_BY_OPERATOR)?;
        tracing::info!("Stop requested, {} site(s) marked as failed", failed);
        Ok(failed)
    }

    async fn run(&self, ticket: RunTicket) -> RunSummary {
        let stop = ticket.signal();
        let sites = &self.config.sites;
        let pool_size = (self.config.crawler.max_concurrent_sites as usize)
            .min(sites.len())
            .max(1);
        let permits = Arc::new(Semaphore::new(pool_size));

        tracing::info!(
            "Starting indexing run over {} site(s), {} in parallel",
            sites.len(),
            pool_size
        );
        let start_time = std::time::Instant::now();

        let mut tasks = JoinSet::new();
        for entry in sites {
            tasks.spawn(index_site(SiteJob {
                entry: entry.clone(),
                permits: permits.clone(),
                stop: stop.clone(),
                storage: self.storage.clone(),
                fetcher: self.fetcher.clone(),
                indexer: self.indexer.clone(),
                max_pages_in_flight: self.config.crawler.max_pages_in_flight as usize,
            }));
        }

        let mut summary = RunSummary::default();
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(joined) => summary.record(joined),
                    None => break,
                },
                _ = stop.stopped() => break,
            }
        }

        if !tasks.is_empty() {
            let grace = Duration::from_millis(self.config.crawler.shutdown_grace_ms);
            tracing::info!(
                "Waiting up to {:?} for {} site task(s) to wind down",
                grace,
                tasks.len()
            );
            let drained = tokio::time::timeout(grace, async {
                while let Some(joined) = tasks.join_next().await {
                    summary.record(joined);
                }
            })
            .await;

            if drained.is_err() {
                tracing::warn!("Grace period elapsed, aborting {} site task(s)", tasks.len());
                tasks.abort_all();
                while let Some(joined) = tasks.join_next().await {
                    summary.record(joined);
                }
            }
        }

        tracing::info!(
            "Indexing run finished in {:.1}s: {} indexed, {} failed, {} cancelled",
            start_time.elapsed().as_secs_f64(),
            summary.indexed,
            summary.failed,
            summary.cancelled
        );

        drop(ticket);
        summary
    }

    /// Re-indexes a single page of a configured site
    ///
    /// Mutually exclusive with a full run. The page's previous data is
    /// replaced on success and removed if the server now answers with an
    /// error or non-HTML content; a transport error leaves it untouched.
    /// Either failure marks the site FAILED and is returned. A stop requested
    /// before the page is stored fails with `Stopped` and stores nothing.
    pub async fn index_page(&self, url: &str) -> Result<IndexedPage> {
        let ticket = self.gate.try_begin()?;
        let stop = ticket.signal();

        let url = normalize_url(url)?;
        let (entry, base) = owning_site(&self.config.sites, &url).ok_or_else(|| {
            SitelexError::OutsideConfiguredSites {
                url: url.to_string(),
            }
        })?;
        let path = site_relative_path(&base, &url)?;

        let site_id = {
            let mut storage = storage::lock(&self.storage)?;
            match storage.get_site_by_url(&base)? {
                Some(site) => {
                    storage.update_site_status(site.id, SiteStatus::Indexing, None)?;
                    site.id
                }
                None => storage.create_site(&base, &entry.name, SiteStatus::Indexing)?,
            }
        };

        tracing::info!("Re-indexing {} (site {})", url, base);
        let target = PageTarget {
            site_id,
            base: &base,
            url: &url,
            path: &path,
        };
        let outcome = self.reindex(&target, &stop).await;

        let (status, error) = match &outcome {
            Ok(_) => (SiteStatus::Indexed, None),
            Err(e) => (SiteStatus::Failed, Some(e.to_string())),
        };
        storage::lock(&self.storage)?.finish_site(site_id, status, error.as_deref())?;

        outcome
    }

    /// Fetches one page again and replaces its stored data
    ///
    /// A redirect to another page of the site stores the page it landed on
    /// and drops the requested path. A stop raised meanwhile leaves the
    /// index untouched.
    async fn reindex(&self, target: &PageTarget<'_>, stop: &StopSignal) -> Result<IndexedPage> {
        let PageTarget {
            site_id,
            base,
            url,
            path,
        } = *target;

        let fetched = self.fetcher.fetch(url).await;
        if stop.is_stopped() {
            return Err(SitelexError::Stopped);
        }

        match fetched {
            FetchResult::Success {
                final_url,
                status_code,
                body,
                ..
            } => {
                let Some(landing) = landing_url(base, &final_url) else {
                    self.drop_page(site_id, url, path)?;
                    return Err(SitelexError::Fetch {
                        url: url.to_string(),
                        reason: format!("{} to {}", REDIRECTED_OUTSIDE, final_url),
                    });
                };

                let landing_path = site_relative_path(base, &landing)?;
                let parsed = parse_html(&body, &landing);
                let indexed = self.indexer.index_document_unless_stopped(
                    stop,
                    site_id,
                    &landing_path,
                    status_code,
                    &body,
                    &parsed.text,
                )?;
                if landing_path != path {
                    tracing::info!("{} redirected to {}", url, landing);
                    self.drop_page(site_id, url, path)?;
                }
                Ok(indexed)
            }
            failure @ (FetchResult::HttpError { .. } | FetchResult::ContentMismatch { .. }) => {
                self.drop_page(site_id, url, path)?;
                Err(SitelexError::Fetch {
                    url: url.to_string(),
                    reason: failure.describe(),
                })
            }
            failure => Err(SitelexError::Fetch {
                url: url.to_string(),
                reason: failure.describe(),
            }),
        }
    }

    fn drop_page(&self, site_id: i64, url: &Url, path: &str) -> Result<()> {
        if self.indexer.remove_document(site_id, path)? {
            tracing::info!("Removed {} from the index", url);
        }
        Ok(())
    }
}

/// The page a single-page re-index works on
#[derive(Clone, Copy)]
struct PageTarget<'a> {
    site_id: i64,
    base: &'a str,
    url: &'a Url,
    path: &'a str,
}

/// Resets the site's stored data and creates its INDEXING row
///
/// Returns None if the run was stopped first. The stop check and the reset
/// happen under one storage lock, so a stop can never miss a freshly reset site.
fn begin_site(job: &SiteJob, base: &str) -> Result<Option<SiteRecord>> {
    let mut storage = storage::lock(&job.storage)?;
    if job.stop.is_stopped() {
        return Ok(None);
    }
    Ok(Some(storage.reset_site(base, &job.entry.name)?))
}

async fn index_site(job: SiteJob) -> SiteOutcome {
    let _permit = match job.permits.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return SiteOutcome::Cancelled,
    };

    let base = match site_base(&job.entry.url) {
        Ok(base) => base,
        Err(e) => {
            tracing::error!("Site {} has an invalid URL: {}", job.entry.url, e);
            return SiteOutcome::Failed;
        }
    };

    let site = match begin_site(&job, &base) {
        Ok(Some(site)) => site,
        Ok(None) => return SiteOutcome::Cancelled,
        Err(e) => {
            tracing::error!("Could not reset site {}: {}", base, e);
            return SiteOutcome::Failed;
        }
    };
    let site_id = site.id;

    let root = match normalize_url(&base) {
        Ok(root) => root,
        Err(e) => {
            finish(&job, site_id, Err(&SitelexError::from(e)));
            return SiteOutcome::Failed;
        }
    };

    tracing::info!("Indexing site {} ({})", job.entry.name, base);
    let ctx = Arc::new(SiteCrawl::new(
        site,
        base.clone(),
        job.stop.clone(),
        job.fetcher.clone(),
        job.indexer.clone(),
        job.max_pages_in_flight,
    ));
    let result = crawl_site(ctx.clone(), root).await;

    if job.stop.is_stopped() {
        tracing::info!("Site {} stopped after {} URL(s)", base, ctx.visited_count());
        return SiteOutcome::Cancelled;
    }

    match result {
        Ok(()) => {
            tracing::info!("Site {} indexed, {} URL(s) visited", base, ctx.visited_count());
            finish(&job, site_id, Ok(()));
            SiteOutcome::Indexed
        }
        Err(e) => {
            tracing::error!("Site {} failed: {}", base, e);
            finish(&job, site_id, Err(&e));
            SiteOutcome::Failed
        }
    }
}

/// Records the final status of a site unless a stop already failed it
fn finish(job: &SiteJob, site_id: i64, result: std::result::Result<(), &SitelexError>) {
    let (status, error) = match result {
        Ok(()) => (SiteStatus::Indexed, None),
        Err(e) => (SiteStatus::Failed, Some(e.to_string())),
    };

    let updated = storage::lock(&job.storage)
        .and_then(|mut storage| storage.finish_site(site_id, status, error.as_deref()));
    if let Err(e) = updated {
        tracing::error!("Could not record status of site {}: {}", site_id, e);
    }
}
