//! Page crawler
//!
//! Depth-first crawl of one site. Every page is a task: it checks the stop
//! signal, the visited set and the store, fetches and indexes the page, then
//! spawns one child task per in-scope link and waits for all of them.

use crate::crawler::context::SiteCrawl;
use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::parse_html;
use crate::url::{is_in_scope, landing_url, normalize_url, site_relative_path};
use crate::{Result, SitelexError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Reason recorded when a fetch ends on another origin or outside the site base
pub(crate) const REDIRECTED_OUTSIDE: &str = "redirected outside the site";

type CrawlFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Outcome of visiting one URL
#[derive(Debug)]
pub(crate) enum Visit {
    /// Stopped, already visited, or already stored; nothing was done
    Skipped,
    /// Page stored; carries the in-scope links found on it
    Indexed(Vec<Url>),
    /// Fetch failed; nothing was stored
    Unavailable(String),
}

/// Crawls a site from its root page
///
/// An unavailable root page fails the whole site, since nothing below it
/// can be reached.
pub(crate) async fn crawl_site(ctx: Arc<SiteCrawl>, root: Url) -> Result<()> {
    match visit(&ctx, &root).await? {
        Visit::Indexed(links) => crawl_links(ctx, links).await,
        Visit::Skipped => Ok(()),
        Visit::Unavailable(reason) => Err(SitelexError::Fetch {
            url: root.to_string(),
            reason: format!("site root page unavailable: {}", reason),
        }),
    }
}

fn crawl_page(ctx: Arc<SiteCrawl>, url: Url) -> CrawlFuture {
    Box::pin(async move {
        match visit(&ctx, &url).await? {
            Visit::Indexed(links) => crawl_links(ctx, links).await,
            Visit::Skipped | Visit::Unavailable(_) => Ok(()),
        }
    })
}

/// Spawns a task per link and waits for every one of them
///
/// Returns the first error raised in the subtree, after all children finished.
async fn crawl_links(ctx: Arc<SiteCrawl>, links: Vec<Url>) -> Result<()> {
    if ctx.stop.is_stopped() {
        return Ok(());
    }

    let mut children = JoinSet::new();
    for link in links {
        if ctx.is_visited(link.as_str()) {
            continue;
        }
        children.spawn(crawl_page(ctx.clone(), link));
    }

    let mut first_error = None;
    while let Some(joined) = children.join_next().await {
        let outcome = joined
            .map_err(|e| SitelexError::Task(e.to_string()))
            .and_then(|result| result);
        if let Err(e) = outcome {
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    first_error.map_or(Ok(()), Err)
}

/// Fetches, indexes and extracts links from one URL
///
/// Fetch failures are logged and reported as `Unavailable`; storage errors
/// propagate.
pub(crate) async fn visit(ctx: &SiteCrawl, url: &Url) -> Result<Visit> {
    if ctx.stop.is_stopped() || !ctx.mark_visited(url.as_str()) {
        return Ok(Visit::Skipped);
    }

    let path = site_relative_path(&ctx.base, url)?;
    if ctx.indexer.page_exists(ctx.site.id, &path)? {
        tracing::debug!("Page {} already stored, skipping", url);
        return Ok(Visit::Skipped);
    }

    let _permit = ctx
        .fetch_permits
        .acquire()
        .await
        .map_err(|e| SitelexError::Task(e.to_string()))?;
    if ctx.stop.is_stopped() {
        return Ok(Visit::Skipped);
    }

    tracing::debug!("Fetching {}", url);
    let (final_url, status_code, body) = match ctx.fetcher.fetch(url).await {
        FetchResult::Success {
            final_url,
            status_code,
            body,
            ..
        } => (final_url, status_code, body),
        failure => {
            let reason = failure.describe();
            tracing::warn!("Skipping {}: {}", url, reason);
            return Ok(Visit::Unavailable(reason));
        }
    };

    let Some(landing) = landing_url(&ctx.base, &final_url) else {
        tracing::warn!("Skipping {}: redirected outside the site to {}", url, final_url);
        return Ok(Visit::Unavailable(REDIRECTED_OUTSIDE.to_string()));
    };

    // A redirect inside the site is stored under the page it landed on
    let path = if landing == *url {
        path
    } else {
        if !ctx.mark_visited(landing.as_str()) {
            tracing::debug!("{} redirected to already visited {}", url, landing);
            return Ok(Visit::Skipped);
        }
        let landing_path = site_relative_path(&ctx.base, &landing)?;
        if ctx.indexer.page_exists(ctx.site.id, &landing_path)? {
            return Ok(Visit::Skipped);
        }
        landing_path
    };

    let parsed = parse_html(&body, &landing);
    ctx.indexer
        .index_document(ctx.site.id, &path, status_code, &body, &parsed.text)?;

    let links = parsed
        .links
        .iter()
        .filter_map(|link| normalize_url(link).ok())
        .filter(|link| is_in_scope(&ctx.base, link.as_str()))
        .collect();

    Ok(Visit::Indexed(links))
}
