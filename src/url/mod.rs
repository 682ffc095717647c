//! URL handling module for Sitelex
//!
//! This module provides URL normalization and the site-scoping rules used by
//! the crawler: which links belong to a site and how a page URL maps to the
//! site-relative path stored in the index.

mod normalize;

use crate::config::SiteEntry;
use crate::{UrlError, UrlResult};
use url::Url;

pub use normalize::normalize_url;

/// Returns the canonical base URL of a site, without a trailing slash
///
/// # Examples
///
/// ```
/// use sitelex::url::site_base;
///
/// assert_eq!(site_base("https://Example.com/").unwrap(), "https://example.com");
/// assert_eq!(site_base("https://example.com/docs/").unwrap(), "https://example.com/docs");
/// ```
pub fn site_base(url_str: &str) -> UrlResult<String> {
    let normalized = normalize_url(url_str)?;
    Ok(normalized.as_str().trim_end_matches('/').to_string())
}

/// Returns true if `url` lies under the site base URL
///
/// The prefix must end on a path boundary, so `https://example.com.evil.org`
/// is not part of `https://example.com`.
pub fn is_in_scope(base: &str, url: &str) -> bool {
    match url.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Maps a page URL to the path stored for it, relative to the site base
///
/// The site root maps to `/`.
pub fn site_relative_path(base: &str, url: &Url) -> UrlResult<String> {
    let url_str = url.as_str();
    if !is_in_scope(base, url_str) {
        return Err(UrlError::OutOfScope {
            url: url_str.to_string(),
            site: base.to_string(),
        });
    }

    let rest = &url_str[base.len()..];
    Ok(if rest.is_empty() {
        "/".to_string()
    } else if rest.starts_with('?') {
        format!("/{}", rest)
    } else {
        rest.to_string()
    })
}

/// Normalizes the URL a fetch ended on and keeps it only if it lies under `base`
///
/// Redirects are followed by the HTTP client, so the final URL may belong to
/// another origin or to another page of the same site.
pub fn landing_url(base: &str, final_url: &str) -> Option<Url> {
    normalize_url(final_url)
        .ok()
        .filter(|url| is_in_scope(base, url.as_str()))
}

/// Finds the configured site owning `url`, preferring the longest base URL
pub fn owning_site<'a>(sites: &'a [SiteEntry], url: &Url) -> Option<(&'a SiteEntry, String)> {
    sites
        .iter()
        .filter_map(|entry| site_base(&entry.url).ok().map(|base| (entry, base)))
        .filter(|(_, base)| is_in_scope(base, url.as_str()))
        .max_by_key(|(_, base)| base.len())
}
