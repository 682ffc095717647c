//! Ranked retrieval over the lemma index
//!
//! # Algorithm
//!
//! 1. Validate the query and pagination parameters
//! 2. Lemmatize the query the same way pages are indexed
//! 3. Drop lemmas present on too large a share of the pages in scope
//! 4. Intersect posting lists from the rarest lemma to the most common one
//! 5. Score each page by the sum of its ranks, relative to the best page
//! 6. Sort, paginate, and render titles and snippets for the returned slice

use crate::config::SearchConfig;
use crate::crawler::extract_content;
use crate::lemma::{find_lemma_matches, query_lemmas, Lemmatizer};
use crate::search::snippet::build_snippet;
use crate::search::{SearchQuery, SearchResult, SearchResults};
use crate::storage::{self, PageRecord, SharedStorage, SiteRecord, Storage};
use crate::url::site_base;
use crate::{Result, SitelexError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Characters of page text used as a title when the page has none
const TITLE_FALLBACK_CHARS: usize = 80;

/// A page that matched every selective query lemma
#[derive(Debug, Clone, Copy)]
struct Candidate {
    page_id: i64,
    site_id: i64,
    absolute: f64,
}

pub struct SearchEngine {
    storage: SharedStorage,
    lemmatizer: Arc<dyn Lemmatizer>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(storage: SharedStorage, lemmatizer: Arc<dyn Lemmatizer>, config: SearchConfig) -> Self {
        Self {
            storage,
            lemmatizer,
            config,
        }
    }

    /// Answers a query with ranked, paginated results
    ///
    /// # Errors
    ///
    /// * `EmptyQuery` - the query is blank
    /// * `InvalidParameters` - negative offset or non-positive limit
    /// * `IndexNotReady` - no pages are indexed in the requested scope
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        if query.query.trim().is_empty() {
            return Err(SitelexError::EmptyQuery);
        }
        if query.offset < 0 {
            return Err(SitelexError::InvalidParameters(format!(
                "offset must not be negative, got {}",
                query.offset
            )));
        }
        let limit = query.limit.unwrap_or(self.config.default_limit as i64);
        if limit <= 0 {
            return Err(SitelexError::InvalidParameters(format!(
                "limit must be positive, got {}",
                limit
            )));
        }

        let lemmas = query_lemmas(&query.query, self.lemmatizer.as_ref());

        // Every read of one search happens under one lock
        let (total, page) = {
            let storage = storage::lock(&self.storage)?;

            let site_id = match &query.site {
                Some(site) => Some(resolve_site(&*storage, site)?),
                None => None,
            };
            let total_pages = storage.count_pages(site_id)?;
            if total_pages == 0 {
                return Err(SitelexError::IndexNotReady);
            }

            let selective = self.selective_lemmas(&*storage, &lemmas, site_id, total_pages)?;
            if selective.is_empty() {
                tracing::debug!("Query '{}' has no selective lemmas", query.query);
                return Ok(SearchResults::default());
            }

            let mut candidates = intersect(&*storage, &selective, site_id)?;
            rank(&mut candidates);

            let total = candidates.len();
            let records = candidates
                .into_iter()
                .skip(query.offset as usize)
                .take(limit as usize)
                .map(|candidate| load_records(&*storage, candidate))
                .collect::<Result<Vec<_>>>()?;
            (total, records)
        };

        let matched: HashSet<String> = lemmas.into_iter().collect();
        let data = page
            .into_iter()
            .map(|(relevance, page, site)| self.render(relevance, &page, &site, &matched))
            .collect();

        Ok(SearchResults { count: total, data })
    }

    /// Keeps lemmas that discriminate between pages, ordered rarest first
    ///
    /// The share threshold applies only once the scope holds at least
    /// `selectivity_min_pages` pages. Returns no lemmas if any query lemma
    /// appears on no page at all, since the intersection would be empty.
    fn selective_lemmas(
        &self,
        storage: &dyn Storage,
        lemmas: &[String],
        site_id: Option<i64>,
        total_pages: u64,
    ) -> Result<Vec<(String, u64)>> {
        let ceiling = self.config.selectivity_threshold * total_pages as f64;
        let apply_threshold = total_pages >= self.config.selectivity_min_pages;

        let mut selective = Vec::with_capacity(lemmas.len());
        for lemma in lemmas {
            let pages = storage.lemma_page_frequency(lemma, site_id)?;
            if pages == 0 {
                return Ok(Vec::new());
            }
            if apply_threshold && pages as f64 > ceiling {
                tracing::debug!(
                    "Dropping lemma '{}' present on {} of {} pages",
                    lemma,
                    pages,
                    total_pages
                );
                continue;
            }
            selective.push((lemma.clone(), pages));
        }

        selective.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(selective)
    }

    fn render(
        &self,
        relevance: f64,
        page: &PageRecord,
        site: &SiteRecord,
        lemmas: &HashSet<String>,
    ) -> SearchResult {
        let content = extract_content(&page.content);
        let matches = find_lemma_matches(&content.text, lemmas, self.lemmatizer.as_ref());

        SearchResult {
            site: site.url.clone(),
            site_name: site.name.clone(),
            uri: page.path.clone(),
            title: content
                .display_title(TITLE_FALLBACK_CHARS)
                .unwrap_or_else(|| page.path.clone()),
            snippet: build_snippet(&content.text, &matches, self.config.snippet_length),
            relevance,
        }
    }
}

/// Maps a site filter to a site ID; unknown sites have no index yet
fn resolve_site(storage: &dyn Storage, site: &str) -> Result<i64> {
    let base = site_base(site).map_err(|e| {
        SitelexError::InvalidParameters(format!("invalid site filter '{}': {}", site, e))
    })?;
    storage
        .get_site_by_url(&base)?
        .map(|site| site.id)
        .ok_or(SitelexError::IndexNotReady)
}

/// Intersects posting lists in the given order, summing ranks
fn intersect(
    storage: &dyn Storage,
    lemmas: &[(String, u64)],
    site_id: Option<i64>,
) -> Result<Vec<Candidate>> {
    let mut candidates: HashMap<i64, Candidate> = HashMap::new();

    for (i, (lemma, _)) in lemmas.iter().enumerate() {
        let postings = storage.postings(lemma, site_id)?;
        if i == 0 {
            candidates = postings
                .into_iter()
                .map(|p| {
                    (
                        p.page_id,
                        Candidate {
                            page_id: p.page_id,
                            site_id: p.site_id,
                            absolute: p.rank,
                        },
                    )
                })
                .collect();
        } else {
            let ranks: HashMap<i64, f64> =
                postings.into_iter().map(|p| (p.page_id, p.rank)).collect();
            candidates.retain(|page_id, candidate| match ranks.get(page_id) {
                Some(rank) => {
                    candidate.absolute += rank;
                    true
                }
                None => false,
            });
        }

        if candidates.is_empty() {
            break;
        }
    }

    Ok(candidates.into_values().collect())
}

/// Converts absolute scores to relative relevance and sorts best first
fn rank(candidates: &mut [Candidate]) {
    let max = candidates
        .iter()
        .map(|c| c.absolute)
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        for candidate in candidates.iter_mut() {
            candidate.absolute /= max;
        }
    }
    candidates.sort_by(|a, b| {
        b.absolute
            .total_cmp(&a.absolute)
            .then_with(|| a.page_id.cmp(&b.page_id))
    });
}

fn load_records(storage: &dyn Storage, candidate: Candidate) -> Result<(f64, PageRecord, SiteRecord)> {
    let page = storage.get_page(candidate.page_id)?;
    let site = storage.get_site(candidate.site_id)?;
    Ok((candidate.absolute, page, site))
}
