use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info};
use url::Url;

use crate::extract::extract_images;
use crate::models::{ImageCandidate, ScrapeRequest};
use crate::probe::{FetchPage, DEFAULT_FETCH_TIMEOUT};
use crate::ratelimit::RateLimiter;
use crate::score::relevance_score;
use crate::urls::normalize_site_input;

// ── Constants ────────────────────────────────────────────────────────────────

/// Candidate paths in priority order; root is the last resort. Swedish
/// press-page conventions ranked alongside the English ones.
const CANDIDATE_PATHS: &[&str] = &[
    "/press",
    "/media",
    "/nyheter",
    "/news",
    "/about",
    "/om-oss",
    "/pressmaterial",
    "/pressrum",
    "/newsroom",
    "/about-us",
    "",
];

// ── Error taxonomy ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("rate limit exceeded, retry after the window elapses")]
    RateLimited,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

// ── Result type ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Discovery {
    pub site_url: String,
    pub successful_page: Option<String>,
    pub images: Vec<ImageCandidate>,
    /// Deduplicated candidate count before truncation to `max_results`.
    pub total_candidates: usize,
    pub tried_pages: Vec<String>,
    pub failed_pages: Vec<String>,
    pub elapsed_ms: u64,
    pub rate_limit_remaining: u32,
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

/// End-to-end press-image discovery for one site.
///
/// Probes candidate pages sequentially and stops at the first page with any
/// qualifying image; later paths are never attempted. Per-page fetch
/// failures are absorbed into `failed_pages`. Finding nothing at all is a
/// success with empty `images`, not an error.
pub async fn discover<F: FetchPage>(
    request: &ScrapeRequest,
    client_key: &str,
    limiter: &RateLimiter,
    fetcher: &F,
) -> Result<Discovery, DiscoverError> {
    let started = Instant::now();

    let admission = limiter.admit(client_key).await;
    if !admission.allowed {
        return Err(DiscoverError::RateLimited);
    }

    if request.site_url.trim().is_empty() {
        return Err(DiscoverError::BadRequest("siteUrl is required".to_string()));
    }
    let site = normalize_site_input(&request.site_url);
    if Url::parse(&site).is_err() {
        return Err(DiscoverError::BadRequest(format!(
            "siteUrl could not be parsed: {}",
            site
        )));
    }

    let max_results = request.max_results.max(1);
    let mut tried_pages = Vec::new();
    let mut failed_pages = Vec::new();
    let mut successful_page = None;
    let mut working_set: Vec<ImageCandidate> = Vec::new();

    for path in CANDIDATE_PATHS {
        let page_url = format!("{}{}", site, path);
        tried_pages.push(page_url.clone());

        let fetched = fetcher.fetch(&page_url, DEFAULT_FETCH_TIMEOUT).await;
        if fetched.fetch_failed {
            debug!(url = %page_url, status = ?fetched.http_status, "candidate page failed");
            failed_pages.push(page_url);
            continue;
        }

        let candidates = extract_images(&fetched.html_body, &page_url);
        let qualifying: Vec<ImageCandidate> = candidates
            .into_iter()
            .filter(|c| {
                c.width.map_or(true, |w| w >= request.min_width)
                    && c.height.map_or(true, |h| h >= request.min_height)
            })
            .collect();

        if qualifying.is_empty() {
            debug!(url = %page_url, "no qualifying images, trying next path");
            continue;
        }

        info!(url = %page_url, count = qualifying.len(), "found qualifying images");
        for mut candidate in qualifying {
            let score = relevance_score(&candidate, &page_url);
            candidate.relevance_score = score;
            candidate.is_likely_press = score > 0;
            working_set.push(candidate);
        }
        successful_page = Some(page_url);
        break;
    }

    working_set.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

    let mut seen = HashSet::new();
    let deduped: Vec<ImageCandidate> = working_set
        .into_iter()
        .filter(|c| seen.insert(c.source_url.clone()))
        .collect();

    let total_candidates = deduped.len();
    let images: Vec<ImageCandidate> = deduped.into_iter().take(max_results).collect();

    Ok(Discovery {
        site_url: site,
        successful_page,
        images,
        total_candidates,
        tried_pages,
        failed_pages,
        elapsed_ms: started.elapsed().as_millis() as u64,
        rate_limit_remaining: admission.remaining,
    })
}
