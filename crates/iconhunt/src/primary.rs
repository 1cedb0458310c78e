//! Primary source: scrape a listing page for icon URLs, then download each.
//!
//! The page fetch runs as a small state machine. Attempt 0 is sent right
//! after the initial jitter; every failed attempt moves to `Backoff`, which
//! waits `2^attempt` backoff units before the next request, until the attempt
//! budget is spent. The first HTTP 200 ends the loop.
//!
//! Extraction favours precision: only URLs of the exact shape
//! `<origin>/show/<digits>/<slug>.svg` inside a `src="..."` attribute count.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::IconConfig;
use crate::delay::{cancellable, pause, DelayProvider, JitterRange};
use crate::downloader::{looks_like_svg, AssetDownloader};
use crate::http::{HeaderProfile, HttpClient};
use crate::types::{IconAsset, IconError, IconResult};

const PREVIEW_CHARS: usize = 500;

/// Compiled asset-URL pattern for one origin.
#[derive(Debug, Clone)]
pub struct AssetPattern {
    regex: Regex,
}

impl AssetPattern {
    pub fn new(origin: &str) -> IconResult<Self> {
        let origin = regex::escape(origin.trim_end_matches('/'));
        let regex = Regex::new(&format!(r#"src="({origin}/show/\d+/[^"]+\.svg)""#))
            .map_err(|e| IconError::RequestConstruction(e.to_string()))?;
        Ok(Self { regex })
    }

    /// Up to `limit` matching URLs in document order.
    pub fn extract(&self, html: &str, limit: usize) -> Vec<String> {
        self.regex
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .take(limit)
            .collect()
    }
}

enum PageState {
    Request { attempt: u32 },
    Backoff { attempt: u32, last: IconError },
    Fetched(String),
}

/// Fetches and scrapes the primary listing page.
#[derive(Clone)]
pub struct PrimarySourceFetcher {
    http: HttpClient,
    downloader: AssetDownloader,
    delay: Arc<dyn DelayProvider>,
    pattern: AssetPattern,
    base_url: String,
    page_jitter: JitterRange,
    page_timeout_ms: u64,
    attempts: u32,
    backoff_unit_ms: u64,
}

impl PrimarySourceFetcher {
    pub fn new(
        http: HttpClient,
        downloader: AssetDownloader,
        delay: Arc<dyn DelayProvider>,
        config: &IconConfig,
    ) -> IconResult<Self> {
        Ok(Self {
            http,
            downloader,
            delay,
            pattern: AssetPattern::new(&config.asset_origin)?,
            base_url: config.primary_base_url.clone(),
            page_jitter: config.page_jitter,
            page_timeout_ms: config.page_timeout_ms,
            attempts: config.page_attempts.max(1),
            backoff_unit_ms: config.backoff_unit_ms,
        })
    }

    /// Listing endpoint for `query`, `<base>/vectors/<query>/`.
    pub fn listing_url(&self, query: &str) -> IconResult<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| IconError::RequestConstruction(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| {
                IconError::RequestConstruction(format!("{} cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(["vectors", query, ""]);
        Ok(url.to_string())
    }

    /// Fetch the listing page, retrying transport errors and non-200 answers.
    pub async fn fetch_page(&self, query: &str, cancel: &CancellationToken) -> IconResult<String> {
        let url = self.listing_url(query)?;
        tracing::info!("Fetching primary listing {url}");

        let wait = self.delay.jitter(self.page_jitter);
        tracing::debug!("Page jitter {wait:?}");
        pause(self.delay.as_ref(), wait, cancel).await?;

        let mut state = PageState::Request { attempt: 0 };
        loop {
            state = match state {
                PageState::Request { attempt } => {
                    let sent = cancellable(
                        cancel,
                        self.http.get(&url, HeaderProfile::Page, self.page_timeout_ms),
                    )
                    .await?;
                    match sent {
                        Ok(resp) if resp.status == 200 => {
                            tracing::info!("Listing page fetched on attempt {}", attempt + 1);
                            PageState::Fetched(resp.body)
                        }
                        Ok(resp) => {
                            tracing::warn!(
                                "Attempt {}/{} returned HTTP {}",
                                attempt + 1,
                                self.attempts,
                                resp.status
                            );
                            PageState::Backoff {
                                attempt,
                                last: IconError::Status(resp.status),
                            }
                        }
                        Err(e) if e.is_retryable() => {
                            tracing::warn!("Attempt {}/{} failed: {e}", attempt + 1, self.attempts);
                            PageState::Backoff { attempt, last: e }
                        }
                        Err(e) => return Err(e),
                    }
                }
                PageState::Backoff { attempt, last } => {
                    let next = attempt + 1;
                    if next >= self.attempts {
                        return Err(IconError::RetriesExhausted {
                            attempts: self.attempts,
                            last: Box::new(last),
                        });
                    }
                    let backoff = Duration::from_millis(
                        self.backoff_unit_ms.saturating_mul(1u64 << next.min(32)),
                    );
                    tracing::info!(
                        "Retrying in {backoff:?} (attempt {}/{})",
                        next + 1,
                        self.attempts
                    );
                    pause(self.delay.as_ref(), backoff, cancel).await?;
                    PageState::Request { attempt: next }
                }
                PageState::Fetched(body) => return Ok(body),
            };
        }
    }

    /// Resolve `query` against the primary source.
    ///
    /// Individual download failures are logged and skipped. Fails when the
    /// page never arrived, held no matching URLs, or none of them yielded SVG.
    pub async fn fetch(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> IconResult<Vec<IconAsset>> {
        let page = self.fetch_page(query, cancel).await?;
        let urls = self.pattern.extract(&page, limit);
        tracing::info!("Found {} icon URLs (limit {limit})", urls.len());

        if urls.is_empty() {
            let preview: String = page.chars().take(PREVIEW_CHARS).collect();
            tracing::debug!("Listing page preview: {preview}");
            return Err(IconError::NoMatches(query.to_string()));
        }

        let mut assets = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            match self.downloader.download(url, cancel).await {
                Ok(svg) if looks_like_svg(&svg) => {
                    tracing::info!("Downloaded icon {} ({} bytes)", i + 1, svg.len());
                    assets.push(IconAsset {
                        url: url.clone(),
                        svg,
                    });
                }
                Ok(body) => {
                    tracing::warn!(
                        "Icon {} at {url} is not SVG ({} bytes), skipping",
                        i + 1,
                        body.len()
                    );
                }
                Err(IconError::Cancelled) => return Err(IconError::Cancelled),
                Err(e) => {
                    tracing::warn!("Failed to download icon {} from {url}: {e}", i + 1);
                }
            }
        }

        if assets.is_empty() {
            return Err(IconError::NoUsableAssets {
                query: query.to_string(),
                candidates: urls.len(),
            });
        }
        Ok(assets)
    }
}
