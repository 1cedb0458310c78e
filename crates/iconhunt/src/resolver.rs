//! End-to-end resolution: primary source first, curated fallback second.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::IconConfig;
use crate::delay::{DelayProvider, TokioDelay};
use crate::downloader::AssetDownloader;
use crate::fallback::{FallbackResolver, FallbackTable};
use crate::http::HttpClient;
use crate::primary::PrimarySourceFetcher;
use crate::types::{
    normalize_limit, IconAsset, IconError, IconResult, IconSource, ResolutionResult,
};

enum Stage {
    FetchingPrimary,
    FetchingFallback,
    Done(IconSource, Vec<IconAsset>),
    Failed(IconError),
}

/// Orchestrates one resolution call.
///
/// The two sources never run together. Any primary failure other than
/// cancellation hands over to the fallback, and only the fallback's own
/// failure reaches the caller.
#[derive(Clone)]
pub struct QueryResolver {
    primary: PrimarySourceFetcher,
    fallback: FallbackResolver,
}

impl QueryResolver {
    /// Resolver with real jitter and sleeps.
    pub fn new(config: &IconConfig) -> IconResult<Self> {
        Self::with_delay(config, Arc::new(TokioDelay))
    }

    /// Resolver with an injected delay provider and the built-in table.
    pub fn with_delay(config: &IconConfig, delay: Arc<dyn DelayProvider>) -> IconResult<Self> {
        Self::with_parts(config, delay, FallbackTable::builtin())
    }

    pub fn with_parts(
        config: &IconConfig,
        delay: Arc<dyn DelayProvider>,
        table: &'static FallbackTable,
    ) -> IconResult<Self> {
        let http = HttpClient::new(config);
        let downloader = AssetDownloader::new(http.clone(), delay.clone(), config);
        let primary = PrimarySourceFetcher::new(http.clone(), downloader, delay, config)?;
        let fallback = FallbackResolver::new(http, table, config);
        Ok(Self { primary, fallback })
    }

    /// Resolve `query` to at most `limit` icons (`limit <= 0` means 3).
    pub async fn resolve(
        &self,
        query: &str,
        limit: i64,
        cancel: &CancellationToken,
    ) -> IconResult<ResolutionResult> {
        let limit = normalize_limit(limit);
        let mut stage = Stage::FetchingPrimary;

        loop {
            stage = match stage {
                Stage::FetchingPrimary => match self.primary.fetch(query, limit, cancel).await {
                    Ok(assets) => Stage::Done(IconSource::Primary, assets),
                    Err(e) if e.triggers_fallback() => {
                        tracing::warn!("Primary source failed: {e}");
                        tracing::info!("Falling back to curated icons");
                        Stage::FetchingFallback
                    }
                    Err(e) => Stage::Failed(e),
                },
                Stage::FetchingFallback => match self.fallback.resolve(query, limit, cancel).await {
                    Ok(assets) => Stage::Done(IconSource::Fallback, assets),
                    Err(e) => Stage::Failed(e),
                },
                Stage::Done(source, assets) => {
                    tracing::info!("Resolved {} icon(s) for {query:?} from {source:?}", assets.len());
                    return Ok(ResolutionResult {
                        query: query.to_string(),
                        source,
                        assets,
                    });
                }
                Stage::Failed(e) => return Err(e),
            };
        }
    }
}
