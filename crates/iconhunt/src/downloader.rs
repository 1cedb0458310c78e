//! Single-asset download with its own short timeout and jitter.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::IconConfig;
use crate::delay::{cancellable, pause, DelayProvider, JitterRange};
use crate::http::{HeaderProfile, HttpClient};
use crate::types::{IconError, IconResult};

/// Marker every plausible SVG document contains.
pub const SVG_ROOT_MARKER: &str = "<svg";

/// Heuristic check that `body` is SVG markup rather than an error page.
pub fn looks_like_svg(body: &str) -> bool {
    body.contains(SVG_ROOT_MARKER)
}

/// Fetches raw content at one URL.
///
/// The HTTP status is not inspected: a 404 page comes back as its body text.
/// Only transport-level problems (bad URL, DNS, refused connection, timeout)
/// are errors, and all of them surface as [`IconError::Transport`].
#[derive(Clone)]
pub struct AssetDownloader {
    http: HttpClient,
    delay: Arc<dyn DelayProvider>,
    jitter: JitterRange,
    timeout_ms: u64,
}

impl AssetDownloader {
    pub fn new(http: HttpClient, delay: Arc<dyn DelayProvider>, config: &IconConfig) -> Self {
        Self {
            http,
            delay,
            jitter: config.asset_jitter,
            timeout_ms: config.asset_timeout_ms,
        }
    }

    /// Download `url` and return the trimmed body text.
    pub async fn download(&self, url: &str, cancel: &CancellationToken) -> IconResult<String> {
        let wait = self.delay.jitter(self.jitter);
        tracing::debug!("Asset jitter {wait:?} before {url}");
        pause(self.delay.as_ref(), wait, cancel).await?;

        let resp = cancellable(
            cancel,
            self.http.get(url, HeaderProfile::Asset, self.timeout_ms),
        )
        .await?
        .map_err(|e| match e {
            IconError::RequestConstruction(msg) => IconError::Transport(msg),
            other => other,
        })?;

        if !resp.is_success() {
            tracing::debug!("Asset {url} answered HTTP {}, returning body", resp.status);
        }
        Ok(resp.body.trim().to_string())
    }
}
