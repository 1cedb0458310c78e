//! Curated fallback source: a static term table mapped onto Heroicons names.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

use crate::config::IconConfig;
use crate::delay::cancellable;
use crate::downloader::looks_like_svg;
use crate::http::{HeaderProfile, HttpClient};
use crate::types::{IconAsset, IconError, IconResult};

const BUILTIN_ENTRIES: &[(&str, &[&str])] = &[
    ("arrow", &["arrow-right", "arrow-left", "arrow-up", "arrow-down"]),
    ("calendar", &["calendar-days", "clock"]),
    ("check", &["check", "check-circle"]),
    ("close", &["x-mark"]),
    ("delete", &["trash"]),
    ("download", &["arrow-down-tray", "cloud-arrow-down"]),
    ("edit", &["pencil", "pencil-square"]),
    ("eye", &["eye", "eye-slash"]),
    ("folder", &["folder", "folder-open"]),
    ("heart", &["heart"]),
    ("home", &["home"]),
    ("info", &["information-circle", "exclamation-circle"]),
    ("lock", &["lock-closed", "lock-open"]),
    ("mail", &["envelope", "at-symbol"]),
    ("menu", &["bars-3"]),
    ("minus", &["minus", "minus-circle"]),
    ("phone", &["phone", "device-phone-mobile"]),
    ("plus", &["plus", "plus-circle"]),
    ("search", &["magnifying-glass"]),
    ("settings", &["cog-6-tooth", "wrench-screwdriver"]),
    ("star", &["star"]),
    ("upload", &["arrow-up-tray", "cloud-arrow-up"]),
    ("user", &["user", "user-circle"]),
];

/// Immutable map from canonical term to ordered icon identifiers.
///
/// Keys are kept sorted, so the substring scan visits them lexicographically.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    entries: BTreeMap<&'static str, &'static [&'static str]>,
}

impl FallbackTable {
    pub fn new(entries: &[(&'static str, &'static [&'static str])]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    /// Process-wide built-in table, constructed on first use.
    pub fn builtin() -> &'static FallbackTable {
        static TABLE: OnceLock<FallbackTable> = OnceLock::new();
        TABLE.get_or_init(|| FallbackTable::new(BUILTIN_ENTRIES))
    }

    pub fn get(&self, term: &str) -> Option<&'static [&'static str]> {
        self.entries.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers for `query`, at most `limit` of them.
    ///
    /// An exact (case-folded) key wins outright. Otherwise every key that
    /// contains the query, or is contained in it, contributes its identifiers,
    /// deduplicated in first-seen order.
    pub fn candidates(&self, query: &str, limit: usize) -> Vec<&'static str> {
        let query = query.to_lowercase();

        let mut ids: Vec<&'static str> = match self.get(&query) {
            Some(exact) => exact.to_vec(),
            None => {
                let mut union = Vec::new();
                for (key, list) in &self.entries {
                    if key.contains(query.as_str()) || query.contains(key) {
                        for id in list.iter() {
                            if !union.contains(id) {
                                union.push(*id);
                            }
                        }
                    }
                }
                union
            }
        };
        ids.truncate(limit);
        ids
    }
}

/// Resolves queries through the fallback table and downloads the matches.
#[derive(Clone)]
pub struct FallbackResolver {
    http: HttpClient,
    table: &'static FallbackTable,
    base_url: String,
    timeout_ms: u64,
}

impl FallbackResolver {
    pub fn new(http: HttpClient, table: &'static FallbackTable, config: &IconConfig) -> Self {
        Self {
            http,
            table,
            base_url: config.fallback_base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.fallback_timeout_ms,
        }
    }

    pub fn asset_url(&self, identifier: &str) -> String {
        format!("{}/{identifier}.svg", self.base_url)
    }

    /// Look up `query` and download every candidate that yields SVG markup.
    pub async fn resolve(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> IconResult<Vec<IconAsset>> {
        tracing::info!("Searching fallback table for {query:?}");
        let ids = self.table.candidates(query, limit);
        if ids.is_empty() {
            return Err(IconError::NotFound(query.to_string()));
        }

        let mut assets = Vec::with_capacity(ids.len());
        for id in &ids {
            let url = self.asset_url(id);
            tracing::debug!("Downloading fallback icon {id} from {url}");
            let sent = cancellable(
                cancel,
                self.http.get(&url, HeaderProfile::Fallback, self.timeout_ms),
            )
            .await?;
            match sent {
                Ok(resp) if !resp.is_success() => {
                    tracing::warn!("Fallback icon {id} returned HTTP {}", resp.status);
                }
                Ok(resp) => {
                    let svg = resp.body.trim();
                    if looks_like_svg(svg) {
                        tracing::info!("Downloaded fallback icon {id}");
                        assets.push(IconAsset {
                            url,
                            svg: svg.to_string(),
                        });
                    } else {
                        tracing::warn!("Fallback icon {id} is not SVG, skipping");
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to download fallback icon {id} from {url}: {e}");
                }
            }
        }

        if assets.is_empty() {
            return Err(IconError::AllDownloadsFailed {
                query: query.to_string(),
                attempted: ids.len(),
            });
        }
        Ok(assets)
    }
}
