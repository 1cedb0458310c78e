//! Static configuration shared by every resolution call.

use serde::{Deserialize, Serialize};

use crate::delay::JitterRange;

/// Browser user-agent sent to the primary source.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/120.0.0.0 Safari/537.36";

/// User-agent sent to the fallback source.
pub const GENERIC_USER_AGENT: &str = concat!("iconhunt/", env!("CARGO_PKG_VERSION"));

/// Endpoints, timeouts and pacing for the resolver.
///
/// Built once and read concurrently; nothing mutates it during a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Base of the listing endpoint, `<base>/vectors/<query>/`.
    pub primary_base_url: String,
    /// Origin an extracted asset URL must start with.
    pub asset_origin: String,
    /// Base of the fallback asset template, `<base>/<identifier>.svg`.
    pub fallback_base_url: String,
    pub page_timeout_ms: u64,
    pub asset_timeout_ms: u64,
    pub fallback_timeout_ms: u64,
    /// Total page attempts, including the first.
    pub page_attempts: u32,
    /// Retry `n` waits `2^n` units.
    pub backoff_unit_ms: u64,
    pub page_jitter: JitterRange,
    pub asset_jitter: JitterRange,
    pub user_agent: String,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            primary_base_url: "https://www.svgrepo.com".to_string(),
            asset_origin: "https://www.svgrepo.com".to_string(),
            fallback_base_url:
                "https://raw.githubusercontent.com/tailwindlabs/heroicons/master/src/24/outline"
                    .to_string(),
            page_timeout_ms: 30_000,
            asset_timeout_ms: 15_000,
            fallback_timeout_ms: 10_000,
            page_attempts: 3,
            backoff_unit_ms: 1_000,
            page_jitter: JitterRange::new(500, 2_500),
            asset_jitter: JitterRange::new(200, 1_200),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl IconConfig {
    /// Point every source at one origin, e.g. a local mock server.
    pub fn with_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            primary_base_url: origin.to_string(),
            asset_origin: origin.to_string(),
            fallback_base_url: format!("{origin}/fallback"),
            ..Self::default()
        }
    }

    /// Referer value sent with asset downloads.
    pub fn primary_referer(&self) -> String {
        format!("{}/", self.primary_base_url.trim_end_matches('/'))
    }
}
