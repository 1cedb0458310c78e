//! Core data types for icon resolution.

use serde::{Deserialize, Serialize};

/// Limit used when the caller asks for zero or a negative number of icons.
pub const DEFAULT_LIMIT: usize = 3;

/// Normalize a caller-supplied limit. Values `<= 0` become [`DEFAULT_LIMIT`].
pub fn normalize_limit(limit: i64) -> usize {
    if limit <= 0 {
        DEFAULT_LIMIT
    } else {
        usize::try_from(limit).unwrap_or(usize::MAX)
    }
}

/// Which source produced a set of icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSource {
    /// Scraped from the primary listing page.
    Primary,
    /// Looked up in the curated fallback table.
    Fallback,
}

/// A single retrieved icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconAsset {
    /// URL the markup was downloaded from.
    pub url: String,
    /// Trimmed SVG markup.
    pub svg: String,
}

/// Ordered outcome of one resolution call.
///
/// Assets appear in discovery order: page document order for the primary
/// source, table order for the fallback. Failed downloads leave no gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub query: String,
    pub source: IconSource,
    pub assets: Vec<IconAsset>,
}

impl ResolutionResult {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Markup strings in result order.
    pub fn svgs(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.svg.as_str()).collect()
    }
}

/// Errors that can occur while resolving icons.
#[derive(thiserror::Error, Debug)]
pub enum IconError {
    #[error("Request construction error: {0}")]
    RequestConstruction(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status error: {0}")]
    Status(u16),

    #[error("Primary source failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<IconError> },

    #[error("No icon URLs found on results page for {0:?}")]
    NoMatches(String),

    #[error("None of {candidates} candidate icons could be retrieved for {query:?}")]
    NoUsableAssets { query: String, candidates: usize },

    #[error("No matching icons found for query: {0:?}")]
    NotFound(String),

    #[error("Failed to download any fallback icons for {query:?} ({attempted} attempted)")]
    AllDownloadsFailed { query: String, attempted: usize },

    #[error("Resolution cancelled")]
    Cancelled,
}

impl IconError {
    /// Classify a reqwest failure. Builder errors (bad URL, bad header)
    /// are construction errors; everything else is transport.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            IconError::RequestConstruction(err.to_string())
        } else {
            IconError::Transport(err.to_string())
        }
    }

    /// Whether a primary-source failure should hand over to the fallback.
    pub fn triggers_fallback(&self) -> bool {
        !matches!(self, IconError::Cancelled)
    }

    /// Whether a page attempt that failed this way may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IconError::Transport(_) | IconError::Status(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, IconError::Transport(_))
    }
}

/// Convenience result type.
pub type IconResult<T> = Result<T, IconError>;
