//! Iconhunt — resolve a free-text query to SVG icon markup.
//!
//! A scraped primary source is tried first, with jittered pacing and
//! exponential backoff. When it yields nothing usable, a curated table of
//! icon names is consulted instead.

pub mod config;
pub mod delay;
pub mod downloader;
pub mod fallback;
pub mod http;
pub mod primary;
pub mod resolver;
pub mod types;

pub use config::IconConfig;
pub use delay::{DelayProvider, InstantDelay, JitterRange, TokioDelay};
pub use downloader::{looks_like_svg, AssetDownloader};
pub use fallback::{FallbackResolver, FallbackTable};
pub use primary::{AssetPattern, PrimarySourceFetcher};
pub use resolver::QueryResolver;
pub use types::*;

pub use tokio_util::sync::CancellationToken;
