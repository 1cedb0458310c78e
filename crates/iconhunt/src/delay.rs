//! Jitter and sleep, behind a trait so tests never wait on a real clock.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::types::{IconError, IconResult};

/// Half-open millisecond range `[min_ms, max_ms)` for randomized delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl JitterRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Source of jitter values and sleeps.
#[async_trait]
pub trait DelayProvider: Send + Sync {
    /// Pick a delay inside `range`.
    fn jitter(&self, range: JitterRange) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Uniform random jitter and real `tokio` sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl DelayProvider for TokioDelay {
    fn jitter(&self, range: JitterRange) -> Duration {
        if range.max_ms <= range.min_ms {
            return Duration::from_millis(range.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(range.min_ms..range.max_ms))
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic provider: jitter is always the range minimum and sleeps
/// return immediately. Every requested sleep is recorded.
#[derive(Debug, Default)]
pub struct InstantDelay {
    slept: Mutex<Vec<Duration>>,
}

impl InstantDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|slept| slept.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DelayProvider for InstantDelay {
    fn jitter(&self, range: JitterRange) -> Duration {
        Duration::from_millis(range.min_ms)
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}

/// Race `fut` against `cancel`. Cancellation wins ties.
pub async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> IconResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(IconError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Sleep through `delay`, aborting early on cancellation.
pub async fn pause(
    delay: &dyn DelayProvider,
    duration: Duration,
    cancel: &CancellationToken,
) -> IconResult<()> {
    cancellable(cancel, delay.sleep(duration)).await
}
