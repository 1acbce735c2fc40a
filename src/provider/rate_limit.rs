//! Rate-limit quota tracking and back-off

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default remaining-request threshold below which callers pause
pub const DEFAULT_MIN_REMAINING: u64 = 10;

/// Default safety margin added on top of the reset wait
pub const DEFAULT_MARGIN: Duration = Duration::from_secs(1);

/// Quota information attached to a provider reply.
///
/// Either field may be missing (no headers, or a provider without quotas),
/// in which case no back-off happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: Option<u64>,
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimit {
    pub fn new(remaining: u64, reset: DateTime<Utc>) -> Self {
        Self {
            remaining: Some(remaining),
            reset: Some(reset),
        }
    }

    /// Parse raw header values: remaining count and reset time in epoch seconds.
    /// Unparseable values are treated as absent.
    pub fn from_headers(remaining: Option<&str>, reset: Option<&str>) -> Self {
        let remaining = remaining.and_then(|v| v.trim().parse::<u64>().ok());
        let reset = reset
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        Self { remaining, reset }
    }
}

type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Pauses the calling thread when a reply shows the quota nearly exhausted.
///
/// Each caller sleeps on its own; there is no shared pause across workers.
#[derive(Clone)]
pub struct Backoff {
    min_remaining: u64,
    margin: Duration,
    sleeper: Sleeper,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REMAINING, DEFAULT_MARGIN)
    }
}

impl std::fmt::Debug for Backoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoff")
            .field("min_remaining", &self.min_remaining)
            .field("margin", &self.margin)
            .finish()
    }
}

impl Backoff {
    pub fn new(min_remaining: u64, margin: Duration) -> Self {
        Self {
            min_remaining,
            margin,
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    /// Replace the sleep function (tests record waits instead of blocking)
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn min_remaining(&self) -> u64 {
        self.min_remaining
    }

    /// How long to pause given `rate` observed at `now`, if at all.
    pub fn delay(&self, rate: &RateLimit, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = rate.remaining?;
        if remaining >= self.min_remaining {
            return None;
        }
        let until_reset = rate.reset?.signed_duration_since(now).to_std().ok()?;
        Some(until_reset + self.margin)
    }

    /// Sleep the current thread if the quota is nearly exhausted.
    /// Returns the duration slept.
    pub fn wait(&self, rate: &RateLimit) -> Option<Duration> {
        let delay = self.delay(rate, Utc::now())?;
        warn!(
            remaining = rate.remaining,
            wait_secs = delay.as_secs(),
            "rate limit nearly exhausted, pausing until reset"
        );
        (self.sleeper)(delay);
        Some(delay)
    }
}
