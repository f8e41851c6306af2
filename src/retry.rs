//! Bounded retry policy shared by the compressor and the playback reload
//! path. Unbounded retry is deliberately not representable here.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry2::strategy::{jitter, ExponentialBackoff};

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each subsequent retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Ceiling for any single backoff delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Jittered doubling schedule of the delays between attempts.
    ///
    /// Yields `max_attempts - 1` entries: one delay per retry.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        // from_millis(2) doubles each step; factor scales it to base_delay_ms.
        let factor = (self.base_delay_ms / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1) as usize)
    }

    /// Ceiling delay, used when a caller outlives the schedule.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
