//! Request pacing between catalog entries
//!
//! Entries are processed one after another with a randomized pause in
//! between: a fixed floor plus uniform jitter. Retries and asset downloads
//! within an entry are not paced.

use crate::config::CrawlerConfig;
use std::time::Duration;

/// Jittered delay between catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    /// Minimum pause
    floor: Duration,

    /// Upper bound of the random addition (inclusive)
    jitter: Duration,
}

impl Pacer {
    pub fn new(floor: Duration, jitter: Duration) -> Self {
        Self { floor, jitter }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.delay_floor),
            Duration::from_millis(config.delay_jitter),
        )
    }

    /// A pacer that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draws the next pause, uniformly in `floor..=floor + jitter`
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.floor;
        }
        self.floor + Duration::from_millis(rand::random_range(0..=jitter_ms))
    }

    /// Sleeps for the next pause
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::debug!("Pausing {:?} before next entry", delay);
        tokio::time::sleep(delay).await;
    }
}
