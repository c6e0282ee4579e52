//! Bounded retry for network operations
//!
//! Every network-touching step of a run goes through [`with_retry`]. Attempts
//! follow each other immediately; the only pacing in a run is the pause
//! between catalog entries.

use crate::GrabberError;
use std::future::Future;

/// Default number of attempts, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How many times an operation may be attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

/// Runs `operation` until it succeeds or the attempt budget is spent
///
/// # Retry Logic
///
/// | Outcome | Action |
/// |---------|--------|
/// | `Ok` | Return immediately |
/// | Retryable error (network, timeout, HTTP status) | Log, retry at once |
/// | Non-retryable error (filesystem, extraction) | Return it unchanged |
/// | `max_attempts` retryable errors in a row | `RetriesExhausted` |
///
/// Each attempt runs the operation from scratch, so it must be safe to repeat.
///
/// # Arguments
///
/// * `policy` - The attempt budget
/// * `operation` - Label used in logs and in the terminal error
/// * `f` - Produces a fresh future per attempt
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, GrabberError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GrabberError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut failures = Vec::new();

    for attempt in 1..=max_attempts {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", operation, attempt);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                tracing::debug!("{} failed with non-retryable error: {}", operation, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}",
                    operation,
                    attempt,
                    max_attempts,
                    e
                );
                failures.push(e.to_string());
            }
        }
    }

    tracing::error!(
        "{} gave up after {} attempts; failure history:\n  {}",
        operation,
        max_attempts,
        failures.join("\n  ")
    );

    Err(GrabberError::RetriesExhausted {
        operation: operation.to_string(),
        attempts: max_attempts,
        failures,
    })
}
