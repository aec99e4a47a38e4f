//! Bounded retry with exponential backoff for conflicted mutations

use std::time::Duration;

/// Controls how often the engine re-runs a call whose atomic mutation
/// aborted on a concurrent conflict
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Pause after the first failed attempt
    pub initial_backoff: Duration,
    /// Upper bound for any single pause
    pub max_backoff: Duration,
    /// Growth factor between consecutive pauses
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(2),
            max_backoff: Duration::from_millis(100),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Create a new RetryPolicy with custom values
    ///
    /// Zero attempts falls back to the default; a maximum backoff smaller
    /// than the initial one is raised to match it.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        let default = Self::default();

        let max_attempts = if max_attempts == 0 {
            tracing::warn!(
                "Invalid max_attempts ({}), using default ({})",
                max_attempts,
                default.max_attempts
            );
            default.max_attempts
        } else {
            max_attempts
        };

        Self {
            max_attempts,
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
            multiplier: default.multiplier,
        }
    }

    /// A policy that gives up on the first conflict
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Pause to take after the given failed attempt (1-based)
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1);
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Whether another attempt is allowed after `attempts` have been made
    pub fn allows_another(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}
