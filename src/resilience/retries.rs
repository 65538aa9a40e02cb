//! Retry policy.
//!
//! # Responsibilities
//! - Bound the number of attempts per request
//! - Describe the exponential backoff schedule
//! - Carry the optional per-attempt timeout and request deadline
//!
//! # Design Decisions
//! - Attempt numbering starts at 1; `max_attempts` counts the first attempt
//! - Every failure is retryable; work units must tolerate duplicate effects
//! - No retry budget or circuit breaker: each request's loop is independent

use std::time::Duration;

/// Bounded exponential backoff policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Factor applied to the delay after every retry, at least 1.
    pub backoff_multiplier: f64,
    /// Upper bound on a single delay.
    pub max_backoff: Option<Duration>,
    /// Limit on a single attempt; an overrun counts as a failed attempt.
    pub attempt_timeout: Option<Duration>,
    /// Limit on the whole sequence, attempts and delays included.
    pub request_deadline: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            backoff_multiplier: backoff_multiplier.max(1.0),
            max_backoff: None,
            attempt_timeout: None,
            request_deadline: None,
        }
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = Some(max_backoff);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = Some(deadline);
        self
    }
}

impl Default for RetryPolicy {
    /// Three attempts, 500ms then 1s between them.
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500), 2.0)
    }
}
