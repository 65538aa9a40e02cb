//! Exponential backoff.

use std::time::Duration;

use crate::resilience::RetryPolicy;

/// Delay to wait after failed attempt `attempt` (1-based) before the next one:
/// `initial_backoff * backoff_multiplier^(attempt - 1)`, capped by `max_backoff`.
pub fn calculate_backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    let factor = policy.backoff_multiplier.powi(exponent);
    let delay = if factor.is_finite() {
        Duration::try_from_secs_f64(policy.initial_backoff.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    } else {
        Duration::MAX
    };

    match policy.max_backoff {
        Some(cap) => delay.min(cap),
        None => delay,
    }
}
