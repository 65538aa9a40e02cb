//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap a single attempt with an optional time limit
//! - Turn an overrun into a distinct, retryable attempt error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the timed-out future is dropped
//! - Timeout errors are distinct from work-unit errors

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Why a single attempt failed.
#[derive(Debug)]
pub enum AttemptError<E> {
    /// The work unit returned an error.
    Work(E),
    /// The attempt exceeded its time limit.
    TimedOut(Duration),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Work(e) => write!(f, "{}", e),
            AttemptError::TimedOut(limit) => write!(f, "attempt timed out after {:?}", limit),
        }
    }
}

/// Run `fut`, failing with [`AttemptError::TimedOut`] if `limit` elapses first.
pub async fn with_timeout<T, E, F>(limit: Option<Duration>, fut: F) -> Result<T, AttemptError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(AttemptError::Work),
            Err(_) => Err(AttemptError::TimedOut(limit)),
        },
        None => fut.await.map_err(AttemptError::Work),
    }
}
