//! Worker liveness.

use serde::Serialize;

/// Answer to a liveness query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
}

impl HealthStatus {
    pub fn ok(service: impl Into<String>) -> Self {
        Self {
            status: "ok",
            service: service.into(),
        }
    }
}
