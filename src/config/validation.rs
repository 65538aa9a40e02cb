//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (attempts ≥ 1, multiplier ≥ 1)
//! - Check subject names and route uniqueness
//! - Detect routes that would loop back into the orchestrator
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::DispatchConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bus.url.trim().is_empty() {
        errors.push(ValidationError::new("bus.url", "must not be empty"));
    }
    if config.bus.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("bus.connect_timeout_secs", "must be positive"));
    }

    check_subject(&mut errors, "subjects.orchestrate", &config.subjects.orchestrate);
    check_subject(&mut errors, "subjects.success", &config.subjects.success);
    check_subject(&mut errors, "subjects.failed", &config.subjects.failed);
    if config.subjects.success == config.subjects.failed {
        errors.push(ValidationError::new(
            "subjects.failed",
            "must differ from subjects.success",
        ));
    }

    let retries = &config.retries;
    if retries.max_attempts < 1 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if !retries.backoff_multiplier.is_finite() || retries.backoff_multiplier < 1.0 {
        errors.push(ValidationError::new(
            "retries.backoff_multiplier",
            "must be a finite number of at least 1",
        ));
    }
    if retries.attempt_timeout_ms == Some(0) {
        errors.push(ValidationError::new("retries.attempt_timeout_ms", "must be positive"));
    }
    if retries.request_deadline_ms == Some(0) {
        errors.push(ValidationError::new("retries.request_deadline_ms", "must be positive"));
    }

    let mut targets = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{i}]");
        if route.target.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.target"), "must not be empty"));
        } else if !targets.insert(route.target.as_str()) {
            errors.push(ValidationError::new(
                format!("{field}.target"),
                format!("duplicate target `{}`", route.target),
            ));
        }
        check_subject(&mut errors, &format!("{field}.subject"), &route.subject);
        if route.subject == config.subjects.orchestrate {
            errors.push(ValidationError::new(
                format!("{field}.subject"),
                "must not route back to the orchestrate subject",
            ));
        }
    }

    let mut platforms = HashSet::new();
    for (i, connector) in config.connectors.iter().enumerate() {
        let field = format!("connectors[{i}]");
        if !platforms.insert(connector.platform) {
            errors.push(ValidationError::new(
                format!("{field}.platform"),
                format!("duplicate connector for `{}`", connector.platform),
            ));
        }
        if let Some(subject) = &connector.subject {
            check_subject(&mut errors, &format!("{field}.subject"), subject);
        }
        if connector.max_attempts == Some(0) {
            errors.push(ValidationError::new(
                format!("{field}.max_attempts"),
                "must be at least 1",
            ));
        }
    }

    if !(0.0..=1.0).contains(&config.stub.failure_rate) {
        errors.push(ValidationError::new("stub.failure_rate", "must be between 0 and 1"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_subject(errors: &mut Vec<ValidationError>, field: &str, subject: &str) {
    if subject.is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
    } else if subject.chars().any(char::is_whitespace) {
        errors.push(ValidationError::new(field, "must not contain whitespace"));
    }
}
