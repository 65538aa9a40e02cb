//! Message body decoding and encoding.
//!
//! # Data Flow
//! ```text
//! Inbound bytes
//!     → decode::<T>() (JSON syntax + schema via serde)
//!     → Validate::validate() (semantic checks serde cannot express)
//!     → typed request
//!
//! Typed outcome
//!     → encode() → outbound bytes
//! ```
//!
//! # Design Decisions
//! - JSON on the wire, snake_case field names
//! - Unknown fields are ignored, missing required fields are rejected
//! - Decode errors are structured so callers can report them

pub mod envelope;
pub mod outcome;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use envelope::OrchestrateRequest;
pub use outcome::{Failure, Outcome, Success};

/// Errors produced while decoding an inbound message.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// Malformed JSON or a schema violation (missing field, wrong type).
    #[error("invalid message body: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed JSON that fails a semantic check.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl DecodeError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Semantic validation applied after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), DecodeError>;
}

/// Decode and validate a message body.
pub fn decode<T>(bytes: &[u8]) -> Result<T, DecodeError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(bytes)?;
    value.validate()?;
    Ok(value)
}

/// Encode a value as a JSON message body.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Best-effort recovery of `request_id` from a body that failed to decode.
pub fn recover_request_id(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value
        .get("request_id")
        .and_then(|id| id.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Reject empty or whitespace-only identifiers.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), DecodeError> {
    if value.trim().is_empty() {
        return Err(DecodeError::invalid(field, "must not be empty"));
    }
    Ok(())
}
