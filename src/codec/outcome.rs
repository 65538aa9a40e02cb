//! Terminal outcome events.

use serde::{Deserialize, Serialize};

/// Successful completion of a request. The result's fields are flattened
/// next to `request_id` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Success<R> {
    pub request_id: String,
    #[serde(flatten)]
    pub result: R,
}

/// Terminal failure of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// `None` only when a malformed message carried no recoverable id.
    pub request_id: Option<String>,
    pub error: String,
    /// Undecodable inbound body, for decode failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<String>,
}

impl Failure {
    pub fn new(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            error: error.into(),
            raw_payload: None,
        }
    }

    /// Failure for a body that could not be decoded.
    pub fn undecodable(request_id: Option<String>, error: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            request_id,
            error: error.into(),
            raw_payload: Some(String::from_utf8_lossy(raw).into_owned()),
        }
    }
}

/// The single event that closes out a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    Success(Success<R>),
    Failure(Failure),
}

impl<R> Outcome<R> {
    pub fn success(request_id: impl Into<String>, result: R) -> Self {
        Outcome::Success(Success {
            request_id: request_id.into(),
            result,
        })
    }

    pub fn failure(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Outcome::Failure(Failure::new(request_id, error))
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Outcome::Success(s) => Some(&s.request_id),
            Outcome::Failure(f) => f.request_id.as_deref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Failure(_) => "failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Posted {
        external_id: String,
        url: Option<String>,
    }

    #[test]
    fn test_success_wire_shape_is_flat() {
        let success = Success {
            request_id: "r-1".to_string(),
            result: Posted {
                external_id: "tw_123".to_string(),
                url: Some("https://x.com/i/web/status/tw_123".to_string()),
            },
        };
        let value = serde_json::to_value(&success).unwrap();
        assert_eq!(
            value,
            json!({
                "request_id": "r-1",
                "external_id": "tw_123",
                "url": "https://x.com/i/web/status/tw_123"
            })
        );
    }

    #[test]
    fn test_failure_wire_shape() {
        let value = serde_json::to_value(Failure::new("r-2", "boom")).unwrap();
        assert_eq!(value, json!({"request_id": "r-2", "error": "boom"}));
    }

    #[test]
    fn test_undecodable_failure_keeps_raw_body() {
        let failure = Failure::undecodable(None, "decode error", b"{oops");
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            value,
            json!({"request_id": null, "error": "decode error", "raw_payload": "{oops"})
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let ok: Outcome<u8> = Outcome::success("r-1", 1);
        assert!(ok.is_success());
        assert_eq!(ok.request_id(), Some("r-1"));
        assert_eq!(ok.label(), "success");

        let failed: Outcome<u8> = Outcome::failure("r-1", "nope");
        assert!(!failed.is_success());
        assert_eq!(failed.label(), "failure");
    }
}
