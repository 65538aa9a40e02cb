//! Orchestrate request envelope.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::codec::{require_non_empty, DecodeError, Validate};

/// Abstract publish intent received by the orchestrator.
///
/// `payload` is kept as raw JSON so it can be republished byte for byte.
#[derive(Debug, Deserialize, Serialize)]
pub struct OrchestrateRequest {
    /// Caller-assigned correlation id.
    pub request_id: String,
    /// Abstract destination, usually a platform name.
    #[serde(alias = "platform")]
    pub target: String,
    /// Platform-specific body, forwarded unchanged.
    pub payload: Box<RawValue>,
}

impl OrchestrateRequest {
    /// Raw bytes of the payload exactly as received.
    pub fn payload_bytes(&self) -> &[u8] {
        self.payload.get().as_bytes()
    }
}

impl Validate for OrchestrateRequest {
    fn validate(&self) -> Result<(), DecodeError> {
        require_non_empty("request_id", &self.request_id)?;
        require_non_empty("target", &self.target)?;
        if !self.payload.get().trim_start().starts_with('{') {
            return Err(DecodeError::invalid("payload", "must be a JSON object"));
        }
        Ok(())
    }
}
