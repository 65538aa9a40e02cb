//! Social platforms served by connectors.
//!
//! # Responsibilities
//! - Name the supported platforms and their default subjects
//! - Decode each platform's inbound request shape
//! - Provide the publish capability a connector wraps (publisher.rs)
//!
//! # Design Decisions
//! - A platform is a value, not a module; connectors are generic over it
//! - Credentials are an opaque JSON object, passed through and never inspected
//! - Unknown fields are ignored so producers can evolve independently

pub mod posts;
pub mod publisher;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{self, DecodeError};

pub use posts::{BufferPost, LinkedinPost, PinterestPin, PostBody, TiktokVideo, TwitterPost};
pub use publisher::{PlatformPublisher, PublishError, StubPublisher};

/// A platform with a shipped connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Linkedin,
    Tiktok,
    Pinterest,
    Buffer,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Tiktok,
        Platform::Pinterest,
        Platform::Buffer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Tiktok => "tiktok",
            Platform::Pinterest => "pinterest",
            Platform::Buffer => "buffer",
        }
    }

    /// Subject the connector consumes unless configured otherwise.
    pub fn default_subject(&self) -> &'static str {
        match self {
            Platform::Twitter => "publish.twitter",
            Platform::Linkedin => "publish.linkedin",
            Platform::Tiktok => "publish.tiktok",
            Platform::Pinterest => "publish.pinterest",
            Platform::Buffer => "publish.buffer",
        }
    }

    /// Name reported by the connector's health check.
    pub fn service_name(&self) -> String {
        format!("{}-connector", self.as_str())
    }

    /// Prefix of the identifiers the placeholder publisher assigns.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Platform::Twitter => "tw_",
            Platform::Linkedin => "li_",
            Platform::Tiktok => "tt_",
            Platform::Pinterest => "pin_",
            Platform::Buffer => "bf_",
        }
    }

    /// Public URL of a published post, where the platform has a stable one.
    pub fn canonical_url(&self, external_id: &str) -> Option<String> {
        match self {
            Platform::Twitter => Some(format!("https://x.com/i/web/status/{external_id}")),
            Platform::Linkedin => Some(format!(
                "https://www.linkedin.com/feed/update/{external_id}"
            )),
            Platform::Tiktok | Platform::Pinterest | Platform::Buffer => None,
        }
    }

    /// Decode this platform's request shape.
    pub fn decode(&self, bytes: &[u8]) -> Result<PublishRequest, DecodeError> {
        self.decode_message(bytes, None)
    }

    /// Decode a request that arrived with an optional `Request-Id` header.
    ///
    /// The header is the correlation id assigned at the orchestrator and wins
    /// over the body's `request_id`; the body is only used when no header is
    /// present.
    pub fn decode_message(
        &self,
        bytes: &[u8],
        header: Option<&str>,
    ) -> Result<PublishRequest, DecodeError> {
        let decoded = match self {
            Platform::Twitter => posts::decode_as(bytes, PostBody::Twitter)?,
            Platform::Linkedin => posts::decode_as(bytes, PostBody::Linkedin)?,
            Platform::Tiktok => posts::decode_as(bytes, PostBody::Tiktok)?,
            Platform::Pinterest => posts::decode_as(bytes, PostBody::Pinterest)?,
            Platform::Buffer => posts::decode_as(bytes, PostBody::Buffer)?,
        };
        let header = header.filter(|id| !id.trim().is_empty());
        let request_id = match (header, decoded.request_id) {
            (Some(header), Some(body)) if header != body => {
                tracing::warn!(
                    platform = %self,
                    request_id = %header,
                    body_request_id = %body,
                    "Body request_id disagrees with header, using header"
                );
                header.to_string()
            }
            (Some(header), _) => header.to_string(),
            (None, Some(body)) => body,
            (None, None) => {
                return Err(DecodeError::invalid(
                    "request_id",
                    "missing from body and header",
                ))
            }
        };
        Ok(PublishRequest {
            platform: *self,
            request_id,
            body: decoded.body,
            credentials: decoded.credentials,
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown platform `{0}`")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// A decoded connector request.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub platform: Platform,
    pub request_id: String,
    pub body: PostBody,
    pub credentials: serde_json::Map<String, serde_json::Value>,
}

/// Platform-assigned identity of a published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Published {
    pub external_id: String,
    pub url: Option<String>,
}

/// Recover the correlation id of a body the platform could not decode.
///
/// Same precedence as [`Platform::decode_message`]: header first, then body.
pub fn recover_request_id(bytes: &[u8], header: Option<&str>) -> Option<String> {
    header
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .or_else(|| codec::recover_request_id(bytes))
}
