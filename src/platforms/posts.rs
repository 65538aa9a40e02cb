//! Platform request bodies.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::{self, require_non_empty, DecodeError, Validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterPost {
    pub content: String,
    #[serde(default)]
    pub media_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedinPost {
    pub content: String,
    /// Organization page to post as, instead of the member.
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub media: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiktokVideo {
    pub caption: String,
    #[serde(default)]
    pub media_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinterestPin {
    pub board_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferPost {
    pub content: String,
    pub profile_id: String,
}

/// Platform-specific part of a connector request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBody {
    Twitter(TwitterPost),
    Linkedin(LinkedinPost),
    Tiktok(TiktokVideo),
    Pinterest(PinterestPin),
    Buffer(BufferPost),
}

impl Validate for TwitterPost {
    fn validate(&self) -> Result<(), DecodeError> {
        Ok(())
    }
}

impl Validate for LinkedinPost {
    fn validate(&self) -> Result<(), DecodeError> {
        Ok(())
    }
}

impl Validate for TiktokVideo {
    fn validate(&self) -> Result<(), DecodeError> {
        Ok(())
    }
}

impl Validate for PinterestPin {
    fn validate(&self) -> Result<(), DecodeError> {
        require_non_empty("board_id", &self.board_id)
    }
}

impl Validate for BufferPost {
    fn validate(&self) -> Result<(), DecodeError> {
        require_non_empty("profile_id", &self.profile_id)
    }
}

/// Fields shared by every platform shape around the platform body.
#[derive(Debug, Deserialize)]
struct Envelope<B> {
    /// Optional when the message carries the id as a header.
    #[serde(default)]
    request_id: Option<String>,
    credentials: serde_json::Map<String, serde_json::Value>,
    #[serde(flatten)]
    body: B,
}

impl<B: Validate> Validate for Envelope<B> {
    fn validate(&self) -> Result<(), DecodeError> {
        if let Some(request_id) = &self.request_id {
            require_non_empty("request_id", request_id)?;
        }
        self.body.validate()
    }
}

pub(crate) struct Decoded {
    pub request_id: Option<String>,
    pub body: PostBody,
    pub credentials: serde_json::Map<String, serde_json::Value>,
}

/// Decode a request whose body has shape `B`, tagging it with `wrap`.
pub(crate) fn decode_as<B>(bytes: &[u8], wrap: fn(B) -> PostBody) -> Result<Decoded, DecodeError>
where
    B: DeserializeOwned + Validate,
{
    let envelope: Envelope<B> = codec::decode(bytes)?;
    Ok(Decoded {
        request_id: envelope.request_id,
        body: wrap(envelope.body),
        credentials: envelope.credentials,
    })
}
