use serde::{Deserialize, Serialize};

/// API error payload, `{"error": true, "message": "..."}` on the wire.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: bool,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
        }
    }
}

/// Body of POST and PATCH /stories. Both fields are required; options let
/// the handler reject missing or null fields with the documented message
/// instead of a generic deserialization error.
#[derive(Debug, Deserialize)]
pub struct StoryPayload {
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Body of POST /stories/{id}/votes.
#[derive(Debug, Deserialize)]
pub struct VotePayload {
    pub direction: Option<String>,
}
