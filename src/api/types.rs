//! API request and response types

use crate::conversation::{ConvState, Conversation, Turn};
use serde::{Deserialize, Serialize};

/// Chat form submission
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

/// Snapshot of the caller's conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub state: ConvState,
    pub turns: Vec<Turn>,
}

impl From<&Conversation> for ConversationResponse {
    fn from(conversation: &Conversation) -> Self {
        Self {
            state: conversation.state(),
            turns: conversation.turns().to_vec(),
        }
    }
}

/// Response for `/version`
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
