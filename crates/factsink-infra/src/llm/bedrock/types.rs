//! AWS Bedrock Runtime request/response types for Anthropic models.
//!
//! Bedrock uses the Claude Messages JSON format with two differences:
//! - The `model` field is omitted from the request body (it goes in the URL path).
//! - An `anthropic_version` field is required in the request body.

use serde::{Deserialize, Serialize};

/// Request body for the Bedrock `invoke` action.
#[derive(Debug, Clone, Serialize)]
pub struct BedrockRequest {
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub messages: Vec<BedrockMessage>,
}

/// A single message with plain-string content.
#[derive(Debug, Clone, Serialize)]
pub struct BedrockMessage {
    pub role: String,
    pub content: String,
}

/// Response body of a non-streaming `invoke`.
#[derive(Debug, Clone, Deserialize)]
pub struct BedrockResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub content: Vec<BedrockContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: BedrockUsage,
}

/// A content block. Only text blocks carry anything we use.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum BedrockContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BedrockUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

impl BedrockResponse {
    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                BedrockContentBlock::Text { text } => Some(text.as_str()),
                BedrockContentBlock::Other => None,
            })
            .collect()
    }
}
