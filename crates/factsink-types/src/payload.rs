//! Conversation payload delivered through object storage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The conversation a notification points at.
///
/// Fetched once per notification and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPayload {
    /// Subject of the conversation. Only used for logging.
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Groups related turns; the prefix of every derived record identifier.
    pub session_id: String,
    #[serde(default)]
    pub historical_context: Option<Vec<ContextItem>>,
    #[serde(default)]
    pub current_context: Option<Vec<ContextItem>>,
}

impl ConversationPayload {
    /// All turns in timeline order: historical first, then current.
    pub fn turns(&self) -> impl Iterator<Item = &ContextItem> {
        self.historical_context
            .iter()
            .flatten()
            .chain(self.current_context.iter().flatten())
    }
}

/// One conversational turn.
///
/// `content` is normally `{"text": "..."}` but may be any JSON value.
/// Unrecognised fields are kept so the whole item can be rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
