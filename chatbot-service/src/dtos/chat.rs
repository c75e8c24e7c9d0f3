use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Message, Role, Sender};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Emptiness is checked after trimming, in the chat service.
    pub message: String,

    /// Absent means "start a new conversation".
    #[serde(default)]
    pub conversation_id: Option<String>,

    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryQuery {
    pub conversation_id: Option<String>,
    pub all: Option<bool>,
}

/// A message as rendered on the wire, timestamp in RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub author_role: Role,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            user_id: message.user_id,
            author_role: message.author_role,
            sender: message.sender,
            text: message.text,
            timestamp: message.timestamp,
            metadata: message.metadata,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub conversation_id: String,
    pub user_message: MessageResponse,
    /// `null` when the generator is unconfigured or produced no usable text.
    pub bot_message: Option<MessageResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub messages: Vec<MessageResponse>,
    /// `null` in all-conversations mode or when the user has no messages.
    pub conversation_id: Option<String>,
}
