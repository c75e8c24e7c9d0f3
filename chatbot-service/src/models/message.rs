//! Message model - one document per conversation turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A single conversation turn. Messages are insert-only: never mutated or
/// deleted, and a conversation's owning user never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier, minted by the caller before insertion.
    pub id: String,

    /// Groups messages into a thread.
    pub conversation_id: String,

    /// Owning user.
    pub user_id: String,

    /// Role of the owning user at the time of the turn.
    pub author_role: Role,

    pub sender: Sender,

    pub text: String,

    /// Orders messages within a conversation.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Opaque key/value mapping supplied by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    /// Build the human side of a turn, stamped with the current time.
    pub fn user_turn(
        conversation_id: String,
        user_id: String,
        author_role: Role,
        text: String,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self::new(conversation_id, user_id, author_role, Sender::User, text, metadata)
    }

    /// Build the bot side of a turn, stamped with the current time.
    pub fn bot_turn(
        conversation_id: String,
        user_id: String,
        author_role: Role,
        text: String,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self::new(conversation_id, user_id, author_role, Sender::Bot, text, metadata)
    }

    fn new(
        conversation_id: String,
        user_id: String,
        author_role: Role,
        sender: Sender,
        text: String,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            user_id,
            author_role,
            sender,
            text,
            timestamp: Utc::now(),
            metadata,
        }
    }
}
