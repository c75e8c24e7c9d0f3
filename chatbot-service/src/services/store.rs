//! Store abstractions over the two document collections.
//!
//! Handlers and services depend on these traits, not on MongoDB directly;
//! `MongoDb` implements them for production and `MemoryStore` backs the
//! test suite.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{Message, User};

/// Create/read access to user records. No business logic lives here.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Case-insensitive lookup; the caller passes the lower-cased form.
    async fn find_by_username_lower(
        &self,
        username_lower: &str,
    ) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Append/query access to conversation messages, always scoped to a user.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert one message. The caller mints the identifier and timestamp.
    async fn insert_message(&self, message: &Message) -> Result<(), AppError>;

    /// Up to `limit` most recent messages strictly before `before`, returned
    /// in chronological (oldest-first) order. The underlying fetch runs
    /// newest-first and is reversed in memory.
    async fn recent_history(
        &self,
        user_id: &str,
        conversation_id: &str,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError>;

    /// Conversation id of the user's most recent message, if any.
    async fn latest_conversation_id(&self, user_id: &str) -> Result<Option<String>, AppError>;

    /// Every message belonging to the user, ascending by timestamp.
    async fn messages_for_user(&self, user_id: &str) -> Result<Vec<Message>, AppError>;

    /// Every message in one conversation, ascending by timestamp.
    async fn messages_for_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<Message>, AppError>;
}

/// In-memory store used by the test suite.
///
/// Sorts are stable, so messages with equal timestamps keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.users
            .write()
            .expect("users lock poisoned")
            .push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().expect("users lock poisoned");
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username_lower(
        &self,
        username_lower: &str,
    ) -> Result<Option<User>, AppError> {
        let users = self.users.read().expect("users lock poisoned");
        Ok(users
            .iter()
            .find(|u| u.username_lower == username_lower)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.read().expect("users lock poisoned").clone())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: &Message) -> Result<(), AppError> {
        self.messages
            .write()
            .expect("messages lock poisoned")
            .push(message.clone());
        Ok(())
    }

    async fn recent_history(
        &self,
        user_id: &str,
        conversation_id: &str,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let messages = self.messages.read().expect("messages lock poisoned");
        let mut matching: Vec<Message> = messages
            .iter()
            .filter(|m| {
                m.user_id == user_id
                    && m.conversation_id == conversation_id
                    && m.timestamp < before
            })
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.timestamp);

        let skip = matching.len().saturating_sub(limit.max(0) as usize);
        Ok(matching.split_off(skip))
    }

    async fn latest_conversation_id(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let messages = self.messages.read().expect("messages lock poisoned");
        let mut latest: Option<&Message> = None;
        for message in messages.iter().filter(|m| m.user_id == user_id) {
            // >= so ties resolve to the later insertion, like a desc sort
            // over an append-ordered collection.
            if latest.map_or(true, |l| message.timestamp >= l.timestamp) {
                latest = Some(message);
            }
        }
        Ok(latest.map(|m| m.conversation_id.clone()))
    }

    async fn messages_for_user(&self, user_id: &str) -> Result<Vec<Message>, AppError> {
        let messages = self.messages.read().expect("messages lock poisoned");
        let mut matching: Vec<Message> = messages
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.timestamp);
        Ok(matching)
    }

    async fn messages_for_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        let messages = self.messages.read().expect("messages lock poisoned");
        let mut matching: Vec<Message> = messages
            .iter()
            .filter(|m| m.user_id == user_id && m.conversation_id == conversation_id)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.timestamp);
        Ok(matching)
    }
}
