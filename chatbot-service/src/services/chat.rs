//! Conversation orchestration: the message-send flow and history retrieval.

use std::sync::Arc;

use uuid::Uuid;

use crate::dtos::chat::{
    HistoryQuery, HistoryResponse, SendMessageRequest, SendMessageResponse,
};
use crate::error::AppError;
use crate::models::{Message, SanitizedUser};
use crate::services::generator::ReplyGenerator;
use crate::services::providers::HistoryTurn;
use crate::services::store::MessageStore;

#[derive(Clone)]
pub struct ChatService {
    messages: Arc<dyn MessageStore>,
    generator: ReplyGenerator,
    history_limit: i64,
}

impl ChatService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        generator: ReplyGenerator,
        history_limit: i64,
    ) -> Self {
        Self {
            messages,
            generator,
            history_limit,
        }
    }

    /// Persist the user turn, generate a reply, persist the bot turn.
    ///
    /// A fresh conversation id is minted when the client supplies none; that
    /// is the only way a new conversation starts. If the reply generation or
    /// the bot-turn insert fails, the user turn stays stored.
    pub async fn send_message(
        &self,
        user: &SanitizedUser,
        req: SendMessageRequest,
    ) -> Result<SendMessageResponse, AppError> {
        if req.message.trim().is_empty() {
            return Err(AppError::EmptyMessage);
        }

        let conversation_id = req
            .conversation_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let user_message = Message::user_turn(
            conversation_id.clone(),
            user.id.clone(),
            user.role,
            req.message.clone(),
            req.metadata.clone(),
        );
        self.messages.insert_message(&user_message).await?;

        // Context window: the most recent prior turns, oldest first. The
        // cutoff at the user turn's timestamp keeps it out of its own
        // context.
        let history = self
            .messages
            .recent_history(
                &user.id,
                &conversation_id,
                user_message.timestamp,
                self.history_limit,
            )
            .await?;
        let turns: Vec<HistoryTurn> = history
            .iter()
            .map(|m| HistoryTurn {
                sender: m.sender,
                text: m.text.clone(),
            })
            .collect();

        let reply = self.generator.generate(&req.message, &turns).await;

        let bot_message = match reply {
            Some(text) => {
                let message = Message::bot_turn(
                    conversation_id.clone(),
                    user.id.clone(),
                    user.role,
                    text,
                    req.metadata,
                );
                self.messages.insert_message(&message).await?;
                Some(message)
            }
            None => None,
        };

        Ok(SendMessageResponse {
            conversation_id,
            user_message: user_message.into(),
            bot_message: bot_message.map(Into::into),
        })
    }

    /// Retrieve history: everything, one conversation, or the latest one.
    pub async fn history(
        &self,
        user: &SanitizedUser,
        query: HistoryQuery,
    ) -> Result<HistoryResponse, AppError> {
        if query.all.unwrap_or(false) {
            // The client groups by conversation id itself in this mode.
            let messages = self.messages.messages_for_user(&user.id).await?;
            return Ok(HistoryResponse {
                messages: messages.into_iter().map(Into::into).collect(),
                conversation_id: None,
            });
        }

        let target = match query.conversation_id.filter(|id| !id.is_empty()) {
            Some(id) => Some(id),
            None => self.messages.latest_conversation_id(&user.id).await?,
        };

        match target {
            Some(conversation_id) => {
                let messages = self
                    .messages
                    .messages_for_conversation(&user.id, &conversation_id)
                    .await?;
                Ok(HistoryResponse {
                    messages: messages.into_iter().map(Into::into).collect(),
                    conversation_id: Some(conversation_id),
                })
            }
            None => Ok(HistoryResponse {
                messages: Vec::new(),
                conversation_id: None,
            }),
        }
    }
}
