//! Mistral reply provider.
//!
//! Calls the chat-completions endpoint with a fixed system instruction and
//! the conversation's prior turns mapped to user/assistant roles.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{HistoryTurn, ProviderError, ReplyProvider};
use crate::models::Sender;

/// Mistral API base URL.
const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";

const SYSTEM_PROMPT: &str = "You are a friendly and helpful teaching assistant. \
    Answer the user's questions clearly and concisely. \
    If the question is asked in Arabic, reply in Arabic.";

/// Mistral provider configuration.
#[derive(Debug, Clone)]
pub struct MistralConfig {
    pub api_key: String,
    pub model: String,
}

pub struct MistralReplyProvider {
    config: MistralConfig,
    client: Client,
}

impl MistralReplyProvider {
    pub fn new(config: MistralConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", MISTRAL_API_BASE)
    }

    fn build_messages(&self, input: &str, history: &[HistoryTurn]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        });
        for turn in history {
            let role = match turn.sender {
                Sender::User => "user",
                Sender::Bot => "assistant",
            };
            messages.push(ChatMessage {
                role: role.to_string(),
                content: turn.text.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: input.to_string(),
        });
        messages
    }
}

#[async_trait]
impl ReplyProvider for MistralReplyProvider {
    async fn complete(
        &self,
        input: &str,
        history: &[HistoryTurn],
    ) -> Result<String, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "MISTRAL_API_KEY is not set".to_string(),
            ));
        }

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: self.build_messages(input, history),
            temperature: 0.7,
        };

        tracing::debug!(
            model = %self.config.model,
            input_len = input.len(),
            history_len = history.len(),
            "Sending request to Mistral API"
        );

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => ProviderError::Unauthenticated,
                429 => ProviderError::RateLimited,
                _ => ProviderError::ApiError(format!(
                    "Mistral API error {}: {}",
                    status, error_text
                )),
            });
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::ApiError("Response contained no choices".to_string()))
    }
}

// Request/response types for the chat-completions API.

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
