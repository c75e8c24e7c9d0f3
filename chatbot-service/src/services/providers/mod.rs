//! Reply provider abstraction and implementations.
//!
//! A provider turns a user input plus prior turns into reply text. Failures
//! are classified into a closed error set; mapping them to user-facing
//! fallback strings is the generator's job, not the provider's.

pub mod mistral;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Sender;

/// Error type for provider operations.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider rejected the API credentials")]
    Unauthenticated,

    #[error("Rate limited")]
    RateLimited,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// One prior turn of context, as handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub sender: Sender,
    pub text: String,
}

/// Trait for reply providers (e.g. Mistral, mock).
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Produce a reply to `input` given prior turns in chronological order.
    async fn complete(
        &self,
        input: &str,
        history: &[HistoryTurn],
    ) -> Result<String, ProviderError>;
}
