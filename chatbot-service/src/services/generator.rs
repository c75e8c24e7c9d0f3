//! Reply generation boundary.
//!
//! Wraps the configured provider so that no failure ever escapes: every
//! failure class maps to a fixed user-safe fallback string, and the call is
//! bounded by a timeout. `None` means "store no bot turn".

use std::sync::Arc;
use std::time::Duration;

use crate::services::providers::{HistoryTurn, ProviderError, ReplyProvider};

const FALLBACK_UNAUTHENTICATED: &str = "There seems to be an authentication problem with the \
    language service. Please let an administrator know.";

const FALLBACK_RATE_LIMITED: &str = "The language service is receiving too many requests right \
    now. Please try again in a moment.";

const FALLBACK_TIMEOUT: &str = "Sorry, the reply took too long to produce. Please try again.";

const FALLBACK_GENERIC: &str = "Sorry, I ran into a technical problem while trying to answer \
    you.";

#[derive(Clone)]
pub struct ReplyGenerator {
    provider: Option<Arc<dyn ReplyProvider>>,
    timeout: Duration,
}

impl ReplyGenerator {
    pub fn new(provider: Arc<dyn ReplyProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    /// A generator with no provider wired; `generate` always yields `None`.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            timeout: Duration::ZERO,
        }
    }

    /// Produce a reply to `input` given prior turns.
    ///
    /// Never errors. Returns `None` when no provider is configured or the
    /// reply text is semantically empty; any other failure becomes a
    /// fallback string that callers treat as a normal reply.
    pub async fn generate(&self, input: &str, history: &[HistoryTurn]) -> Option<String> {
        let provider = match &self.provider {
            Some(provider) => provider,
            None => {
                tracing::warn!("Reply provider not configured; skipping bot reply");
                return None;
            }
        };

        let result = tokio::time::timeout(self.timeout, provider.complete(input, history)).await;

        match result {
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Reply generation timed out");
                Some(FALLBACK_TIMEOUT.to_string())
            }
            Ok(Ok(text)) => {
                if text.trim().is_empty() {
                    tracing::warn!("Provider returned an empty reply; skipping bot turn");
                    None
                } else {
                    Some(text)
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Reply generation failed; answering with fallback");
                match e {
                    ProviderError::NotConfigured(_) => None,
                    ProviderError::Unauthenticated => Some(FALLBACK_UNAUTHENTICATED.to_string()),
                    ProviderError::RateLimited => Some(FALLBACK_RATE_LIMITED.to_string()),
                    ProviderError::ApiError(_) | ProviderError::NetworkError(_) => {
                        Some(FALLBACK_GENERIC.to_string())
                    }
                }
            }
        }
    }
}
