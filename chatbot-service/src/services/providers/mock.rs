//! Mock reply provider for testing.

use async_trait::async_trait;

use super::{HistoryTurn, ProviderError, ReplyProvider};

/// Mock provider returning a canned reply, or a forced failure.
pub struct MockReplyProvider {
    reply: Option<String>,
    failure: Option<ProviderError>,
}

impl MockReplyProvider {
    pub fn new() -> Self {
        Self {
            reply: None,
            failure: None,
        }
    }

    /// Always answer with the given text.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            failure: None,
        }
    }

    /// Always fail with the given error.
    pub fn failing(failure: ProviderError) -> Self {
        Self {
            reply: None,
            failure: Some(failure),
        }
    }
}

impl Default for MockReplyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyProvider for MockReplyProvider {
    async fn complete(
        &self,
        input: &str,
        _history: &[HistoryTurn],
    ) -> Result<String, ProviderError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        Ok(self
            .reply
            .clone()
            .unwrap_or_else(|| format!("Mock reply for: {}", input)))
    }
}
