//! Test helpers for router-level integration tests.
//!
//! Builds the full application over the in-memory store and a mock reply
//! provider, so tests exercise the real routing, middleware, and handlers
//! without MongoDB or network access.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::util::ServiceExt;

use chatbot_service::{
    build_router,
    config::{
        AppConfig, ChatConfig, Environment, JwtConfig, LlmConfig, MongoConfig, SecurityConfig,
    },
    services::providers::{mock::MockReplyProvider, HistoryTurn, ProviderError, ReplyProvider},
    services::{
        AuthService, ChatService, JwtService, MemoryStore, MessageStore, ReplyGenerator,
        UserStore,
    },
    AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Dev,
        service_name: "chatbot-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        port: 5001,
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "chatbot_test".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            token_expiry_days: 30,
        },
        llm: LlmConfig {
            api_key: "test-key".to_string(),
            model: "mistral-small-latest".to_string(),
            request_timeout_seconds: 5,
        },
        chat: ChatConfig { history_limit: 10 },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

/// Test application wired over in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// Spawn with a mock provider that always answers.
    pub fn spawn() -> Self {
        Self::with_provider(MockReplyProvider::new())
    }

    pub fn with_provider(provider: impl ReplyProvider + 'static) -> Self {
        Self::with_generator(ReplyGenerator::new(
            Arc::new(provider),
            Duration::from_secs(5),
        ))
    }

    pub fn with_generator(generator: ReplyGenerator) -> Self {
        let store = Arc::new(MemoryStore::new());
        let users: Arc<dyn UserStore> = store.clone();
        let messages: Arc<dyn MessageStore> = store.clone();

        let config = test_config();
        let jwt = JwtService::new(&config.jwt);
        let auth = AuthService::new(users.clone(), jwt.clone());
        let chat = ChatService::new(messages, generator, config.chat.history_limit);

        let state = AppState {
            config,
            users,
            jwt,
            auth,
            chat,
        };
        let router = build_router(state.clone()).expect("Failed to build router");

        Self {
            router,
            state,
            store,
        }
    }

    pub async fn post_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body was not JSON")
        };
        (status, body)
    }

    /// Register and assert success; returns the response body
    /// `{id, username, role, token}`.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Option<&str>,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({ "username": username, "password": password });
        if let Some(role) = role {
            body["role"] = serde_json::json!(role);
        }
        let (status, body) = self.post_json("/auth/register", None, body).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body
    }
}

/// Provider that records every call it receives, for asserting on the
/// context window handed to it.
#[derive(Clone, Default)]
pub struct RecordingReplyProvider {
    pub calls: Arc<Mutex<Vec<(String, Vec<HistoryTurn>)>>>,
}

impl RecordingReplyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, Vec<HistoryTurn>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReplyProvider for RecordingReplyProvider {
    async fn complete(
        &self,
        input: &str,
        history: &[HistoryTurn],
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_string(), history.to_vec()));
        Ok(format!("Reply to: {}", input))
    }
}
