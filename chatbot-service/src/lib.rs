pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::{AuthService, ChatService, JwtService, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserStore>,
    pub jwt: JwtService,
    pub auth: AuthService,
    pub chat: ChatService,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let mut origins = Vec::with_capacity(state.config.security.allowed_origins.len());
    for origin in &state.config.security.allowed_origins {
        origins.push(origin.parse::<HeaderValue>().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))
        })?);
    }

    // Everything behind the authentication gate.
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/dashboard-users", get(handlers::auth::dashboard_users))
        .route("/chat/history", get(handlers::chat::history))
        .route("/chat/send", post(handlers::chat::send_message))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                },
            ),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        );

    Ok(app)
}

/// Service health check
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": {
            "store": "up"
        }
    })))
}
