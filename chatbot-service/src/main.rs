use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatbot_service::{
    build_router,
    config::AppConfig,
    services::providers::mistral::{MistralConfig, MistralReplyProvider},
    services::{AuthService, ChatService, JwtService, MessageStore, MongoDb, ReplyGenerator, UserStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), chatbot_service::error::AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AppConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting chatbot service"
    );

    // Initialize database connection
    tracing::info!("Initializing database connection");
    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    tracing::info!("Database initialized successfully");

    let users: Arc<dyn UserStore> = Arc::new(db.clone());
    let messages: Arc<dyn MessageStore> = Arc::new(db);

    // Initialize JWT service
    let jwt = JwtService::new(&config.jwt);
    tracing::info!("JWT service initialized");

    // Wire the reply generator. An absent API key disables replies instead
    // of failing startup: user turns are still stored, without bot turns.
    let generator = if config.llm.api_key.is_empty() {
        tracing::warn!("MISTRAL_API_KEY is not set; chat replies are disabled");
        ReplyGenerator::disabled()
    } else {
        let provider = MistralReplyProvider::new(MistralConfig {
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
        });
        tracing::info!(model = %config.llm.model, "Initialized Mistral reply provider");
        ReplyGenerator::new(
            Arc::new(provider),
            Duration::from_secs(config.llm.request_timeout_seconds),
        )
    };

    // Initialize services
    let auth = AuthService::new(users.clone(), jwt.clone());
    let chat = ChatService::new(messages, generator, config.chat.history_limit);

    // Create application state
    let state = AppState {
        config: config.clone(),
        users,
        jwt,
        auth,
        chat,
    };

    // Build application router
    let app = build_router(state)?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
