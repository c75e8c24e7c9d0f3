use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dtos::chat::{HistoryQuery, SendMessageRequest},
    error::AppError,
    middleware::CurrentUser,
    utils::ValidatedJson,
    AppState,
};

/// Persist a user turn and answer it with a bot turn where possible
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.chat.send_message(&user.0, req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Conversation history: everything, one conversation, or the latest one
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.chat.history(&user.0, query).await?;
    Ok((StatusCode::OK, Json(res)))
}
