use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::auth::{LoginRequest, MeResponse, RegisterRequest},
    error::AppError,
    middleware::CurrentUser,
    utils::ValidatedJson,
    AppState,
};

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Login with username and password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.login(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Return the caller's own account, as attached by the authentication gate
pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse::from(&user.0))
}

/// Full user listing for the admin dashboard
pub async fn dashboard_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.list_users_for_admin(&user.0).await?;
    Ok((StatusCode::OK, Json(res)))
}
