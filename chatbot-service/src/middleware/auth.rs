use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, AuthFailure};
use crate::models::SanitizedUser;
use crate::AppState;

/// Authentication gate for protected routes.
///
/// Verifies the bearer token, confirms the referenced user still exists, and
/// attaches the sanitized user record to the request. Pure function of
/// (token, store state) apart from the single user lookup.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized(AuthFailure::MissingToken))?;

    let claims = state.jwt.verify_token(token)?;

    // The token may outlive the account it points at.
    let user = state
        .users
        .find_by_id(&claims.sub)
        .await?
        .ok_or(AppError::Unauthorized(AuthFailure::UnknownUser))?;

    req.extensions_mut().insert(user.sanitized());

    Ok(next.run(req).await)
}

/// Extractor for the user attached by `auth_middleware`.
pub struct CurrentUser(pub SanitizedUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<SanitizedUser>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "User context missing from request extensions"
            ))
        })?;

        Ok(CurrentUser(user.clone()))
    }
}
