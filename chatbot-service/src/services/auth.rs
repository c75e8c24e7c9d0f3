//! Account registration, login, and the admin listing.

use std::sync::Arc;

use crate::dtos::auth::{
    AuthResponse, DashboardUsersResponse, LoginRequest, RegisterRequest,
};
use crate::error::AppError;
use crate::models::{SanitizedUser, User};
use crate::services::jwt::JwtService;
use crate::services::store::UserStore;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    /// Create an account and return it with a session token, so registration
    /// doubles as a login.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        let username_lower = req.username.to_lowercase();

        if self
            .users
            .find_by_username_lower(&username_lower)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateUser);
        }

        let password_hash = hash_password(&Password::new(req.password))?;
        let user = User::new(
            req.username,
            req.role.unwrap_or_default(),
            password_hash.into_string(),
        );

        self.users.insert_user(&user).await?;
        let token = self.jwt.issue_token(&user.id)?;

        tracing::info!(user_id = %user.id, role = %user.role.as_str(), "User registered");

        Ok(AuthResponse {
            id: user.id,
            username: user.username,
            role: user.role,
            token,
        })
    }

    /// Exchange credentials for a session token.
    ///
    /// Unknown username and wrong password reject identically.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .find_by_username_lower(&req.username.to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| AppError::InvalidCredentials)?;

        let token = self.jwt.issue_token(&user.id)?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            id: user.id,
            username: user.username,
            role: user.role,
            token,
        })
    }

    /// Full account listing for the admin dashboard. Unpaginated.
    pub async fn list_users_for_admin(
        &self,
        current: &SanitizedUser,
    ) -> Result<DashboardUsersResponse, AppError> {
        if current.role != crate::models::Role::Admin {
            return Err(AppError::Forbidden);
        }

        let users = self.users.list_users().await?;

        Ok(DashboardUsersResponse {
            total_users: users.len(),
            users_list: users.into_iter().map(Into::into).collect(),
        })
    }
}
