//! User model - registered chatbot accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles. The set is closed; `admin` gates the dashboard listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// User document.
///
/// `username_lower` is the searchable form; uniqueness is enforced on it so
/// usernames differing only in case collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier, minted at registration.
    pub id: String,

    /// Username exactly as supplied at registration.
    pub username: String,

    /// Lower-cased username used for case-insensitive lookup.
    pub username_lower: String,

    /// Argon2 PHC-format password hash.
    pub password_hash: String,

    pub role: Role,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, role: Role, password_hash: String) -> Self {
        let username_lower = username.to_lowercase();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            username_lower,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    /// Strip the password hash before the user record leaves the store layer.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// User record without sensitive fields; what the authentication gate
/// attaches to the request.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUser {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
