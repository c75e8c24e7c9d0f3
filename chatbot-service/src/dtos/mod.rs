pub mod auth;
pub mod chat;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-stable error code, e.g. `AUTH_EXPIRED_TOKEN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
