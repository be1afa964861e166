//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

use super::UserResponse;

/// Request for an authentication nonce
#[derive(Debug, Deserialize)]
pub struct NonceRequest {
    pub address: String,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceResponse {
    pub nonce: String,
    /// Exact text the wallet must sign
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Request to log in with a signed challenge
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub address: String,
    /// Hex-encoded 65-byte signature
    pub signature: String,
}

/// Successful login or refresh
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
