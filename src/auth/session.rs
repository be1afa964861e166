//! Session issuing seam
//!
//! The login flow hands an authenticated identity to a [`SessionIssuer`] and
//! returns whatever tokens it produces without looking inside them.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::address::WalletAddress;

/// Session-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Access and refresh token pair
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues session tokens for an authenticated wallet
#[async_trait::async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn issue(
        &self,
        user_id: Uuid,
        address: &WalletAddress,
    ) -> Result<SessionTokens, SessionError>;
}
