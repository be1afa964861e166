//! JWT token generation and validation
//!
//! Handles creation and verification of access and refresh tokens. Access and
//! refresh tokens are signed with different secrets so one can never be
//! replayed as the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::address::WalletAddress;
use super::session::{SessionError, SessionIssuer, SessionTokens};

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Canonical wallet address
    pub address: String,
    /// JWT ID
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Token type (access or refresh)
    pub token_type: String,
}

impl Claims {
    /// Extract the user ID from the subject claim
    pub fn user_id(&self) -> Result<Uuid, SessionError> {
        Uuid::parse_str(&self.sub).map_err(|e| SessionError::InvalidToken(e.to_string()))
    }
}

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// HS256 session issuer
#[derive(Clone)]
pub struct JwtSessionIssuer {
    access_secret: String,
    refresh_secret: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_days: i64,
}

impl JwtSessionIssuer {
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_days,
        }
    }

    /// Build a fresh token pair
    pub fn generate_tokens(
        &self,
        user_id: Uuid,
        address: &WalletAddress,
    ) -> Result<SessionTokens, SessionError> {
        let access_token = generate_token(
            user_id,
            address,
            &self.access_secret,
            self.access_token_ttl_seconds,
            TokenType::Access,
        )?;

        let refresh_token = generate_token(
            user_id,
            address,
            &self.refresh_secret,
            self.refresh_token_ttl_days * 24 * 60 * 60,
            TokenType::Refresh,
        )?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, SessionError> {
        verify_token(token, &self.access_secret, TokenType::Access)
    }

    /// Verify a refresh token and return its claims
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, SessionError> {
        verify_token(token, &self.refresh_secret, TokenType::Refresh)
    }
}

#[async_trait::async_trait]
impl SessionIssuer for JwtSessionIssuer {
    async fn issue(
        &self,
        user_id: Uuid,
        address: &WalletAddress,
    ) -> Result<SessionTokens, SessionError> {
        self.generate_tokens(user_id, address)
    }
}

fn generate_token(
    user_id: Uuid,
    address: &WalletAddress,
    secret: &str,
    ttl_seconds: i64,
    token_type: TokenType,
) -> Result<String, SessionError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_seconds);

    let claims = Claims {
        sub: user_id.to_string(),
        address: address.to_checksum(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        token_type: token_type.as_str().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| SessionError::EncodingFailed(e.to_string()))
}

fn verify_token(token: &str, secret: &str, expected: TokenType) -> Result<Claims, SessionError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => SessionError::TokenExpired,
        _ => SessionError::DecodingFailed(e.to_string()),
    })?;

    if token_data.claims.token_type != expected.as_str() {
        return Err(SessionError::InvalidToken(format!(
            "Expected {} token",
            expected.as_str()
        )));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::address::canonicalize;

    fn issuer() -> JwtSessionIssuer {
        JwtSessionIssuer::new(
            "access-secret".to_string(),
            "refresh-secret".to_string(),
            900,
            7,
        )
    }

    fn address() -> WalletAddress {
        canonicalize("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap()
    }

    #[test]
    fn test_generate_and_verify_access_token() {
        let user_id = Uuid::new_v4();
        let tokens = issuer().generate_tokens(user_id, &address()).unwrap();

        let claims = issuer().verify_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.address, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_generate_and_verify_refresh_token() {
        let tokens = issuer().generate_tokens(Uuid::new_v4(), &address()).unwrap();

        let claims = issuer().verify_refresh_token(&tokens.refresh_token).unwrap();
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let tokens = issuer().generate_tokens(Uuid::new_v4(), &address()).unwrap();

        assert!(issuer().verify_access_token(&tokens.refresh_token).is_err());
        assert!(issuer().verify_refresh_token(&tokens.access_token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let result = issuer().verify_access_token("invalid.token.here");
        assert!(matches!(result, Err(SessionError::DecodingFailed(_))));
    }

    #[test]
    fn test_expired_token() {
        let token = generate_token(
            Uuid::new_v4(),
            &address(),
            "access-secret",
            -3600,
            TokenType::Access,
        )
        .unwrap();

        let result = issuer().verify_access_token(&token);
        assert_eq!(result.unwrap_err(), SessionError::TokenExpired);
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtSessionIssuer::new("other".to_string(), "other".to_string(), 900, 7);
        let tokens = other.generate_tokens(Uuid::new_v4(), &address()).unwrap();

        assert!(issuer().verify_access_token(&tokens.access_token).is_err());
    }
}
