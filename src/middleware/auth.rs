//! Bearer access-token extractor

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{JwtSessionIssuer, SessionError};

/// Caller identity taken from a valid access token
///
/// ```rust,ignore
/// async fn whoami(user: AuthenticatedUser) -> String {
///     user.address
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    /// Checksummed address the token was issued to
    pub address: String,
}

/// Why a request carried no usable access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerRejection {
    Missing,
    Expired,
    Invalid,
}

impl BearerRejection {
    fn code_and_message(self) -> (&'static str, &'static str) {
        match self {
            BearerRejection::Missing => (
                "MISSING_TOKEN",
                "Authorization header with Bearer token required",
            ),
            BearerRejection::Expired => ("TOKEN_EXPIRED", "Token has expired"),
            BearerRejection::Invalid => ("INVALID_TOKEN", "Invalid token"),
        }
    }
}

impl From<SessionError> for BearerRejection {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::TokenExpired => BearerRejection::Expired,
            _ => BearerRejection::Invalid,
        }
    }
}

impl IntoResponse for BearerRejection {
    fn into_response(self) -> Response {
        let (code, message) = self.code_and_message();
        let body = json!({ "error": { "code": code, "message": message } });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<JwtSessionIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BearerRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| BearerRejection::Missing)?;

        let claims = Arc::<JwtSessionIssuer>::from_ref(state).verify_access_token(bearer.token())?;
        let user_id = claims.user_id()?;

        Ok(AuthenticatedUser {
            user_id,
            address: claims.address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_map_to_rejections() {
        assert_eq!(
            BearerRejection::from(SessionError::TokenExpired),
            BearerRejection::Expired
        );
        assert_eq!(
            BearerRejection::from(SessionError::DecodingFailed("bad".to_string())),
            BearerRejection::Invalid
        );
    }

    #[test]
    fn test_rejection_is_unauthorized() {
        let response = BearerRejection::Missing.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
