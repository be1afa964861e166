//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;

use super::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    LoginRequest, LoginResponse, NonceRequest, NonceResponse, RefreshTokenRequest, UserResponse,
};
use crate::state::AppState;

/// POST /auth/nonce - Request a nonce for wallet authentication
pub async fn request_nonce(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<NonceRequest>, ApiError>,
) -> ApiResult<Json<NonceResponse>> {
    let challenge = state.auth_service.request_nonce(&req.address)?;

    Ok(Json(NonceResponse {
        nonce: challenge.nonce,
        message: challenge.message,
        expires_at: challenge.expires_at,
    }))
}

/// POST /auth/login - Verify signed nonce and issue tokens
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .auth_service
        .login(&req.address, &req.signature)
        .await?;

    Ok(Json(LoginResponse {
        user: outcome.user.into(),
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    }))
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair
pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RefreshTokenRequest>, ApiError>,
) -> ApiResult<Json<LoginResponse>> {
    let claims = state
        .session_issuer
        .verify_refresh_token(&req.refresh_token)?;
    let user_id = claims.user_id()?;

    let user = state
        .auth_service
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    let address = crate::auth::canonicalize(&user.address)
        .map_err(|e| ApiError::InternalError(format!("Stored address is invalid: {}", e)))?;

    let tokens = state.session_issuer.generate_tokens(user.id, &address)?;

    tracing::debug!(user_id = %user.id, "Refreshed session tokens");

    Ok(Json(LoginResponse {
        user: user.into(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// GET /auth/me - Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let stored = state
        .auth_service
        .find_user(user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // The token must still describe the stored wallet
    if stored.address != user.address {
        tracing::warn!(user_id = %stored.id, "Access token address does not match user");
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    Ok(Json(stored.into()))
}
