//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AuthService, JwtSessionIssuer};
use crate::middleware::RateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub session_issuer: Arc<JwtSessionIssuer>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        session_issuer: Arc<JwtSessionIssuer>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            auth_service,
            session_issuer,
            rate_limiter,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<JwtSessionIssuer> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_issuer.clone()
    }
}
