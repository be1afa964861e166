//! Service banner and health check

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub user_directory: String,
    pub user_directory_backend: String,
    pub outstanding_nonces: usize,
    pub version: String,
}

/// GET / - Service banner
pub async fn root() -> &'static str {
    "Marketplace Auth API Server"
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let users = state.auth_service.users();

    let (status, directory_status) = match users.check_health().await {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            tracing::error!(error = %e, backend = users.backend(), "User directory health check failed");
            ("unhealthy", "error")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        user_directory: directory_status.to_string(),
        user_directory_backend: users.backend().to_string(),
        outstanding_nonces: state.auth_service.nonce_store().len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
