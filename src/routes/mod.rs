//! Route definitions for the auth server API

mod auth;
mod health;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;
pub use health::health_routes;

/// Assemble the full application router with its middleware stack
pub fn app_router(app_state: AppState, config: &Config) -> Router {
    let auth = auth_routes().route_layer(axum::middleware::from_fn_with_state(
        app_state.rate_limiter.clone(),
        middleware::rate_limit,
    ));

    let router = Router::new()
        .merge(health_routes())
        .merge(auth)
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers));

    let router = if config.environment.is_production() {
        router.layer(axum::middleware::from_fn(middleware::hsts_header))
    } else {
        router
    };

    router
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()))
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default().trim();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
