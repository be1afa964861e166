//! Middleware for the auth server
//!
//! This module provides middleware for request tracing, security headers,
//! per-client rate limiting and access-token authentication.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::{AuthenticatedUser, BearerRejection};
pub use rate_limiter::{rate_limit, run_rate_limiter_cleanup, RateLimiter};
pub use security::{hsts_header, security_headers};
pub use tracing::request_tracing;
