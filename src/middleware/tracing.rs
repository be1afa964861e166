//! Request tracing middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Wrap each request in a span and log its outcome with timing
///
/// Only the method, path and client IP are recorded; request bodies carry
/// signatures and tokens and are never logged.
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_ip = client_ip(&request);
    let request_id = Uuid::new_v4();

    let span = tracing::info_span!(
        "http_request",
        %request_id,
        method = %method,
        path = %path,
        client_ip = ?client_ip,
    );

    async move {
        let start = Instant::now();
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis();
        let status = response.status().as_u16();

        if response.status().is_server_error() {
            tracing::error!(status, duration_ms, "Request completed with error");
        } else if response.status().is_client_error() {
            tracing::warn!(status, duration_ms, "Request completed with client error");
        } else {
            tracing::info!(status, duration_ms, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}

/// First hop from `X-Forwarded-For`, else `X-Real-IP`
pub(super) fn client_ip(request: &Request) -> Option<String> {
    let headers = request.headers();

    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(client_ip(&request), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_client_ip_missing() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&request), None);
    }
}
