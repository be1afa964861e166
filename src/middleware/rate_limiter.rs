//! Per-client rate limiting for the auth endpoints
//!
//! Every `/auth/*` request takes one token from the caller's bucket. Nonce
//! requests are unauthenticated and each one can add a record to the nonce
//! store, so this is what keeps a single client from filling it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use super::tracing::client_ip;
use crate::error::ApiError;

/// Token bucket for one client
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_take(&mut self, now: Instant, refill_per_second: f64, capacity: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_per_second).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, TokenBucket>>,
    refill_per_second: f64,
    capacity: f64,
}

impl RateLimiter {
    /// Steady `requests_per_second` per client, with bursts up to twice that
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            refill_per_second: f64::from(requests_per_second),
            capacity: f64::from(requests_per_second) * 2.0,
        }
    }

    /// Take a token for `key`, returning whether the request may proceed
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::full(self.capacity, now));

        bucket.try_take(now, self.refill_per_second, self.capacity)
    }

    /// Forget clients idle for longer than `max_idle`
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        self.purge_idle_at(max_idle, Instant::now())
    }

    fn purge_idle_at(&self, max_idle: Duration, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_update) < max_idle);
        before.saturating_sub(self.buckets.len())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Reject over-limit requests with `429` and `Retry-After`
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);

    if !limiter.check(&client) {
        tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");

        let mut response =
            ApiError::TooManyRequests("Please try again later".to_string()).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        return response;
    }

    next.run(request).await
}

/// Forwarded client IP, else the socket peer, else a shared bucket
fn client_key(request: &Request) -> String {
    client_ip(request)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(peer)| peer.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Periodically drop idle buckets until the task is dropped
pub async fn run_rate_limiter_cleanup(limiter: RateLimiter, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let purged = limiter.purge_idle(period);
        if purged > 0 {
            tracing::debug!(purged, remaining = limiter.len(), "Purged idle rate-limit buckets");
        }
    }
}
