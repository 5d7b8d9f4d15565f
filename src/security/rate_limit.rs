//! Sliding-window rate limiting for authentication endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::http::server::AppState;
use crate::observability::event_log::{Metadata, SecurityEvent, SecuritySeverity};
use crate::observability::metrics;

/// Returned by [`RateLimiter::check`] when an identifier has exhausted its
/// quota for the current window. Expected and recoverable; callers map it to
/// a 429 response rather than letting it propagate as a fault.
#[derive(Debug, Error)]
#[error("rate limit exceeded, retry in {}s", retry_after.as_secs())]
pub struct RateLimitExceeded {
    /// Time until the oldest in-window request falls out of the window.
    pub retry_after: Duration,
}

/// Read-only quota bookkeeping, used to populate `X-RateLimit-*` headers.
#[derive(Debug, Clone, Copy)]
pub struct QuotaSnapshot {
    pub limit: usize,
    pub remaining: usize,
    /// Time until the window frees a slot (the full window for an idle
    /// identifier).
    pub reset_after: Duration,
}

/// Per-identifier sliding-window request counter.
///
/// Every tracked request keeps its own timestamp, so the window slides
/// continuously instead of resetting on fixed boundaries. Timestamps older
/// than the window are filtered lazily on the next access for that
/// identifier; there is no background sweep. Memory per identifier is
/// bounded by `max_requests`, but idle identifiers are only reclaimed by
/// [`RateLimiter::reset`] or process restart.
///
/// State is per-process. Horizontally scaled deployments each enforce the
/// limit independently.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub const DEFAULT_MAX_REQUESTS: usize = 5;
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Record a request for `identifier`, failing if the quota is already
    /// spent. The sole mutating, enforcing entry point: call before the
    /// guarded action runs.
    pub fn check(&self, identifier: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(identifier, Instant::now())
    }

    /// Whether `identifier` is currently at or over the limit. Never
    /// mutates state or consumes quota.
    pub fn is_limited(&self, identifier: &str) -> bool {
        self.is_limited_at(identifier, Instant::now())
    }

    /// Requests left in the current window, floored at zero.
    pub fn remaining(&self, identifier: &str) -> usize {
        self.quota_at(identifier, Instant::now()).remaining
    }

    /// Snapshot of limit, remaining quota and reset time for headers.
    pub fn quota(&self, identifier: &str) -> QuotaSnapshot {
        self.quota_at(identifier, Instant::now())
    }

    /// Drop all tracked state for `identifier`. Administrative override:
    /// the next `check` is guaranteed to succeed.
    pub fn reset(&self, identifier: &str) {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        windows.remove(identifier);
    }

    fn check_at(&self, identifier: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let recent = windows.entry(identifier.to_string()).or_default();
        recent.retain(|&t| now.duration_since(t) < self.window);

        if recent.len() >= self.max_requests {
            // Append order means the first retained timestamp is the oldest.
            let oldest = recent[0];
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(RateLimitExceeded { retry_after });
        }

        recent.push(now);
        Ok(())
    }

    fn is_limited_at(&self, identifier: &str, now: Instant) -> bool {
        self.in_window_count(identifier, now) >= self.max_requests
    }

    fn quota_at(&self, identifier: &str, now: Instant) -> QuotaSnapshot {
        let windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let in_window: Vec<Instant> = windows
            .get(identifier)
            .map(|recent| {
                recent
                    .iter()
                    .copied()
                    .filter(|&t| now.duration_since(t) < self.window)
                    .collect()
            })
            .unwrap_or_default();

        let reset_after = in_window
            .first()
            .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
            .unwrap_or(self.window);

        QuotaSnapshot {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(in_window.len()),
            reset_after,
        }
    }

    fn in_window_count(&self, identifier: &str, now: Instant) -> usize {
        let windows = self.windows.lock().expect("rate limiter mutex poisoned");
        windows
            .get(identifier)
            .map(|recent| {
                recent
                    .iter()
                    .filter(|&&t| now.duration_since(t) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_REQUESTS, Self::DEFAULT_WINDOW)
    }
}

/// Resolve the caller identifier: first `X-Forwarded-For` entry, else the
/// peer address, else the `"unknown"` sentinel. The raw string is the key;
/// no further normalization.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware guarding sensitive routes.
///
/// Rejections produce a 429 with retry guidance and are recorded as a
/// SECURITY event; successful passes get quota headers stamped onto the
/// inner handler's response.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limit.enabled {
        return next.run(request).await;
    }

    let identifier = client_identifier(request.headers(), Some(addr));
    let path = request.uri().path().to_string();

    match state.limiter.check(&identifier) {
        Ok(()) => {
            let mut response = next.run(request).await;
            apply_quota_headers(response.headers_mut(), &state.limiter.quota(&identifier));
            response
        }
        Err(err) => {
            tracing::warn!(client = %identifier, path = %path, "Rate limit exceeded");
            metrics::record_rate_limited("auth");

            let mut metadata = Metadata::new();
            metadata.insert("path".to_string(), json!(path));
            state.log.security(
                "RATE_LIMIT_EXCEEDED",
                SecurityEvent {
                    user_id: None,
                    ip: Some(identifier.clone()),
                    severity: SecuritySeverity::Medium,
                    metadata: Some(metadata),
                },
            );

            let body = Json(json!({
                "success": false,
                "error": "Too many requests. Please try again later.",
            }));
            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            apply_quota_headers(response.headers_mut(), &state.limiter.quota(&identifier));
            if let Ok(value) = HeaderValue::from_str(&err.retry_after.as_secs().max(1).to_string())
            {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

fn apply_quota_headers(headers: &mut HeaderMap, quota: &QuotaSnapshot) {
    let entries = [
        ("x-ratelimit-limit", quota.limit.to_string()),
        ("x-ratelimit-remaining", quota.remaining.to_string()),
        ("x-ratelimit-reset", quota.reset_after.as_secs().to_string()),
    ];
    for (name, value) in entries {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(5, Duration::from_millis(60_000))
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = limiter();
        let t0 = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("ip-1", t0).is_ok());
        }

        let err = limiter
            .check_at("ip-1", t0 + Duration::from_millis(1_000))
            .unwrap_err();
        assert_eq!(err.retry_after, Duration::from_millis(59_000));
    }

    #[test]
    fn test_window_expiry_frees_quota() {
        let limiter = limiter();
        let t0 = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("ip-1", t0).is_ok());
        }
        assert!(limiter
            .check_at("ip-1", t0 + Duration::from_millis(1_000))
            .is_err());

        // First timestamp is now outside the 60s window.
        assert!(limiter
            .check_at("ip-1", t0 + Duration::from_millis(61_000))
            .is_ok());
    }

    #[test]
    fn test_remaining_never_negative() {
        let limiter = limiter();
        let t0 = Instant::now();

        assert_eq!(limiter.quota_at("ip-1", t0).remaining, 5);
        for expected in (0..5).rev() {
            limiter.check_at("ip-1", t0).unwrap();
            assert_eq!(limiter.quota_at("ip-1", t0).remaining, expected);
        }
        assert!(limiter.check_at("ip-1", t0).is_err());
        assert_eq!(limiter.quota_at("ip-1", t0).remaining, 0);
    }

    #[test]
    fn test_is_limited_does_not_mutate() {
        let limiter = limiter();
        let t0 = Instant::now();

        for _ in 0..4 {
            limiter.check_at("ip-1", t0).unwrap();
        }
        for _ in 0..10 {
            assert!(!limiter.is_limited_at("ip-1", t0));
        }
        // The fifth slot is still available after repeated inspection.
        assert!(limiter.check_at("ip-1", t0).is_ok());
        assert!(limiter.is_limited_at("ip-1", t0));
    }

    #[test]
    fn test_reset_clears_identifier() {
        let limiter = limiter();
        let t0 = Instant::now();

        for _ in 0..5 {
            limiter.check_at("ip-1", t0).unwrap();
        }
        assert!(limiter.check_at("ip-1", t0).is_err());

        limiter.reset("ip-1");
        assert!(limiter.check_at("ip-1", t0).is_ok());
    }

    #[test]
    fn test_identifiers_are_independent() {
        let limiter = limiter();
        let t0 = Instant::now();

        for _ in 0..5 {
            limiter.check_at("ip-1", t0).unwrap();
        }
        assert!(limiter.check_at("ip-1", t0).is_err());
        assert!(limiter.check_at("ip-2", t0).is_ok());
    }

    #[test]
    fn test_quota_reset_after_tracks_oldest() {
        let limiter = limiter();
        let t0 = Instant::now();

        limiter.check_at("ip-1", t0).unwrap();
        let quota = limiter.quota_at("ip-1", t0 + Duration::from_millis(10_000));
        assert_eq!(quota.reset_after, Duration::from_millis(50_000));

        // Idle identifier reports the full window.
        let idle = limiter.quota_at("ip-2", t0);
        assert_eq!(idle.reset_after, Duration::from_millis(60_000));
    }

    #[test]
    fn test_client_identifier_precedence() {
        let peer: SocketAddr = "192.0.2.7:443".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.4, 10.0.0.1"),
        );
        assert_eq!(client_identifier(&headers, Some(peer)), "203.0.113.4");

        let empty = HeaderMap::new();
        assert_eq!(client_identifier(&empty, Some(peer)), "192.0.2.7");
        assert_eq!(client_identifier(&empty, None), "unknown");
    }
}
