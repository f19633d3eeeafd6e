use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Auth over an explicit key set; disabled when the set is empty.
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        let api_keys: HashSet<String> = keys
            .into_iter()
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            enabled: !api_keys.is_empty(),
            api_keys: Arc::new(api_keys),
        }
    }

    /// Builds auth config from `APPSCOUT_API_KEYS` (comma-separated tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("APPSCOUT_API_KEYS").unwrap_or_default();
        let state = Self::new(raw.split(',').map(ToOwned::to_owned));

        if !state.enabled {
            if is_development {
                tracing::warn!(
                    "APPSCOUT_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(state);
            }
            anyhow::bail!(
                "APPSCOUT_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(state)
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

/// Fixed-window request limiter shared across all API routes.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    inner: Arc<Mutex<Window>>,
}

#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: usize,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            inner: Arc::new(Mutex::new(Window {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Counts one request against the current window. Returns `false` when
    /// the window is full.
    async fn try_admit(&self) -> bool {
        let mut window = self.inner.lock().await;
        if window.started_at.elapsed() >= self.window {
            window.started_at = Instant::now();
            window.count = 0;
        }
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn middleware_error(
    status: StatusCode,
    code: &'static str,
    message: &'static str,
) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused; otherwise a fresh `UUIDv4`
/// is generated. The ID is stored in request extensions as [`RequestId`]
/// and echoed on the response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => middleware_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if !rate_limit.try_admit().await {
        return middleware_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }
    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn extract_bearer_token_rejects_empty_token() {
        let header = HeaderValue::from_static("Bearer ");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_ignores_blank_keys() {
        let state = AuthState::new(vec![" ".to_string(), String::new()]);
        assert!(!state.enabled);

        let state = AuthState::new(vec!["key-one".to_string(), " ".to_string()]);
        assert!(state.enabled);
        assert!(state.allows("key-one"));
        assert!(!state.allows("other"));
    }

    #[tokio::test]
    async fn rate_limit_admits_up_to_max_then_rejects() {
        let limit = RateLimitState::new(2, Duration::from_secs(60));
        assert!(limit.try_admit().await);
        assert!(limit.try_admit().await);
        assert!(!limit.try_admit().await);
    }

    #[tokio::test]
    async fn rate_limit_window_resets() {
        let limit = RateLimitState::new(1, Duration::from_millis(10));
        assert!(limit.try_admit().await);
        assert!(!limit.try_admit().await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(limit.try_admit().await);
    }
}
