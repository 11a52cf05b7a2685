//! Request plumbing shared by every route: request ids, bearer keys and the
//! request budget. Rejections use the same error envelope as the handlers.

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;
const API_KEYS_VAR: &str = "PRICEWATCH_API_KEYS";

/// The id of the request being served, set by [`request_id`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// A caller-supplied id is kept when it is short printable ASCII.
    fn from_header(value: Option<&HeaderValue>) -> Self {
        let supplied = value
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| {
                !v.is_empty()
                    && v.len() <= MAX_REQUEST_ID_LEN
                    && v.bytes().all(|b| b.is_ascii_graphic())
            });
        Self(supplied.map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned))
    }

    fn of(req: &Request) -> String {
        req.extensions()
            .get::<Self>()
            .map(|id| id.0.clone())
            .unwrap_or_default()
    }
}

/// Bearer keys accepted on protected routes. `None` means auth is off.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Option<Arc<HashSet<String>>>,
}

impl AuthState {
    /// Reads comma-separated keys from `PRICEWATCH_API_KEYS`.
    ///
    /// # Errors
    ///
    /// Fails outside development when no key is configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(API_KEYS_VAR).unwrap_or_default();
        Self::from_raw_keys(&raw, is_development)
    }

    pub(crate) fn from_raw_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (keys.is_empty(), is_development) {
            (false, _) => Ok(Self {
                keys: Some(Arc::new(keys)),
            }),
            (true, true) => {
                tracing::warn!("{API_KEYS_VAR} is empty; protected routes are open in development");
                Ok(Self { keys: None })
            }
            (true, false) => {
                anyhow::bail!("{API_KEYS_VAR} must list at least one key outside development")
            }
        }
    }

    /// `true` when the request may proceed.
    fn admits(&self, authorization: Option<&HeaderValue>) -> bool {
        let Some(keys) = &self.keys else {
            return true;
        };
        bearer_token(authorization).is_some_and(|token| keys.contains(token))
    }
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    used: usize,
}

/// Fixed-window request budget shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    budget: usize,
    window: Duration,
    current: Arc<Mutex<Window>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(budget: usize, window: Duration) -> Self {
        Self {
            budget,
            window,
            current: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                used: 0,
            })),
        }
    }

    /// Spends one request from the budget at `now`. On refusal returns how
    /// long until the window reopens.
    async fn take(&self, now: Instant) -> Result<(), Duration> {
        let mut current = self.current.lock().await;
        let elapsed = now.saturating_duration_since(current.opened_at);
        if elapsed >= self.window {
            current.opened_at = now;
            current.used = 0;
        }
        if current.used >= self.budget {
            return Err(self.window.saturating_sub(elapsed));
        }
        current.used += 1;
        Ok(())
    }
}

/// Tags the request with a [`RequestId`] and echoes it in `x-request-id`.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_header(req.headers().get(REQUEST_ID_HEADER));
    let echoed = HeaderValue::from_str(&id.0).ok();
    req.extensions_mut().insert(id);

    let mut res = next.run(req).await;
    if let Some(value) = echoed {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if auth.admits(req.headers().get(header::AUTHORIZATION)) {
        return next.run(req).await;
    }
    ApiError::new(
        RequestId::of(&req),
        "unauthorized",
        "missing or invalid bearer token",
    )
    .into_response()
}

pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    match rate_limit.take(Instant::now()).await {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(path = %req.uri().path(), "rate limit exceeded");
            let mut res =
                ApiError::new(RequestId::of(&req), "rate_limited", "rate limit exceeded")
                    .into_response();
            let secs = retry_after.as_secs().max(1);
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            res
        }
    }
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
