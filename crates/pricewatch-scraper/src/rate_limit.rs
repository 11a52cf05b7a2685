//! Retry with exponential back-off and jitter for upstream catalog calls.
//!
//! Transient failures (HTTP 429, 5xx, network errors) are retried. Anything
//! that would fail the same way again (404, other 4xx, bad JSON, GraphQL
//! errors) is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

const MAX_DELAY_MS: u64 = 60_000;

pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::NotFound { .. }
        | ScraperError::Deserialize { .. }
        | ScraperError::Graphql { .. }
        | ScraperError::Normalization { .. }
        | ScraperError::PaginationLimit { .. }
        | ScraperError::InvalidBaseUrl { .. } => false,
    }
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`
/// with ±25 % jitter, raised to the server's `Retry-After` when larger and
/// capped at 60 s.
pub(crate) fn backoff_delay_ms(
    attempt: u32,
    backoff_base_secs: u64,
    retry_after_secs: Option<u64>,
) -> u64 {
    let base_ms = backoff_base_secs.saturating_mul(1000);
    let computed = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (computed.min(MAX_DELAY_MS) as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    let server_hint = retry_after_secs.map_or(0, |s| s.saturating_mul(1000));
    jittered.max(server_hint).min(MAX_DELAY_MS)
}

/// Runs `operation`, retrying transient failures up to `max_retries` more
/// times. The last error is returned once retries are exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let retry_after = match &err {
                    ScraperError::RateLimited {
                        retry_after_secs, ..
                    } => *retry_after_secs,
                    _ => None,
                };
                let delay_ms = backoff_delay_ms(attempt, backoff_base_secs, retry_after);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient upstream error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
