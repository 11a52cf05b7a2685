//! HTTP client for upstream store catalogs.

mod graphql;
mod json_catalog;
mod origin;
mod segments;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

pub use origin::{extract_domain, extract_store_origin};

/// Maximum number of pages walked per segment before giving up.
///
/// Each page may be retried up to `max_retries` times, so the worst-case
/// request count per segment is `MAX_PAGES * (1 + max_retries)`.
pub const MAX_PAGES: usize = 500;

/// HTTP client for the JSON catalog and GraphQL upstreams.
///
/// Non-2xx responses become typed [`ScraperError`]s. Transient failures
/// (429, 5xx, network) are retried with exponential back-off up to
/// `max_retries` additional attempts.
pub struct CatalogClient {
    pub(super) client: Client,
    pub(super) max_retries: u32,
    pub(super) backoff_base_secs: u64,
}

impl CatalogClient {
    /// Creates a client with the configured timeout, `User-Agent`, and retry
    /// policy. `max_retries = 0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// `GET url` and decode the body as `T`, with retries.
    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            decode_response(response, url, context).await
        })
        .await
    }

    /// `POST url` with a JSON body and decode the response as `T`, with retries.
    pub(super) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        context: &str,
    ) -> Result<T, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .post(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .json(body)
                .send()
                .await?;
            decode_response(response, url, context).await
        })
        .await
    }
}

async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
    url: &str,
    context: &str,
) -> Result<T, ScraperError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        return Err(ScraperError::RateLimited {
            domain: extract_domain(url),
            retry_after_secs,
        });
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str::<T>(&body).map_err(|e| ScraperError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
