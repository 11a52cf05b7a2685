//! URL origin and domain helpers.

use crate::error::ScraperError;

/// Scheme + host (+ port) of a configured store URL.
///
/// `"https://spar.example/ka/"` becomes `"https://spar.example"`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidBaseUrl`] when the URL does not parse or
/// has no host.
pub fn extract_store_origin(base_url: &str) -> Result<String, ScraperError> {
    let url = reqwest::Url::parse(base_url).map_err(|e| ScraperError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: "URL has no host".to_owned(),
        });
    }
    Ok(url.origin().ascii_serialization())
}

/// Hostname for error messages. Falls back to the input when unparseable.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
