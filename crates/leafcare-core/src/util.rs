//! Shared HTTP helpers for the external API clients.

use std::time::Duration;

use reqwest::Client;

use crate::error::{Error, Result};

/// Default timeout for outbound API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Strip a trailing slash and require an http(s) scheme.
///
/// # Example
///
/// ```
/// use leafcare_core::util::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.plant.id/v3/").unwrap(), "https://api.plant.id/v3");
/// assert!(normalize_base_url("api.plant.id").is_err());
/// ```
pub fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

/// Build a reqwest client with the given request timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(Error::Request)
}

/// Turn a non-success response into [`Error::Api`], keeping the body text.
pub(crate) async fn api_error(service: &'static str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());

    Error::Api {
        service,
        status: status.as_u16(),
        body,
    }
}
