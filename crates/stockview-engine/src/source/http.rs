//! `reqwest`-backed [`StockSource`] for the upstream warehouse API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use stockview_core::{AppConfig, RequestHeader};

use super::StockSource;
use crate::error::FetchError;
use crate::retry::retry_with_backoff;

const CATALOG_RESOURCE: &str = "products";
const AVAILABILITY_RESOURCE: &str = "availability";

/// HTTP client for `GET {endpoint}/products/{category}` and
/// `GET {endpoint}/availability/{manufacturer}`.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. Rate limits, network failures, and 5xx responses are
/// retried with exponential backoff up to `max_retries` additional attempts.
pub struct HttpStockSource {
    client: Client,
    api_endpoint: Url,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    backoff_base_secs: u64,
}

impl HttpStockSource {
    /// Creates a source with the given endpoint, static headers, timeout,
    /// `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`]: `api_endpoint` is not an absolute base URL.
    /// - [`FetchError::InvalidHeader`]: a header name or value is not valid HTTP.
    /// - [`FetchError::Http`]: the underlying `reqwest::Client` cannot be built.
    pub fn new(
        api_endpoint: &str,
        headers: &[RequestHeader],
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, FetchError> {
        let endpoint = Url::parse(api_endpoint).map_err(|e| FetchError::InvalidUrl {
            url: api_endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl {
                url: api_endpoint.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(header_map(headers)?)
            .build()?;

        Ok(Self {
            client,
            api_endpoint: endpoint,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Creates a source from the application configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpStockSource::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            &config.api_endpoint,
            &config.headers,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
    }

    /// Builds `{endpoint}/{resource}/{key}`, percent-encoding `key` as a
    /// single path segment.
    fn resource_url(&self, resource: &str, key: &str) -> Result<String, FetchError> {
        let mut url = self.api_endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl {
                url: self.api_endpoint.to_string(),
                reason: "URL cannot be used as a base".to_owned(),
            })?
            .pop_if_empty()
            .push(resource)
            .push(key);
        Ok(url.to_string())
    }

    async fn get_body(&self, url: String) -> Result<Vec<u8>, FetchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(FetchError::RateLimited {
                        url,
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(FetchError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(FetchError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.bytes().await?;
                tracing::debug!(url, bytes = body.len(), "fetched upstream body");
                Ok(body.to_vec())
            }
        })
        .await
    }
}

impl StockSource for HttpStockSource {
    async fn fetch_catalog(&self, category: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.resource_url(CATALOG_RESOURCE, category)?;
        self.get_body(url).await
    }

    async fn fetch_availability(&self, manufacturer: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.resource_url(AVAILABILITY_RESOURCE, manufacturer)?;
        self.get_body(url).await
    }
}

/// Converts configured headers into a `HeaderMap`, marking every value
/// sensitive so it is never printed by `reqwest`'s `Debug` output.
fn header_map(headers: &[RequestHeader]) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for header in headers {
        let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|e| {
            FetchError::InvalidHeader {
                name: header.name.clone(),
                reason: e.to_string(),
            }
        })?;
        let mut value =
            HeaderValue::from_str(&header.value).map_err(|e| FetchError::InvalidHeader {
                name: header.name.clone(),
                reason: e.to_string(),
            })?;
        value.set_sensitive(true);
        map.append(name, value);
    }
    Ok(map)
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
