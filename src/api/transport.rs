// src/api/transport.rs
//! HTTP transport for the v3 API.
//!
//! Every call is a JSON `POST` authenticated by the `token` session cookie.
//! The transport owns retries; nothing above it tries a request twice.

use super::parser::check_status;
use crate::config::{ClientConfig, RetryPolicy};
use crate::error::{AppError, Result};
use crate::error_recovery::retry_with_backoff;
use crate::types::{ApiToken, ValidatedUrl};
use reqwest::{header, Client, Response, StatusCode};
use serde_json::Value;

/// Result of an HTTP operation with response metadata.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: StatusCode,
    pub url: String,
}

/// The ability to post a JSON body to a named endpoint.
///
/// The core depends on this trait only, so tests can replay canned
/// responses without a network.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: &str, body: &Value) -> Result<ApiResponse<String>>;
}

/// `Transport` over reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: ValidatedUrl,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Creates a new HTTP transport carrying the session cookie.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(Self::create_headers(&config.token)?)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Creates the default headers for v3 requests.
    fn create_headers(token: &ApiToken) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();

        let mut cookie = header::HeaderValue::from_str(&token.cookie_value()).map_err(|e| {
            AppError::MissingConfiguration(format!("Invalid session token: {}", e))
        })?;
        cookie.set_sensitive(true);
        headers.insert(header::COOKIE, cookie);

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    async fn post_once(&self, url: &str, body: &Value) -> Result<ApiResponse<String>> {
        let response = self.client.post(url).json(body).send().await?;
        let result = extract_response_text(response).await?;
        log::debug!(
            "POST {} -> {} ({} bytes)",
            result.url,
            result.status,
            result.data.len()
        );
        check_status(result)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, body: &Value) -> Result<ApiResponse<String>> {
        let url = self.base_url.endpoint(endpoint)?.to_string();
        log::debug!("POST {}", url);
        log::trace!("Request body: {}", body);

        retry_with_backoff(|| self.post_once(&url, body), &self.retry).await
    }
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
