use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use thiserror::Error;

use crate::core::error::ConfigError;

/// Transport-level failure, classified before any vendor-specific mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("http status {status_code}: {body}")]
    Status { status_code: u16, body: String },
    #[error("connection failed: {message}")]
    Connect { message: String },
    #[error("request timed out: {message}")]
    Timeout { message: String },
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("invalid response body: {message}")]
    Decode { message: String },
}

impl TransportError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        let message = error.to_string();
        if error.is_timeout() {
            Self::Timeout { message }
        } else if error.is_connect() {
            Self::Connect { message }
        } else if error.is_decode() {
            Self::Decode { message }
        } else {
            Self::Request { message }
        }
    }
}

/// JSON-over-HTTP client shared by every adapter.
///
/// One attempt per call; the per-call timeout is applied by the underlying
/// client. Retrying across vendors is the manager's job.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration, default_headers: HeaderMap) -> Result<Self, ConfigError> {
        Self::validate_timeout(timeout)?;

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .map_err(|error| ConfigError::InvalidValue {
                key: "http_client".to_string(),
                value: format!("{timeout:?}"),
                reason: error.to_string(),
            })?;

        Ok(Self { client, timeout })
    }

    pub async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        self.execute_json_request(Method::GET, url, None).await
    }

    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        let payload = serde_json::to_vec(body).map_err(|error| TransportError::Request {
            message: format!("failed to encode request body: {error}"),
        })?;

        self.execute_json_request(Method::POST, url, Some(payload))
            .await
    }

    async fn execute_json_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Value, TransportError> {
        let mut request_builder = self.client.request(method, url).timeout(self.timeout);

        if let Some(payload) = body {
            request_builder = request_builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(payload);
        }

        let response = request_builder
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            let body = match response.text().await {
                Ok(body) if !body.trim().is_empty() => body,
                Ok(_) => format!("http status {status_code}"),
                Err(error) => {
                    format!("http status {status_code}; failed to read response body: {error}")
                }
            };
            return Err(TransportError::Status { status_code, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(TransportError::from_reqwest)?;

        serde_json::from_slice(&bytes).map_err(|error| TransportError::Decode {
            message: error.to_string(),
        })
    }

    fn validate_timeout(timeout: Duration) -> Result<(), ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                timeout_secs: timeout.as_secs(),
            });
        }
        Ok(())
    }
}

/// Trims and validates a base URL, dropping any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|error| format!("invalid base url {raw:?}: {error}"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!(
            "invalid base url {raw:?}: unsupported scheme {}",
            parsed.scheme()
        ));
    }

    Ok(trimmed.to_string())
}
