//! HTTP transport for the vendor API
//!
//! [`HttpTransport`] is the single network boundary. Implementations return
//! every completed exchange as an [`HttpResponse`], whatever its status;
//! only failures to complete the exchange are errors.

use crate::error::{ApiResult, ApiTestError};
use crate::logging::{log_debug, log_error};
use crate::retry::{RetryExecutor, RetryPolicy};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Header name → value mapping.
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    /// Serialized as the JSON request body when present.
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, headers: Headers) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers,
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, headers: Headers, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers,
            body: Some(body),
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    pub status_code: u16,
    /// Lower-cased header names; repeated headers joined with `", "`.
    pub headers: Headers,
    /// Decoded body, `None` when the body is empty or not JSON.
    pub json_body: Option<Value>,
    /// Raw body text, kept for diagnostics.
    pub text: String,
}

impl HttpResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.text = body.to_string();
        self.json_body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn json(&self) -> Option<&Value> {
        self.json_body.as_ref()
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `Retry-After` in its delay-seconds form.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// The HTTP client collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiTestError::RequestFailed`] or [`ApiTestError::Timeout`]
    /// when no response was received, and [`ApiTestError::InvalidHeader`]
    /// when a header cannot be encoded.
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse>;
}

/// [`HttpTransport`] backed by `reqwest`, with retry on transient failures.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    retry_executor: RetryExecutor,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_retry_policy(RetryPolicy::default())
    }

    pub fn with_retry_policy(retry_policy: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            retry_executor: RetryExecutor::new(retry_policy),
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.retry_executor.policy()
    }

    /// Convert a [`Headers`] mapping into a `reqwest` header map.
    pub fn build_header_map(headers: &Headers) -> ApiResult<HeaderMap> {
        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiTestError::invalid_header(name, e.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ApiTestError::invalid_header(name, e.to_string()))?;
            header_map.insert(header_name, header_value);
        }
        Ok(header_map)
    }

    /// Flatten a `reqwest` header map into [`Headers`].
    ///
    /// Names are lower-cased. Values of a repeated header are joined with
    /// `", "` in the order received. Values that are not visible ASCII are
    /// skipped.
    pub fn collect_headers(header_map: &HeaderMap) -> Headers {
        let mut headers = Headers::new();
        for (name, value) in header_map {
            let Ok(value) = value.to_str() else {
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|joined: &mut String| {
                    joined.push_str(", ");
                    joined.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        headers
    }

    async fn execute_single_request(
        &self,
        request: &HttpRequest,
        headers: &HeaderMap,
    ) -> ApiResult<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            log_error!(
                method = request.method.as_str(),
                url = %request.url,
                error = %e,
                "HTTP request failed"
            );
            ApiTestError::request_failed(format!("Request failed: {e}"), Some(Box::new(e)))
        })?;

        let status_code = response.status().as_u16();
        let response_headers = Self::collect_headers(response.headers());

        let text = response.text().await.map_err(|e| {
            ApiTestError::request_failed(
                format!("Failed to read response body: {e}"),
                Some(Box::new(e)),
            )
        })?;

        let json_body = decode_json_body(&text);

        log_debug!(
            method = request.method.as_str(),
            url = %request.url,
            status = status_code,
            body_length = text.len(),
            json_body = json_body.is_some(),
            "HTTP response received"
        );

        Ok(HttpResponse {
            status_code,
            headers: response_headers,
            json_body,
            text,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let headers = Self::build_header_map(&request.headers)?;
        let request = &request;
        let headers = &headers;
        self.retry_executor
            .execute(move || self.execute_single_request(request, headers))
            .await
    }
}

/// Decode a response body, `None` when empty or not JSON.
pub fn decode_json_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str(text).ok()
}
