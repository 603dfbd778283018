//! Endpoint construction and bearer-token lifecycle.
//!
//! [`ApiHelper`] is built once per suite from [`ApiConfigParameters`] and a
//! transport, then passed to each test. It owns the only token slot:
//!
//! ```text
//! Unset --issue_token--> Valid --(time passes)--> Expired
//!                          ^                         |
//!                          +-------issue_token-------+
//! ```
//!
//! Issuing always replaces the stored token, whatever its current state.
//! Expiry is evaluated lazily by [`ApiHelper::is_token_valid`].

use crate::config::{
    ApiConfigParameters, API_ACCESS_KEY_ID_KEY, CUSTOMER_ACCOUNT_NAME_KEY, SECRET_KEY_KEY,
};
use crate::error::{ApiResult, ApiTestError};
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::logging::{log_debug, log_info};
use crate::status;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{json, Value};

/// Host used when no API root override is given. `{account}` is replaced
/// with the configured account name.
pub const DEFAULT_API_ROOT: &str = "https://{account}.example.net";
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";
pub const API_VERSION_PATH: &str = "api/v2";

pub const ACCESS_TOKENS_RESOURCE: &str = "access/tokens";
pub const DEFAULT_TOKEN_EXPIRY_SECONDS: u64 = 3600;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const SECRET_KEY_HEADER: &str = "X-Secret-Key";
pub const APPLICATION_JSON: &str = "application/json";

pub const TOKEN_FIELD: &str = "token";
pub const EXPIRES_AT_FIELD: &str = "expiresAt";

/// A bearer token minted by [`ApiHelper::issue_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    value: String,
    created_at: DateTime<Utc>,
    expiry_seconds: u64,
    server_expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the token response was received.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Lifetime that was requested for this token.
    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// The `expiresAt` instant reported by the service, if it was parseable.
    pub fn server_expires_at(&self) -> Option<DateTime<Utc>> {
        self.server_expires_at
    }

    /// `created_at + expiry_seconds`, saturating at the latest
    /// representable instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.expiry_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| self.created_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Time left before expiry at `now`; negative once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> TimeDelta {
        self.expires_at() - now
    }
}

/// Builds endpoint URLs and manages the bearer token for one account.
pub struct ApiHelper<T: HttpTransport = ReqwestTransport> {
    params: ApiConfigParameters,
    api_root: String,
    transport: T,
    access_token: Option<BearerToken>,
}

impl ApiHelper<ReqwestTransport> {
    /// Helper over a `reqwest` transport with the default retry policy.
    pub fn from_params(params: ApiConfigParameters) -> Self {
        Self::new(params, ReqwestTransport::new())
    }
}

impl<T: HttpTransport> ApiHelper<T> {
    /// Helper targeting [`DEFAULT_API_ROOT`].
    pub fn new(params: ApiConfigParameters, transport: T) -> Self {
        Self::with_api_root(params, transport, DEFAULT_API_ROOT)
    }

    /// Helper targeting `api_root` instead of the vendor host, e.g. a mock
    /// server. `api_root` may contain [`ACCOUNT_PLACEHOLDER`].
    pub fn with_api_root(
        params: ApiConfigParameters,
        transport: T,
        api_root: impl Into<String>,
    ) -> Self {
        let api_root = api_root.into().trim_end_matches('/').to_string();
        log_debug!(
            api_root = %api_root,
            has_account_name = params.account_name.is_some(),
            has_key_id = params.key_id.is_some(),
            "Creating API helper"
        );

        Self {
            params,
            api_root,
            transport,
            access_token: None,
        }
    }

    pub fn params(&self) -> &ApiConfigParameters {
        &self.params
    }

    pub fn key_id(&self) -> Option<&str> {
        self.params.key_id.as_deref()
    }

    pub fn key_expiry_seconds(&self) -> Option<u64> {
        self.params.key_expiry_seconds
    }

    pub fn account_name(&self) -> Option<&str> {
        self.params.account_name.as_deref()
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.params.secret_key.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The last token this helper minted, if any.
    pub fn access_token(&self) -> Option<&BearerToken> {
        self.access_token.as_ref()
    }

    /// Full URL for `resource_path`, or `None` if the account name or the
    /// resource path is missing or empty.
    pub fn endpoint_url(&self, resource_path: &str) -> Option<String> {
        let account_name = self.account_name().filter(|name| !name.is_empty())?;
        if resource_path.is_empty() {
            return None;
        }

        let root = self.api_root.replace(ACCOUNT_PLACEHOLDER, account_name);
        Some(format!("{root}/{API_VERSION_PATH}/{resource_path}"))
    }

    /// Request a new bearer token valid for `expiry_seconds` and store it.
    ///
    /// The previous token is replaced only when issuance succeeds.
    ///
    /// # Errors
    ///
    /// - [`ApiTestError::MissingParameter`] if the account name, key id or
    ///   secret is unset or empty; nothing is sent
    /// - [`ApiTestError::TokenIssuanceError`] on a non-2xx status or a body
    ///   without a string `token` field
    /// - transport errors from the underlying [`HttpTransport`]
    pub async fn issue_token(&mut self, expiry_seconds: u64) -> ApiResult<String> {
        let url = self
            .endpoint_url(ACCESS_TOKENS_RESOURCE)
            .ok_or_else(|| ApiTestError::missing_parameter(CUSTOMER_ACCOUNT_NAME_KEY))?;
        let key_id = self
            .key_id()
            .filter(|key_id| !key_id.is_empty())
            .ok_or_else(|| ApiTestError::missing_parameter(API_ACCESS_KEY_ID_KEY))?;
        let secret_key = self
            .secret_key()
            .filter(|secret_key| !secret_key.is_empty())
            .ok_or_else(|| ApiTestError::missing_parameter(SECRET_KEY_KEY))?;

        let mut headers = Self::content_type_header(APPLICATION_JSON);
        headers.insert(SECRET_KEY_HEADER.to_string(), secret_key.to_string());
        let body = json!({
            "keyId": key_id,
            "expiryTime": expiry_seconds,
        });

        log_debug!(
            url = %url,
            expiry_seconds = expiry_seconds,
            "Requesting new bearer access token"
        );

        let response = self
            .transport
            .send(HttpRequest::post_json(url.as_str(), headers, body))
            .await?;
        let (value, server_expires_at) = extract_token(&url, &response)?;

        self.access_token = Some(BearerToken {
            value: value.clone(),
            created_at: Utc::now(),
            expiry_seconds,
            server_expires_at,
        });

        log_info!(
            expiry_seconds = expiry_seconds,
            server_expires_at = ?server_expires_at,
            "Issued new bearer access token"
        );

        Ok(value)
    }

    /// [`issue_token`](Self::issue_token) with the configured key expiry,
    /// or [`DEFAULT_TOKEN_EXPIRY_SECONDS`] when none is configured.
    pub async fn issue_default_token(&mut self) -> ApiResult<String> {
        let expiry_seconds = self
            .key_expiry_seconds()
            .unwrap_or(DEFAULT_TOKEN_EXPIRY_SECONDS);
        self.issue_token(expiry_seconds).await
    }

    pub fn is_token_valid(&self) -> bool {
        self.is_token_valid_at(Utc::now())
    }

    /// True only if a token exists and its remaining lifetime at `now` is
    /// positive.
    pub fn is_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token_remaining(now)
            .is_some_and(|remaining| remaining > TimeDelta::zero())
    }

    pub fn token_remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.access_token
            .as_ref()
            .map(|token| token.remaining_at(now))
    }

    /// `{"Authorization": "Bearer <token>"}`
    pub fn authorization_header(token: &str) -> Headers {
        Headers::from([(AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}"))])
    }

    /// `{"Content-Type": <mime_type>}`
    pub fn content_type_header(mime_type: &str) -> Headers {
        Headers::from([(CONTENT_TYPE_HEADER.to_string(), mime_type.to_string())])
    }

    /// GET `resource_path` with a freshly issued token.
    pub async fn get(&mut self, resource_path: &str) -> ApiResult<HttpResponse> {
        self.send_authorized(HttpMethod::Get, resource_path, None)
            .await
    }

    /// POST `body` as JSON to `resource_path` with a freshly issued token.
    pub async fn post_json(&mut self, resource_path: &str, body: Value) -> ApiResult<HttpResponse> {
        self.send_authorized(HttpMethod::Post, resource_path, Some(body))
            .await
    }

    /// Issue a token with the default expiry and send an authorized request.
    /// A JSON body also sets `Content-Type: application/json`.
    ///
    /// # Errors
    ///
    /// [`ApiTestError::MissingParameter`] if the endpoint cannot be built,
    /// token issuance errors, and transport errors. Non-2xx responses are
    /// returned as responses.
    pub async fn send_authorized(
        &mut self,
        method: HttpMethod,
        resource_path: &str,
        body: Option<Value>,
    ) -> ApiResult<HttpResponse> {
        let url = self.require_endpoint(resource_path)?;
        let token = self.issue_default_token().await?;

        let mut headers = Self::authorization_header(&token);
        if body.is_some() {
            headers.extend(Self::content_type_header(APPLICATION_JSON));
        }

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        self.transport.send(request).await
    }

    fn require_endpoint(&self, resource_path: &str) -> ApiResult<String> {
        if self.account_name().map_or(true, str::is_empty) {
            return Err(ApiTestError::missing_parameter(CUSTOMER_ACCOUNT_NAME_KEY));
        }
        self.endpoint_url(resource_path)
            .ok_or_else(|| ApiTestError::missing_parameter("resource_path"))
    }
}

/// Pull the token and optional `expiresAt` out of an issuance response.
fn extract_token(
    url: &str,
    response: &HttpResponse,
) -> ApiResult<(String, Option<DateTime<Utc>>)> {
    let status_code = response.status_code;
    if !status::is_success(status_code) {
        return Err(ApiTestError::token_issuance_failed(
            Some(status_code),
            format!("{url} returned status {status_code}: {}", preview(&response.text)),
        ));
    }

    let Some(body) = response.json().and_then(Value::as_object) else {
        return Err(ApiTestError::token_issuance_failed(
            Some(status_code),
            format!("{url} did not return a JSON object"),
        ));
    };

    let Some(token) = body.get(TOKEN_FIELD).and_then(Value::as_str) else {
        return Err(ApiTestError::token_issuance_failed(
            Some(status_code),
            format!("{url} response has no string \"{TOKEN_FIELD}\" field"),
        ));
    };

    let server_expires_at = body
        .get(EXPIRES_AT_FIELD)
        .and_then(Value::as_str)
        .and_then(parse_expires_at);

    Ok((token.to_string(), server_expires_at))
}

/// Parse an ISO-8601 UTC timestamp such as `2024-05-01T12:00:00.000Z`.
pub fn parse_expires_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

fn preview(text: &str) -> String {
    let preview: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        format!("{preview}...")
    } else {
        preview
    }
}
