//! Test helper utilities for vendor-api-harness integration tests
//!
//! Fixtures shared by the scenario suites: a wiremock server standing in for
//! the vendor host, a token endpoint on it, and helpers pointed at it.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use chrono::{SecondsFormat, TimeDelta, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use vendor_api_harness::retry::RetryPolicy;
use vendor_api_harness::{init_test_logging, ApiConfigParameters, ApiHelper, ReqwestTransport};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_ACCOUNT: &str = "acme";
pub const TEST_KEY_ID: &str = "ACME_1234567890ABCDEF";
pub const TEST_SECRET: &str = "_0123456789abcdef";
pub const TEST_EXPIRY_SECONDS: u64 = 3600;
pub const TEST_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.test.token";

pub const TOKENS_PATH: &str = "/api/v2/access/tokens";

pub fn create_test_params() -> ApiConfigParameters {
    ApiConfigParameters {
        key_id: Some(TEST_KEY_ID.to_string()),
        key_expiry_seconds: Some(TEST_EXPIRY_SECONDS),
        account_name: Some(TEST_ACCOUNT.to_string()),
        secret_key: Some(TEST_SECRET.to_string()),
    }
}

/// Retry policy with millisecond delays so retry tests stay fast.
pub fn create_fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        total_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(2),
    }
}

/// Start a mock vendor host with logging enabled.
pub async fn start_vendor_mock() -> MockServer {
    init_test_logging();
    MockServer::start().await
}

/// Helper whose endpoints all resolve against `server`.
pub fn create_mock_server_helper(server: &MockServer) -> ApiHelper<ReqwestTransport> {
    create_mock_server_helper_with(server, create_test_params())
}

pub fn create_mock_server_helper_with(
    server: &MockServer,
    params: ApiConfigParameters,
) -> ApiHelper<ReqwestTransport> {
    ApiHelper::with_api_root(
        params,
        ReqwestTransport::with_retry_policy(create_fast_retry_policy()),
        server.uri(),
    )
}

/// `expiresAt` as the vendor formats it: `yyyy-MM-ddTHH:mm:ss.SSSZ`.
pub fn expires_at_in(seconds: i64) -> String {
    (Utc::now() + TimeDelta::seconds(seconds)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn token_response(token: &str, expires_in_seconds: i64) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({
        "token": token,
        "expiresAt": expires_at_in(expires_in_seconds),
    }))
}

/// Mount an issuance endpoint that only answers correctly formed requests
/// for the test credentials.
pub async fn mount_token_endpoint(server: &MockServer, token: &str, expires_in_seconds: i64) {
    Mock::given(method("POST"))
        .and(path(TOKENS_PATH))
        .and(header("content-type", "application/json"))
        .and(header("x-secret-key", TEST_SECRET))
        .and(body_json(json!({
            "keyId": TEST_KEY_ID,
            "expiryTime": TEST_EXPIRY_SECONDS,
        })))
        .respond_with(token_response(token, expires_in_seconds))
        .mount(server)
        .await;
}

/// Mount `GET {path}` answering `body` only when the test token is presented.
pub async fn mount_authorized_get(server: &MockServer, resource_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(resource_path))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
