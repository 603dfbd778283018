//! Test helper utilities for vendor-api-harness unit tests
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use crate::config::ApiConfigParameters;
use crate::helper::ApiHelper;
use crate::http::{HttpResponse, MockHttpTransport};
use crate::retry::RetryPolicy;
use serde_json::{json, Value};
use std::time::Duration;

/// Fully populated parameters for account "acme".
pub fn create_test_params() -> ApiConfigParameters {
    ApiConfigParameters {
        key_id: Some("ACME_KEY_ID".to_string()),
        key_expiry_seconds: Some(3600),
        account_name: Some("acme".to_string()),
        secret_key: Some("_secret".to_string()),
    }
}

/// Helper over a mock transport targeting the default vendor host.
pub fn create_mock_helper(transport: MockHttpTransport) -> ApiHelper<MockHttpTransport> {
    ApiHelper::new(create_test_params(), transport)
}

/// Body returned by a successful token issuance.
pub fn token_body(token: &str) -> Value {
    json!({
        "token": token,
        "expiresAt": "2030-01-01T00:00:00.000Z",
    })
}

pub fn created_token_response(token: &str) -> HttpResponse {
    HttpResponse::new(201).with_json(token_body(token))
}

/// Fast retry policy to keep timing-sensitive tests short.
pub fn create_fast_test_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        total_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_millis(200),
    }
}
