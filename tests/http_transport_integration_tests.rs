//! Integration Tests for the reqwest-backed HTTP transport
//!
//! UNIT UNDER TEST: ReqwestTransport
//!
//! BUSINESS RESPONSIBILITY:
//!   - Sends method, headers and JSON body exactly as requested
//!   - Returns every completed exchange as a response, whatever its status
//!   - Retries 429/503 and connection failures with backoff, honoring Retry-After
//!   - Reports connection failures and timeouts as typed errors
//!
//! TEST COVERAGE:
//!   - Status passthrough and body decoding (JSON, non-JSON, empty)
//!   - Request shape as seen by the server
//!   - Retry counts for transient, permanent and exhausted failures
//!   - Retry-After precedence over backoff
//!   - Connection refusal, per-attempt timeout, unencodable headers

mod common;

use common::create_fast_retry_policy;
use serde_json::json;
use std::time::{Duration, Instant};
use vendor_api_harness::retry::RetryPolicy;
use vendor_api_harness::{
    init_test_logging, ApiTestError, Headers, HttpRequest, HttpTransport, ReqwestTransport,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_transport() -> ReqwestTransport {
    ReqwestTransport::with_retry_policy(create_fast_retry_policy())
}

async fn start_server() -> MockServer {
    init_test_logging();
    MockServer::start().await
}

// ============================================================================
// Response Handling Tests
// ============================================================================

#[tokio::test]
async fn test_error_status_is_returned_as_response() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/Queries/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Query not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/api/v2/Queries/missing", server.uri());
    let response = fast_transport()
        .send(HttpRequest::get(url, Headers::new()))
        .await
        .expect("a completed exchange is not an error");

    assert_eq!(response.status_code, 404);
    assert_eq!(response.json(), Some(&json!({"message": "Query not found"})));
}

#[tokio::test]
async fn test_non_json_body_keeps_text() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"),
        )
        .mount(&server)
        .await;

    let response = fast_transport()
        .send(HttpRequest::get(server.uri(), Headers::new()))
        .await
        .unwrap();

    assert_eq!(response.status_code, 502);
    assert_eq!(response.json(), None);
    assert_eq!(response.text, "<html>Bad Gateway</html>");
}

#[tokio::test]
async fn test_empty_body_has_no_json() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = fast_transport()
        .send(HttpRequest::get(server.uri(), Headers::new()))
        .await
        .unwrap();

    assert_eq!(response.status_code, 204);
    assert_eq!(response.json(), None);
    assert!(response.text.is_empty());
}

#[tokio::test]
async fn test_response_headers_are_lowercased() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Request-Id", "req-42"))
        .mount(&server)
        .await;

    let response = fast_transport()
        .send(HttpRequest::get(server.uri(), Headers::new()))
        .await
        .unwrap();

    assert_eq!(response.headers.get("x-request-id").map(String::as_str), Some("req-42"));
    assert_eq!(response.header("X-Request-Id"), Some("req-42"));
}

#[tokio::test]
async fn test_request_shape_reaches_server() {
    // Method, headers and JSON body must arrive unchanged
    let server = start_server().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/Queries/validate"))
        .and(header("authorization", "Bearer abc"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"queryText": "Q { source { T } }"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let headers = Headers::from([
        ("Authorization".to_string(), "Bearer abc".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]);
    let url = format!("{}/api/v2/Queries/validate", server.uri());

    let response = fast_transport()
        .send(HttpRequest::post_json(
            url,
            headers,
            json!({"queryText": "Q { source { T } }"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
}

// ============================================================================
// Retry Tests
// ============================================================================

#[tokio::test]
async fn test_service_unavailable_is_retried() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let response = fast_transport()
        .send(HttpRequest::get(server.uri(), Headers::new()))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_exhausted_rate_limit_returns_last_response() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"message": "slow down"})))
        .expect(3)
        .mount(&server)
        .await;

    let response = fast_transport()
        .send(HttpRequest::get(server.uri(), Headers::new()))
        .await
        .unwrap();

    assert_eq!(response.status_code, 429);
    assert_eq!(response.json(), Some(&json!({"message": "slow down"})));
}

#[tokio::test]
async fn test_permanent_errors_are_not_retried() {
    for status in [400u16, 401, 403, 404, 500] {
        let server = start_server().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let response = fast_transport()
            .send(HttpRequest::get(server.uri(), Headers::new()))
            .await
            .unwrap();

        assert_eq!(response.status_code, status);
        server.verify().await;
    }
}

#[tokio::test]
async fn test_retry_after_overrides_backoff() {
    // Backoff alone would wait 10s; Retry-After: 0 must win
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_retry_policy(RetryPolicy {
        max_attempts: 2,
        initial_delay: Duration::from_secs(10),
        max_delay: Duration::from_secs(10),
        backoff_multiplier: 2.0,
        total_timeout: Duration::from_secs(30),
        request_timeout: Duration::from_secs(2),
    });

    let started = Instant::now();
    let response = transport
        .send(HttpRequest::get(server.uri(), Headers::new()))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "Retry-After should replace the 10s backoff, took {:?}",
        started.elapsed()
    );
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_connection_refused_is_request_failed() {
    // Unpooled server: dropping it actually closes the listener.
    init_test_logging();
    let server = MockServer::builder().start().await;
    let url = server.uri();
    drop(server);

    let result = fast_transport()
        .send(HttpRequest::get(url, Headers::new()))
        .await;

    match result {
        Err(error @ ApiTestError::RequestFailed { .. }) => assert!(error.is_retryable()),
        other => panic!("Expected RequestFailed, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_retry_policy(RetryPolicy {
        max_attempts: 1,
        request_timeout: Duration::from_millis(100),
        ..create_fast_retry_policy()
    });

    let result = transport
        .send(HttpRequest::get(server.uri(), Headers::new()))
        .await;

    assert!(matches!(result, Err(ApiTestError::Timeout { .. })));
}

#[tokio::test]
async fn test_unencodable_header_is_rejected_before_sending() {
    let server = start_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let headers = Headers::from([("Authorization".to_string(), "Bearer a\r\nb".to_string())]);

    let result = fast_transport()
        .send(HttpRequest::get(server.uri(), headers))
        .await;

    assert!(matches!(result, Err(ApiTestError::InvalidHeader { .. })));
}
