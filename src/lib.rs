//! # vendor-api-harness
//!
//! Helpers for functional test suites against the vendor's REST API.
//!
//! ## Key Features
//!
//! - **Configuration**: credentials loaded from a JSON dotfile into a fixed struct
//! - **Token lifecycle**: bearer tokens issued, stored and checked for expiry
//! - **Endpoint URLs**: account-scoped `api/v2` URLs, overridable for mock servers
//! - **Validation**: status-code classification and JSON shape checks
//!
//! ## Example
//!
//! ```rust,no_run
//! use vendor_api_harness::{
//!     configure_test_environment, ApiHelper, ResponseValidator, ValidationSpec,
//! };
//!
//! # async fn example() -> vendor_api_harness::ApiResult<()> {
//! let Some(params) = configure_test_environment(None) else {
//!     return Ok(()); // not configured, skip
//! };
//!
//! let mut helper = ApiHelper::from_params(params);
//! let response = helper.get("UserProfile").await?;
//!
//! assert!(ResponseValidator::is_ok(&response));
//! assert!(ResponseValidator::validate_json_shape(
//!     &response,
//!     &ValidationSpec::names(["data"]),
//! ));
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod config;
pub mod error;
pub mod helper;
pub mod http;
pub mod retry;
pub mod status;
pub mod validator;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use config::{configure_test_environment, ApiConfigParameters, DEFAULT_CONFIG_FILE};
pub use error::{ApiResult, ApiTestError};
pub use helper::{ApiHelper, BearerToken, DEFAULT_TOKEN_EXPIRY_SECONDS};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use logging::init_test_logging;
pub use retry::RetryPolicy;
pub use status::{HttpResponseCode, StatusClass};
pub use validator::{validate_json_names, validate_json_values, ResponseValidator, ValidationSpec};
