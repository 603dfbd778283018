//! Error types for API harness operations.
//!
//! This module provides structured error handling for configuration loading,
//! token issuance and HTTP transport, including categorization, severity
//! levels, and retry guidance.
//!
//! # Error Types
//!
//! The main error type is [`ApiTestError`], which covers all failure modes:
//! - Configuration errors (missing file, malformed JSON, missing parameters)
//! - Token issuance failures (non-2xx status, malformed token response)
//! - Transport failures (network issues, timeouts, invalid headers)
//!
//! Response *shape* mismatches are not errors; the validators in
//! [`crate::validator`] report them as `false`.
//!
//! # Error Handling Example
//!
//! ```rust,no_run
//! use vendor_api_harness::{ApiTestError, error::ErrorCategory};
//!
//! fn handle_error(err: ApiTestError) {
//!     if err.is_retryable() {
//!         println!("Transient failure: {}", err);
//!     }
//!
//!     match err.category() {
//!         ErrorCategory::Setup => println!("Fix the test configuration"),
//!         ErrorCategory::Transient => println!("Try again later"),
//!         _ => println!("Service rejected the request"),
//!     }
//! }
//! ```

use crate::logging::{log_error, log_warn};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error categorization types
// ============================================================================

/// High-level categorization of errors for routing and handling decisions.
///
/// Use [`ApiTestError::category()`] to get the category for any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Test environment setup is incomplete or broken.
    ///
    /// Missing or malformed config file, absent credentials. Dependent
    /// tests should be skipped rather than reported as failures.
    Setup,

    /// The service under test answered, but not the way the contract says.
    External,

    /// The caller built an invalid request (e.g. a header value with
    /// control characters).
    Client,

    /// Temporary failures that may succeed on retry.
    ///
    /// Connection failures and timeouts.
    Transient,
}

/// Severity level for logging and alerting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The suite cannot run at all.
    Critical,

    /// Action failed but the suite can continue.
    Error,

    /// Unexpected but recoverable situation.
    Warning,
}

// ============================================================================
// Harness Error types
// ============================================================================

/// Convenient result type for harness operations.
pub type ApiResult<T> = std::result::Result<T, ApiTestError>;

/// Errors that can occur while setting up and driving API tests.
///
/// # Creating Errors
///
/// Use the constructor methods which automatically log the error:
///
/// ```rust
/// use vendor_api_harness::ApiTestError;
///
/// let err = ApiTestError::missing_parameter("secret_key");
/// let err = ApiTestError::token_issuance_failed(Some(401), "unauthorized");
/// let err = ApiTestError::timeout(std::time::Duration::from_secs(30));
/// ```
///
/// # Error Categories
///
/// | Variant | Category | Retryable |
/// |---------|----------|-----------|
/// | `ConfigNotFound` | Setup | No |
/// | `ConfigParseError` | Setup | No |
/// | `ConfigReadFailed` | Setup | No |
/// | `MissingParameter` | Setup | No |
/// | `TokenIssuanceError` | External | No |
/// | `InvalidHeader` | Client | No |
/// | `RequestFailed` | Transient | Yes |
/// | `Timeout` | Transient | Yes |
#[derive(Error, Debug)]
pub enum ApiTestError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The configuration file is not a valid configuration document.
    ///
    /// Position fields are 1-based line/column as reported by the JSON
    /// parser, and the 0-based byte offset of that position. They are zero
    /// when the document parsed but has the wrong structure.
    #[error(
        "Syntax error in configuration file {}: {message} at line {line} column {column} (char {offset})",
        path.display()
    )]
    ConfigParseError {
        path: PathBuf,
        message: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    ConfigReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration parameter needed for the operation is unset.
    #[error("Required configuration parameter is not set: {name}")]
    MissingParameter {
        /// The on-disk name of the parameter.
        name: String,
    },

    /// The token issuance endpoint did not return a usable token.
    ///
    /// `status` is `None` only when the failure was detected before a
    /// status code was known.
    #[error("Bearer token issuance failed (status {status:?}): {message}")]
    TokenIssuanceError {
        status: Option<u16>,
        message: String,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid HTTP header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    /// The HTTP request could not be completed.
    #[error("Request failed: {message}")]
    RequestFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl ApiTestError {
    /// Get the error category for routing and handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigNotFound { .. } => ErrorCategory::Setup,
            Self::ConfigParseError { .. } => ErrorCategory::Setup,
            Self::ConfigReadFailed { .. } => ErrorCategory::Setup,
            Self::MissingParameter { .. } => ErrorCategory::Setup,
            Self::TokenIssuanceError { .. } => ErrorCategory::External,
            Self::InvalidHeader { .. } => ErrorCategory::Client,
            Self::RequestFailed { .. } => ErrorCategory::Transient,
            Self::Timeout { .. } => ErrorCategory::Transient,
        }
    }

    /// Get the error severity for logging and alerting.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigNotFound { .. } => ErrorSeverity::Critical,
            Self::ConfigParseError { .. } => ErrorSeverity::Critical,
            Self::ConfigReadFailed { .. } => ErrorSeverity::Critical,
            Self::MissingParameter { .. } => ErrorSeverity::Critical,
            Self::TokenIssuanceError { .. } => ErrorSeverity::Error,
            Self::InvalidHeader { .. } => ErrorSeverity::Error,
            Self::RequestFailed { .. } => ErrorSeverity::Error,
            Self::Timeout { .. } => ErrorSeverity::Warning,
        }
    }

    /// Whether this error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::Timeout { .. })
    }

    /// Whether dependent tests should be skipped instead of failed.
    pub fn is_setup_failure(&self) -> bool {
        self.category() == ErrorCategory::Setup
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        log_error!(
            error_type = "config_not_found",
            path = %path.display(),
            "Configuration file not found, check that the file path is correct"
        );
        Self::ConfigNotFound { path }
    }

    pub fn config_parse_error(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Self {
        let path = path.into();
        let message = message.into();
        log_error!(
            error_type = "config_parse_error",
            path = %path.display(),
            message = %message,
            line = line,
            column = column,
            offset = offset,
            "Syntax error while loading configuration file"
        );
        Self::ConfigParseError {
            path,
            message,
            line,
            column,
            offset,
        }
    }

    pub fn config_read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        log_error!(
            error_type = "config_read_failed",
            path = %path.display(),
            error = %source,
            "I/O error while loading configuration file"
        );
        Self::ConfigReadFailed { path, source }
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        let name = name.into();
        log_error!(
            error_type = "missing_parameter",
            parameter = %name,
            "Required configuration parameter is not set"
        );
        Self::MissingParameter { name }
    }

    pub fn token_issuance_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "token_issuance_failed",
            status = ?status,
            message = %message,
            "An error occurred while creating a new bearer access token"
        );
        Self::TokenIssuanceError { status, message }
    }

    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        log_warn!(
            error_type = "invalid_header",
            header = %name,
            message = %message,
            "HTTP header rejected"
        );
        Self::InvalidHeader { name, message }
    }

    pub fn request_failed(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_error!(
            error_type = "request_failed",
            message = %message,
            has_source = source.is_some(),
            "HTTP request execution failed"
        );
        Self::RequestFailed { message, source }
    }

    pub fn timeout(timeout: Duration) -> Self {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        log_warn!(
            error_type = "timeout",
            timeout_ms = timeout_ms,
            "HTTP request timed out"
        );
        Self::Timeout { timeout_ms }
    }
}
