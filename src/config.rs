//! Test environment configuration.
//!
//! Credentials and account settings are read from a JSON dotfile. Only the
//! four keys named by the `*_KEY` constants are recognized; anything else in
//! the document is ignored and absent keys stay `None`.
//!
//! ```json
//! {
//!   "customer_account_name": "acme",
//!   "api_access_key_id": "ACME_0123456789",
//!   "api_access_key_expiry_time_seconds": 3600,
//!   "secret_key": "_abcdef0123456789"
//! }
//! ```

use crate::error::{ApiResult, ApiTestError};
use crate::logging::{log_debug, log_info, log_warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".api-test-config.json";

/// Environment variable that overrides [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_PATH_ENV: &str = "API_TEST_CONFIG";

pub const API_ACCESS_KEY_ID_KEY: &str = "api_access_key_id";
pub const API_ACCESS_KEY_EXPIRY_TIME_SECONDS_KEY: &str = "api_access_key_expiry_time_seconds";
pub const CUSTOMER_ACCOUNT_NAME_KEY: &str = "customer_account_name";
pub const SECRET_KEY_KEY: &str = "secret_key";

/// Parameters needed to authenticate against the vendor API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfigParameters {
    /// Access key id sent as `keyId` when requesting a bearer token.
    #[serde(rename = "api_access_key_id", default)]
    pub key_id: Option<String>,

    /// Token lifetime requested by default, in seconds.
    #[serde(rename = "api_access_key_expiry_time_seconds", default)]
    pub key_expiry_seconds: Option<u64>,

    /// Account name, the subdomain of the API host.
    #[serde(rename = "customer_account_name", default)]
    pub account_name: Option<String>,

    /// Secret paired with the access key id.
    #[serde(rename = "secret_key", default)]
    pub secret_key: Option<String>,
}

impl ApiConfigParameters {
    /// Load parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`ApiTestError::ConfigNotFound`] if `path` does not exist
    /// - [`ApiTestError::ConfigParseError`] if the file is not valid JSON, is
    ///   not a JSON object, or a recognized key has the wrong type
    /// - [`ApiTestError::ConfigReadFailed`] for any other I/O failure
    pub fn load(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiTestError::config_not_found(path));
            }
            Err(e) => return Err(ApiTestError::config_read_failed(path, e)),
        };

        Self::parse(path, &text)
    }

    /// Parse a configuration document. `path` is only used for diagnostics.
    pub fn parse(path: impl AsRef<Path>, text: &str) -> ApiResult<Self> {
        let path = path.as_ref();
        let document: Value = serde_json::from_str(text).map_err(|e| {
            let offset = byte_offset(text, e.line(), e.column());
            ApiTestError::config_parse_error(path, e.to_string(), e.line(), e.column(), offset)
        })?;

        if !document.is_object() {
            return Err(ApiTestError::config_parse_error(
                path,
                "configuration document must be a JSON object",
                0,
                0,
                0,
            ));
        }

        let params: Self = serde_json::from_value(document).map_err(|e| {
            ApiTestError::config_parse_error(path, e.to_string(), 0, 0, 0)
        })?;

        log_debug!(
            path = %path.display(),
            has_key_id = params.key_id.is_some(),
            has_secret_key = params.secret_key.is_some(),
            has_account_name = params.account_name.is_some(),
            key_expiry_seconds = ?params.key_expiry_seconds,
            "Parsed API test configuration"
        );

        Ok(params)
    }

    /// The parameters keyed by their on-disk names, `null` for unset values.
    pub fn as_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(API_ACCESS_KEY_ID_KEY.to_string(), self.key_id.clone().into());
        map.insert(
            API_ACCESS_KEY_EXPIRY_TIME_SECONDS_KEY.to_string(),
            self.key_expiry_seconds.into(),
        );
        map.insert(
            CUSTOMER_ACCOUNT_NAME_KEY.to_string(),
            self.account_name.clone().into(),
        );
        map.insert(SECRET_KEY_KEY.to_string(), self.secret_key.clone().into());
        map
    }

    /// Pretty-printed JSON in the same layout the loader accepts.
    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", Value::Object(self.as_map()))
    }
}

/// Resolve the configuration path: `API_TEST_CONFIG` if set and non-empty,
/// otherwise [`DEFAULT_CONFIG_FILE`].
pub fn config_path_from_env() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Load the test environment, or `None` if it cannot be loaded.
///
/// Callers treat `None` as "skip remaining setup". The underlying error has
/// already been logged by the time this returns.
pub fn configure_test_environment(path: Option<&Path>) -> Option<ApiConfigParameters> {
    let path = path.map_or_else(config_path_from_env, Path::to_path_buf);

    match ApiConfigParameters::load(&path) {
        Ok(params) => {
            log_info!(
                path = %path.display(),
                "Loaded API test configuration"
            );
            Some(params)
        }
        Err(e) => {
            log_warn!(
                path = %path.display(),
                error = %e,
                "API test environment not configured, skipping setup"
            );
            None
        }
    }
}

/// Byte offset of a 1-based line/column position reported by serde_json.
///
/// Column 0 means the position is at the start of the line.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }

    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();

    (line_start + column.saturating_sub(1)).min(text.len())
}
