//! Response validation for functional API tests.
//!
//! Everything here is a pure predicate. Malformed or unexpected input yields
//! `false`; the calling test decides whether that is a failure.

use crate::http::HttpResponse;
use crate::status::{self, HttpResponseCode};
use serde_json::{Map, Value};

/// What a JSON object is expected to contain.
///
/// When both `values` and `names` are set, only `values` is checked.
/// `explicit` applies to `names` only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSpec {
    pub names: Option<Vec<String>>,
    pub values: Option<Map<String, Value>>,
    pub explicit: bool,
}

impl ValidationSpec {
    /// Only require that the body is a JSON object.
    pub fn any_object() -> Self {
        Self::default()
    }

    /// Require each of `names` to be present.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Require each key of `values` to be present with an equal value.
    pub fn values(values: Map<String, Value>) -> Self {
        Self {
            values: Some(values),
            ..Self::default()
        }
    }

    /// Additionally forbid keys beyond the expected names.
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }
}

/// Stateless checks over an [`HttpResponse`].
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn is_informational(response: &HttpResponse) -> bool {
        status::is_informational(response.status_code)
    }

    pub fn is_success(response: &HttpResponse) -> bool {
        status::is_success(response.status_code)
    }

    pub fn is_redirect(response: &HttpResponse) -> bool {
        status::is_redirect(response.status_code)
    }

    pub fn is_client_error(response: &HttpResponse) -> bool {
        status::is_client_error(response.status_code)
    }

    pub fn is_server_error(response: &HttpResponse) -> bool {
        status::is_server_error(response.status_code)
    }

    pub fn is_ok(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::OK
    }

    pub fn is_created(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::CREATED
    }

    pub fn is_no_content(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::NO_CONTENT
    }

    pub fn is_bad_request(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::BAD_REQUEST
    }

    pub fn is_unauthorized(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::UNAUTHORIZED
    }

    pub fn is_forbidden(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::FORBIDDEN
    }

    pub fn is_not_found(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::NOT_FOUND
    }

    pub fn is_method_not_allowed(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::METHOD_NOT_ALLOWED
    }

    pub fn is_conflict(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::CONFLICT
    }

    pub fn is_too_many_requests(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::TOO_MANY_REQUESTS
    }

    pub fn is_internal_server_error(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::INTERNAL_SERVER_ERROR
    }

    pub fn is_service_unavailable(response: &HttpResponse) -> bool {
        response.status_code == HttpResponseCode::SERVICE_UNAVAILABLE
    }

    /// Check the response body against `spec`.
    ///
    /// 1. `false` unless the body is a JSON object
    /// 2. with `spec.values`, every pair must match exactly
    /// 3. otherwise with `spec.names`, every name must be present (and, in
    ///    explicit mode, no other key)
    /// 4. otherwise `true`
    pub fn validate_json_shape(response: &HttpResponse, spec: &ValidationSpec) -> bool {
        let Some(body) = response.json().filter(|body| body.is_object()) else {
            return false;
        };

        if let Some(values) = &spec.values {
            return validate_json_values(body, values);
        }
        if let Some(names) = &spec.names {
            return validate_json_names(body, names, spec.explicit);
        }
        true
    }
}

/// Whether `value` is an object containing every key in `names`.
///
/// With `explicit`, the object must also have no key outside `names`, so its
/// key set equals the set of `names`. Duplicate names count once.
pub fn validate_json_names<S: AsRef<str>>(value: &Value, names: &[S], explicit: bool) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    if !names.iter().all(|name| object.contains_key(name.as_ref())) {
        return false;
    }

    !explicit
        || object
            .keys()
            .all(|key| names.iter().any(|name| name.as_ref() == key))
}

/// Whether `value` is an object holding every pair of `expected`.
///
/// Values compare with `serde_json::Value` equality: `1`, `1.0` and `"1"`
/// are all different.
pub fn validate_json_values(value: &Value, expected: &Map<String, Value>) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };

    expected
        .iter()
        .all(|(key, expected_value)| object.get(key) == Some(expected_value))
}
