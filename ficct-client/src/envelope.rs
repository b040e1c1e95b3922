//! Response envelope
//!
//! Every backend response is folded into one shape,
//! `{success, data, message, error, errors}`, before a caller sees it.

use ficct_core::{ErrorContext, FicctError, FicctResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const CONNECTION_ERROR: &str = "connection error";
pub const CONNECTION_MESSAGE: &str = "could not reach server";
pub const CANCELLED_ERROR: &str = "cancelled";
pub const VALIDATION_ERROR: &str = "validation failed";
pub const INVALID_RESPONSE_ERROR: &str = "invalid response";

/// Field name to validation messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Pagination block some endpoints attach next to `data`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// Normalized backend response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    /// HTTP status, when the request reached the server
    #[serde(skip)]
    pub status: Option<u16>,
}

impl<T> Default for ApiResponse<T> {
    fn default() -> Self {
        Self {
            success: None,
            data: None,
            message: None,
            error: None,
            errors: None,
            pagination: None,
            status: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: Some(true),
            data: Some(data),
            ..Self::default()
        }
    }

    /// Failure with the given error code and user-facing message
    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(error.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// The request never produced a usable answer from the server
    pub fn connection_error() -> Self {
        Self::failure(CONNECTION_ERROR, CONNECTION_MESSAGE)
    }

    pub fn cancelled() -> Self {
        Self::failure(CANCELLED_ERROR, "request cancelled")
    }

    /// Local validation failure; no request was sent
    pub fn validation_failed(errors: FieldErrors) -> Self {
        let message = errors
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| VALIDATION_ERROR.to_string());
        Self {
            success: Some(false),
            error: Some(VALIDATION_ERROR.to_string()),
            message: Some(message),
            errors: Some(errors),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    /// Server message, or the caller's fallback when there is none
    pub fn message_or(&self, default: &str) -> String {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
            .to_string()
    }

    /// Validation messages reported for one field
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors
            .as_ref()
            .and_then(|errors| errors.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            message: self.message,
            error: self.error,
            errors: self.errors,
            pagination: self.pagination,
            status: self.status,
        }
    }

    /// Drop the payload, keeping the outcome
    pub fn discard<U>(self) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: None,
            message: self.message,
            error: self.error,
            errors: self.errors,
            pagination: self.pagination,
            status: self.status,
        }
    }

    pub fn into_data(self) -> Option<T> {
        if self.is_success() {
            self.data
        } else {
            None
        }
    }

    /// Turn a failed envelope into a [`FicctError`] for callers that use `?`
    pub fn into_result(self, operation: &str) -> FicctResult<Option<T>> {
        if self.is_success() {
            return Ok(self.data);
        }

        let message = self.message_or("request failed");
        let context = ErrorContext::new("api_gateway").with_operation(operation);
        let context = match self.status {
            Some(status) => context.with_metadata("status", &status.to_string()),
            None => context,
        };

        let error = match (self.error.as_deref(), self.status) {
            (Some(CONNECTION_ERROR | CANCELLED_ERROR), _) => FicctError::Network {
                message,
                source: None,
                context: context.with_suggestion("Check that the API base URL is reachable"),
            },
            (Some(VALIDATION_ERROR), _) | (_, Some(422)) => FicctError::Validation {
                message,
                field: self.errors.and_then(|errors| errors.into_keys().next()),
                context,
            },
            (_, Some(401)) => FicctError::Authentication {
                message,
                context: context.with_suggestion("Run 'ficct login' to start a new session"),
            },
            (_, Some(403)) => FicctError::Forbidden { message, context },
            (_, status) => FicctError::Server {
                message,
                status,
                context,
            },
        };
        Err(error)
    }
}

impl ApiResponse<Value> {
    /// Deserialize `data` into a concrete type
    ///
    /// A payload that does not match `T` turns the response into a failure.
    pub fn into_typed<T: DeserializeOwned>(self) -> ApiResponse<T> {
        let Some(raw) = self.data.clone() else {
            return self.discard();
        };

        match serde_json::from_value::<T>(raw) {
            Ok(data) => self.map(|_| data),
            Err(e) => {
                tracing::warn!("Unexpected response payload: {}", e);
                let mut failed: ApiResponse<T> = self.discard();
                failed.success = Some(false);
                failed.error = Some(INVALID_RESPONSE_ERROR.to_string());
                failed.message = Some(format!("unexpected response from server: {}", e));
                failed
            }
        }
    }

    /// Fold a decoded body and its HTTP status into the envelope
    ///
    /// Transport status and envelope `success` are both honored: a non-2xx
    /// status is never reported as a success.
    pub fn from_body(status: u16, body: Value) -> Self {
        let mut response = match body {
            Value::Object(object) if looks_like_envelope(&object) => read_envelope(object),
            body => ApiResponse {
                data: Some(body),
                ..ApiResponse::default()
            },
        };

        response.status = Some(status);
        let status_ok = (200..300).contains(&status);

        if !status_ok {
            response.success = Some(false);
            if response.error.is_none() {
                response.error = Some(format!("HTTP {}", status));
            }
        } else if response.success.is_none() {
            response.success = Some(true);
        }

        response
    }

    /// Envelope for a response with an empty body
    pub fn from_empty(status: u16) -> Self {
        if (200..300).contains(&status) {
            ApiResponse {
                success: Some(true),
                status: Some(status),
                ..ApiResponse::default()
            }
        } else {
            ApiResponse {
                status: Some(status),
                ..ApiResponse::failure(format!("HTTP {}", status), "request failed")
            }
        }
    }
}

fn looks_like_envelope(object: &Map<String, Value>) -> bool {
    if object.contains_key("success") {
        return true;
    }
    // A bare paginator also carries `data`; keep it whole
    if object.contains_key("current_page") {
        return false;
    }
    ["data", "message", "error", "errors"]
        .iter()
        .any(|key| object.contains_key(*key))
}

/// Take each envelope field on its own; a field of the wrong type is
/// dropped without losing the others
fn read_envelope(object: Map<String, Value>) -> ApiResponse<Value> {
    let field = |key: &str| object.get(key).cloned();
    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

    let response = ApiResponse {
        success: object.get("success").and_then(Value::as_bool),
        message: text("message"),
        error: text("error"),
        errors: field("errors").and_then(read_field_errors),
        pagination: field("pagination").and_then(|value| serde_json::from_value(value).ok()),
        data: field("data").filter(|value| !value.is_null()),
        status: None,
    };

    let recognized = response.success.is_some()
        || response.data.is_some()
        || response.message.is_some()
        || response.error.is_some()
        || response.errors.is_some();
    if recognized {
        response
    } else {
        ApiResponse {
            data: Some(Value::Object(object)),
            ..ApiResponse::default()
        }
    }
}

/// `{"field": ["msg", ...]}`, also accepting a single string per field
fn read_field_errors(value: Value) -> Option<FieldErrors> {
    let Value::Object(fields) = value else {
        return None;
    };

    let errors: FieldErrors = fields
        .into_iter()
        .filter_map(|(field, messages)| {
            let messages: Vec<String> = match messages {
                Value::String(message) => vec![message],
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(message) => Some(message),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            (!messages.is_empty()).then_some((field, messages))
        })
        .collect();

    (!errors.is_empty()).then_some(errors)
}
