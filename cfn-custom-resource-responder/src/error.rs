//! Error types for the custom resource responder.
//!
//! Nothing in this module is ever surfaced to the orchestrator directly: the
//! orchestrator only ever sees a `FAILED` status with a reason string. These
//! errors describe problems found while parsing destination events, evaluating
//! mapping rules in strict mode, or validating generator configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::resolver::handler_text;

/// Result type for responder operations.
pub type ResponderResult<T> = Result<T, ResponderError>;

/// The main error type for the responder.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// The destination event does not have the expected envelope shape.
    #[error("Malformed event: {message}")]
    MalformedEvent {
        /// Error message describing what went wrong
        message: String,
    },

    /// The lifecycle request carries a ResponseURL that cannot be parsed.
    #[error("Invalid response URL: {message}")]
    InvalidResponseUrl {
        /// Error message describing what went wrong
        message: String,
        /// The offending URL as received
        url: String,
    },

    /// A required field was absent while evaluating rules in strict mode.
    #[error("Missing field: {path}")]
    MissingField {
        /// Field name or dotted context path that could not be resolved
        path: String,
    },

    /// Validation error for invalid configuration.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation failure
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerDes {
        /// Error message describing the serialization failure
        message: String,
    },
}

impl ResponderError {
    /// Creates a new MalformedEvent error.
    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponseUrl error.
    pub fn invalid_response_url(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::InvalidResponseUrl {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Creates a new MissingField error.
    pub fn missing_field(path: impl Into<String>) -> Self {
        Self::MissingField { path: path.into() }
    }

    /// Creates a new Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new SerDes error.
    pub fn serdes(message: impl Into<String>) -> Self {
        Self::SerDes {
            message: message.into(),
        }
    }

    /// Returns true if this error came from strict-mode rule evaluation.
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}

/// An unhandled handler fault as reported by the destination mechanism.
///
/// This is the `responsePayload` of a failure record. Every field is optional
/// on the wire; absent fields deserialize to empty values so a reshaped
/// payload still yields a reason string instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionError {
    /// The error type/name, e.g. `ValueError`
    #[serde(rename = "errorType", default)]
    pub error_type: String,
    /// The error message
    #[serde(rename = "errorMessage", default)]
    pub error_message: String,
    /// Stack trace lines, if the runtime reported any
    #[serde(rename = "stackTrace", default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<String>,
}

impl FunctionError {
    /// Creates a new FunctionError.
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
            stack_trace: Vec::new(),
        }
    }

    /// Reads a fault from a failure record's `responsePayload`, one field at
    /// a time.
    ///
    /// A wrongly typed field loses only itself. `errorType` must be a
    /// non-empty string. `errorMessage` may be any non-null value; non-strings
    /// keep their JSON text. Only string lines of `stackTrace` survive.
    /// A payload that is not an object yields an empty fault.
    pub fn from_payload(payload: &Value) -> Self {
        let error_type = payload
            .get("errorType")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();
        let error_message = payload
            .get("errorMessage")
            .and_then(handler_text)
            .unwrap_or_default();
        let stack_trace = payload
            .get("stackTrace")
            .and_then(Value::as_array)
            .map(|lines| lines.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();
        Self {
            error_type,
            error_message,
            stack_trace,
        }
    }

    /// Renders the reason string reported to the orchestrator.
    pub fn reason(&self) -> String {
        format!("{}: {}", self.error_type, self.error_message)
    }
}

impl From<serde_json::Error> for ResponderError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerDes {
            message: error.to_string(),
        }
    }
}

impl From<url::ParseError> for ResponderError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidResponseUrl {
            message: error.to_string(),
            url: String::new(),
        }
    }
}
