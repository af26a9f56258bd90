//! Error types for the testing utilities crate.

use cfn_custom_resource_responder::ResponderError;
use thiserror::Error;

/// Errors that can occur during testing.
///
/// # Examples
///
/// ```
/// use cfn_custom_resource_responder_testing::TestError;
///
/// let err = TestError::field_not_found("Reason");
/// assert!(err.to_string().contains("Reason"));
/// ```
#[derive(Debug, Error)]
pub enum TestError {
    /// Rule evaluation, URL parsing or event narrowing failed.
    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A response field the test asked for was not written.
    #[error("Field not found in response body: {0}")]
    FieldNotFound(String),

    /// No response has been delivered yet.
    #[error("No delivery recorded")]
    NoDelivery,

    /// The event did not carry what the runner needs.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

impl TestError {
    /// Creates a new FieldNotFound error.
    pub fn field_not_found(name: impl Into<String>) -> Self {
        Self::FieldNotFound(name.into())
    }

    /// Creates a new InvalidEvent error.
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent(message.into())
    }
}
