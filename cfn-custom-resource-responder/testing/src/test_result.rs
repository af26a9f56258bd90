//! Result of delivering one event through the local gateway.

use serde_json::{Map, Value};

use cfn_custom_resource_responder::rules::ResultVariant;
use cfn_custom_resource_responder::{ResponsePayload, ResponseStatus, WriteRequest};

use crate::error::TestError;

/// What the gateway would have written for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    variant: ResultVariant,
    body: Map<String, Value>,
    write: WriteRequest,
}

impl TestResult {
    /// Creates a result.
    pub fn new(variant: ResultVariant, body: Map<String, Value>, write: WriteRequest) -> Self {
        Self { variant, body, write }
    }

    /// The rule set that produced the body.
    pub fn variant(&self) -> ResultVariant {
        self.variant
    }

    /// The response body as an object.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// The outbound write.
    pub fn write(&self) -> &WriteRequest {
        &self.write
    }

    /// Returns a body field.
    pub fn get_field(&self, name: &str) -> Result<&Value, TestError> {
        self.body.get(name).ok_or_else(|| TestError::field_not_found(name))
    }

    /// Returns a string body field.
    pub fn get_str(&self, name: &str) -> Result<&str, TestError> {
        self.get_field(name)?
            .as_str()
            .ok_or_else(|| TestError::field_not_found(format!("{} (as string)", name)))
    }

    /// The reported status.
    pub fn get_status(&self) -> Result<ResponseStatus, TestError> {
        let status = self.get_str("Status")?;
        ResponseStatus::parse(status).ok_or_else(|| TestError::field_not_found(format!("Status ({})", status)))
    }

    /// The reported reason.
    pub fn get_reason(&self) -> Result<&str, TestError> {
        self.get_str("Reason")
    }

    /// The reported physical id.
    pub fn get_physical_resource_id(&self) -> Result<&str, TestError> {
        self.get_str("PhysicalResourceId")
    }

    /// The reported `Data`, if any.
    pub fn get_data(&self) -> Option<&Map<String, Value>> {
        self.body.get("Data").and_then(Value::as_object)
    }

    /// The body parsed as a typed payload.
    pub fn payload(&self) -> Result<ResponsePayload, TestError> {
        Ok(serde_json::from_value(Value::Object(self.body.clone()))?)
    }

    /// Returns true if the orchestrator would see SUCCESS.
    pub fn is_success(&self) -> bool {
        matches!(self.get_status(), Ok(ResponseStatus::Success))
    }

    /// Returns true if the orchestrator would see FAILED.
    pub fn is_failure(&self) -> bool {
        matches!(self.get_status(), Ok(ResponseStatus::Failed))
    }
}
