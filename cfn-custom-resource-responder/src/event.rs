//! Data contracts for the lifecycle callback protocol.
//!
//! Three shapes live here:
//!
//! - [`LifecycleRequest`]: what the orchestrator sends the handler.
//! - [`DestinationEnvelope`]: what the destination mechanism publishes on the
//!   event bus once the handler invocation finishes, narrowed to an
//!   [`InvocationResultEvent`] by [`InvocationResultEvent::from_envelope`].
//! - [`ResponsePayload`]: what the orchestrator expects at its ResponseURL.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FunctionError, ResponderError, ResponderResult};
use crate::types::{LogicalResourceId, PhysicalResourceId, RequestId, StackId};

/// Detail-type of a destination event for a successful invocation.
pub const SUCCESS_DETAIL_TYPE: &str = "Lambda Function Invocation Result - Success";

/// Detail-type of a destination event for a failed invocation.
pub const FAILURE_DETAIL_TYPE: &str = "Lambda Function Invocation Result - Failure";

/// Event source used by the destination mechanism.
pub const EVENT_SOURCE: &str = "lambda";

/// The lifecycle operation the orchestrator is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// First provisioning of the resource
    Create,
    /// Property change on an existing resource
    Update,
    /// Removal of the resource
    Delete,
}

impl RequestType {
    /// Returns the wire name of the request type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom resource lifecycle request as delivered to the handler.
///
/// The identifier fields default to empty strings when absent so that a
/// reshaped payload still produces a response rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRequest {
    /// Create, Update or Delete
    #[serde(rename = "RequestType")]
    pub request_type: RequestType,

    /// ARN of the handler the resource was declared against
    #[serde(rename = "ServiceToken", default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,

    /// Pre-signed URL the response must be written to
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,

    /// ARN of the owning stack
    #[serde(rename = "StackId", default)]
    pub stack_id: StackId,

    /// Unique id of this request
    #[serde(rename = "RequestId", default)]
    pub request_id: RequestId,

    /// Template-local resource name
    #[serde(rename = "LogicalResourceId", default)]
    pub logical_resource_id: LogicalResourceId,

    /// Physical id known to the orchestrator; present for Update and Delete
    #[serde(rename = "PhysicalResourceId", default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<PhysicalResourceId>,

    /// Declared resource type, e.g. `Custom::Bucket`
    #[serde(rename = "ResourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Resource properties from the template
    #[serde(rename = "ResourceProperties", default, skip_serializing_if = "Option::is_none")]
    pub resource_properties: Option<Value>,

    /// Previous resource properties; present for Update
    #[serde(rename = "OldResourceProperties", default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Value>,
}

impl LifecycleRequest {
    /// Creates a request with the given type and identifiers.
    pub fn new(
        request_type: RequestType,
        stack_id: impl Into<StackId>,
        request_id: impl Into<RequestId>,
        logical_resource_id: impl Into<LogicalResourceId>,
        response_url: impl Into<String>,
    ) -> Self {
        Self {
            request_type,
            service_token: None,
            response_url: response_url.into(),
            stack_id: stack_id.into(),
            request_id: request_id.into(),
            logical_resource_id: logical_resource_id.into(),
            physical_resource_id: None,
            resource_type: None,
            resource_properties: None,
            old_resource_properties: None,
        }
    }

    /// Sets the physical id already known to the orchestrator.
    pub fn with_physical_resource_id(mut self, id: impl Into<PhysicalResourceId>) -> Self {
        self.physical_resource_id = Some(id.into());
        self
    }

    /// Returns true for Create requests.
    pub fn is_create(&self) -> bool {
        matches!(self.request_type, RequestType::Create)
    }

    /// Returns the physical id the orchestrator already holds, if any.
    ///
    /// Always `None` for Create: a physical id on a create request is not
    /// something the orchestrator sends.
    pub fn prior_physical_resource_id(&self) -> Option<&PhysicalResourceId> {
        if self.is_create() {
            None
        } else {
            self.physical_resource_id.as_ref()
        }
    }
}

/// Context of the original asynchronous invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Invocation request id
    #[serde(rename = "requestId", default)]
    pub request_id: String,
    /// ARN of the invoked function (with qualifier)
    #[serde(rename = "functionArn", default)]
    pub function_arn: String,
    /// `Success`, `RetriesExhausted`, `EventAgeExceeded`, ...
    #[serde(rename = "condition", default)]
    pub condition: String,
    /// Number of attempts made
    #[serde(rename = "approximateInvokeCount", default)]
    pub approximate_invoke_count: u32,
}

/// Outcome metadata of the invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseContext {
    /// HTTP-ish status of the invoke
    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Function version that ran
    #[serde(rename = "executedVersion", default, skip_serializing_if = "Option::is_none")]
    pub executed_version: Option<String>,
    /// Present (usually `Unhandled`) when the handler raised
    #[serde(rename = "functionError", default, skip_serializing_if = "Option::is_none")]
    pub function_error: Option<String>,
}

/// The invocation record carried in the envelope's `detail`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Record format version
    #[serde(default)]
    pub version: String,
    /// Completion time as reported by the destination mechanism
    #[serde(default)]
    pub timestamp: String,
    /// Invocation context
    #[serde(rename = "requestContext", default)]
    pub request_context: RequestContext,
    /// The event the handler was invoked with (the lifecycle request)
    #[serde(rename = "requestPayload", default)]
    pub request_payload: Value,
    /// Outcome metadata
    #[serde(rename = "responseContext", default)]
    pub response_context: ResponseContext,
    /// Handler return value, or the fault description on failure
    #[serde(rename = "responsePayload", default)]
    pub response_payload: Option<Value>,
}

/// An event-bus envelope wrapping one invocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationEnvelope {
    /// Envelope version
    #[serde(default)]
    pub version: String,
    /// Event id
    #[serde(default)]
    pub id: String,
    /// Success or Failure detail-type
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    /// Always `lambda` for destination events
    #[serde(default)]
    pub source: String,
    /// Account the event originated in
    #[serde(default)]
    pub account: String,
    /// Event time
    #[serde(default)]
    pub time: String,
    /// Region the event originated in
    #[serde(default)]
    pub region: String,
    /// Bus and function ARNs
    #[serde(default)]
    pub resources: Vec<String>,
    /// The invocation record
    pub detail: InvocationRecord,
}

impl DestinationEnvelope {
    /// Returns true if this envelope describes a failed invocation.
    ///
    /// Either signal is enough: the Failure detail-type, or a
    /// `functionError` in the response context.
    pub fn is_failure(&self) -> bool {
        self.detail_type == FAILURE_DETAIL_TYPE
            || self.detail.response_context.function_error.is_some()
    }
}

/// The result of a handler invocation, success or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// The handler returned normally.
    ///
    /// `response` is whatever it returned; only a JSON object is read for
    /// fields, anything else counts as "no fields supplied".
    Success {
        /// The handler's return value
        response: Value,
    },
    /// The handler raised.
    Failure {
        /// The fault as reported by the runtime
        error: FunctionError,
    },
}

impl InvocationResult {
    /// Returns true for the Failure variant.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Returns the handler's returned object, if it returned one.
    pub fn response_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Success { response } => response.as_object(),
            Self::Failure { .. } => None,
        }
    }
}

/// A destination event narrowed to what the mapping engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResultEvent {
    /// The original lifecycle request
    pub request: LifecycleRequest,
    /// The invocation outcome
    pub result: InvocationResult,
}

impl InvocationResultEvent {
    /// Creates a Success event.
    pub fn success(request: LifecycleRequest, response: Value) -> Self {
        Self {
            request,
            result: InvocationResult::Success { response },
        }
    }

    /// Creates a Failure event.
    pub fn failure(request: LifecycleRequest, error: FunctionError) -> Self {
        Self {
            request,
            result: InvocationResult::Failure { error },
        }
    }

    /// Returns true for the Failure variant.
    pub fn is_failure(&self) -> bool {
        self.result.is_failure()
    }

    /// Narrows a destination envelope to an invocation result event.
    ///
    /// The request payload must at least name a valid `RequestType`. Each
    /// fault field is read on its own, so one ill-typed field never drops the
    /// others (see [`FunctionError::from_payload`]). A missing or empty error
    /// type falls back to the invocation condition.
    ///
    /// This is stricter than the gateway. A request without a recognised
    /// `RequestType` is a [`ResponderError::MalformedEvent`] here, while the
    /// compiled rules still answer it, taking the non-Create branch for the
    /// physical id. The orchestrator always sends one of the three types.
    pub fn from_envelope(envelope: DestinationEnvelope) -> ResponderResult<Self> {
        let is_failure = envelope.is_failure();
        let InvocationRecord {
            request_context,
            request_payload,
            response_payload,
            ..
        } = envelope.detail;

        let request: LifecycleRequest = serde_json::from_value(request_payload).map_err(|e| {
            ResponderError::malformed_event(format!("request payload is not a lifecycle request: {}", e))
        })?;

        let result = if is_failure {
            let mut error = response_payload
                .as_ref()
                .map(FunctionError::from_payload)
                .unwrap_or_default();
            if error.error_type.is_empty() {
                error.error_type = request_context.condition;
            }
            InvocationResult::Failure { error }
        } else {
            InvocationResult::Success {
                response: response_payload.unwrap_or(Value::Null),
            }
        };

        Ok(Self { request, result })
    }

    /// Parses and narrows a raw destination event.
    pub fn from_value(value: Value) -> ResponderResult<Self> {
        let envelope: DestinationEnvelope = serde_json::from_value(value)
            .map_err(|e| ResponderError::malformed_event(format!("not a destination envelope: {}", e)))?;
        Self::from_envelope(envelope)
    }
}

/// Status reported to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// The lifecycle operation succeeded
    Success,
    /// The lifecycle operation failed
    Failed,
}

impl ResponseStatus {
    /// Returns the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }

    /// Parses an exact wire value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Every status, in wire order.
    pub fn all() -> [Self; 2] {
        [Self::Success, Self::Failed]
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The body written to the orchestrator's ResponseURL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// SUCCESS or FAILED
    #[serde(rename = "Status")]
    pub status: ResponseStatus,
    /// Free-form reason; empty on plain success
    #[serde(rename = "Reason")]
    pub reason: String,
    /// Resource identity
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: PhysicalResourceId,
    /// Copied from the request
    #[serde(rename = "StackId")]
    pub stack_id: StackId,
    /// Copied from the request
    #[serde(rename = "RequestId")]
    pub request_id: RequestId,
    /// Copied from the request
    #[serde(rename = "LogicalResourceId")]
    pub logical_resource_id: LogicalResourceId,
    /// Attributes exposed through `Fn::GetAtt`
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    /// Mask `Data` in console and describe output
    #[serde(rename = "NoEcho", default, skip_serializing_if = "Option::is_none")]
    pub no_echo: Option<bool>,
}

impl ResponsePayload {
    /// Returns true if the orchestrator will see a success.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ResponseStatus::Success)
    }

    /// Serializes the payload to the JSON body the orchestrator expects.
    pub fn to_body(&self) -> ResponderResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
