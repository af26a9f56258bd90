//! Builders for lifecycle requests and destination events.
//!
//! The events look like what the event bus delivers for an asynchronous
//! invocation with destinations configured, including the envelope metadata
//! the responder never reads.
//!
//! # Example
//!
//! ```
//! use cfn_custom_resource_responder_testing::EventBuilder;
//! use serde_json::json;
//!
//! let event = EventBuilder::update("bucket-1")
//!     .returning(json!({"Data": {"Arn": "arn:aws:s3:::bucket-1"}}))
//!     .build();
//! assert_eq!(event["detail"]["requestPayload"]["RequestType"], "Update");
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use cfn_custom_resource_responder::event::{FAILURE_DETAIL_TYPE, SUCCESS_DETAIL_TYPE};
use cfn_custom_resource_responder::{
    FunctionError, InvocationResultEvent, LifecycleRequest, RequestType, ResponderResult,
};

/// Region used by default fixtures.
pub const REGION: &str = "us-east-1";
/// Account used by default fixtures.
pub const ACCOUNT_ID: &str = "123456789012";
/// Stack id used by default fixtures.
pub const STACK_ID: &str =
    "arn:aws:cloudformation:us-east-1:123456789012:stack/demo-stack/0f6cbd30-5a4b-11ef-9c4a-0a1b2c3d4e5f";
/// Request id used by default fixtures.
pub const REQUEST_ID: &str = "5f4e1b2a-7c3d-4e8f-9a0b-1c2d3e4f5a6b";
/// Logical id used by default fixtures.
pub const LOGICAL_RESOURCE_ID: &str = "Bucket";
/// Handler used by default fixtures.
pub const FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:bucket-handler";

/// Builds a pre-signed ResponseURL for a request, shaped like the ones the
/// orchestrator hands out.
pub fn response_url(stack_id: &str, logical_resource_id: &str, request_id: &str) -> String {
    let key = format!("{}|{}|{}", stack_id, logical_resource_id, request_id);
    let encoded: String = key
        .chars()
        .map(|c| match c {
            ':' => "%3A".to_string(),
            '|' => "%7C".to_string(),
            other => other.to_string(),
        })
        .collect();
    format!(
        "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/{}?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Date=20240101T000000Z&X-Amz-SignedHeaders=host&X-Amz-Expires=7200&X-Amz-Credential=AKIAEXAMPLE%2F20240101%2Fus-east-1%2Fs3%2Faws4_request&X-Amz-Signature=0123456789abcdef",
        encoded
    )
}

/// What the handler did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Returned this value
    Returned(Value),
    /// Raised this fault
    Raised(FunctionError),
    /// Raised, with the runtime reporting this payload verbatim
    RaisedPayload(Value),
    /// Never completed; the destination reports the condition only
    Abandoned(String),
}

/// Builder for one destination event.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    request_type: RequestType,
    stack_id: String,
    request_id: String,
    logical_resource_id: String,
    physical_resource_id: Option<String>,
    response_url: Option<String>,
    resource_properties: Value,
    outcome: Outcome,
    time: DateTime<Utc>,
}

impl EventBuilder {
    fn new(request_type: RequestType, physical_resource_id: Option<String>) -> Self {
        Self {
            request_type,
            stack_id: STACK_ID.to_string(),
            request_id: REQUEST_ID.to_string(),
            logical_resource_id: LOGICAL_RESOURCE_ID.to_string(),
            physical_resource_id,
            response_url: None,
            resource_properties: json!({ "ServiceToken": FUNCTION_ARN }),
            outcome: Outcome::Returned(Value::Null),
            time: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    /// A Create request.
    pub fn create() -> Self {
        Self::new(RequestType::Create, None)
    }

    /// An Update of the resource currently known as `physical_resource_id`.
    pub fn update(physical_resource_id: impl Into<String>) -> Self {
        Self::new(RequestType::Update, Some(physical_resource_id.into()))
    }

    /// A Delete of the resource currently known as `physical_resource_id`.
    pub fn delete(physical_resource_id: impl Into<String>) -> Self {
        Self::new(RequestType::Delete, Some(physical_resource_id.into()))
    }

    /// Any request type, with or without a current physical id.
    pub fn request(request_type: RequestType, physical_resource_id: Option<String>) -> Self {
        Self::new(request_type, physical_resource_id)
    }

    /// Overrides the stack id.
    pub fn with_stack_id(mut self, stack_id: impl Into<String>) -> Self {
        self.stack_id = stack_id.into();
        self
    }

    /// Overrides the request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Overrides the logical id.
    pub fn with_logical_resource_id(mut self, logical_resource_id: impl Into<String>) -> Self {
        self.logical_resource_id = logical_resource_id.into();
        self
    }

    /// Overrides the ResponseURL (otherwise derived from the ids).
    pub fn with_response_url(mut self, url: impl Into<String>) -> Self {
        self.response_url = Some(url.into());
        self
    }

    /// Sets the resource properties.
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.resource_properties = properties;
        self
    }

    /// Sets the event time.
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// The handler returned `value`.
    pub fn returning(mut self, value: Value) -> Self {
        self.outcome = Outcome::Returned(value);
        self
    }

    /// The handler raised.
    pub fn raising(mut self, error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        self.outcome = Outcome::Raised(FunctionError::new(error_type, error_message));
        self
    }

    /// The handler raised and the runtime reported `payload` as the fault.
    pub fn raising_payload(mut self, payload: Value) -> Self {
        self.outcome = Outcome::RaisedPayload(payload);
        self
    }

    /// The handler never completed (e.g. `RetriesExhausted`, `EventAgeExceeded`).
    pub fn abandoned(mut self, condition: impl Into<String>) -> Self {
        self.outcome = Outcome::Abandoned(condition.into());
        self
    }

    /// Sets the outcome directly.
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// The ResponseURL this event will carry.
    pub fn response_url(&self) -> String {
        self.response_url
            .clone()
            .unwrap_or_else(|| response_url(&self.stack_id, &self.logical_resource_id, &self.request_id))
    }

    /// The lifecycle request as the handler sees it.
    pub fn request_payload(&self) -> Value {
        let mut payload = json!({
            "RequestType": self.request_type.as_str(),
            "ServiceToken": FUNCTION_ARN,
            "ResponseURL": self.response_url(),
            "StackId": self.stack_id,
            "RequestId": self.request_id,
            "LogicalResourceId": self.logical_resource_id,
            "ResourceType": "Custom::Fixture",
            "ResourceProperties": self.resource_properties,
        });
        if let Some(id) = &self.physical_resource_id {
            payload["PhysicalResourceId"] = Value::String(id.clone());
        }
        if self.request_type == RequestType::Update {
            payload["OldResourceProperties"] = self.resource_properties.clone();
        }
        payload
    }

    /// The typed lifecycle request.
    pub fn lifecycle_request(&self) -> ResponderResult<LifecycleRequest> {
        Ok(serde_json::from_value(self.request_payload())?)
    }

    /// The full event-bus envelope.
    pub fn build(&self) -> Value {
        let timestamp = self.time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let (detail_type, condition, response_context, response_payload) = match &self.outcome {
            Outcome::Returned(value) => (
                SUCCESS_DETAIL_TYPE,
                "Success".to_string(),
                json!({ "statusCode": 200, "executedVersion": "$LATEST" }),
                value.clone(),
            ),
            Outcome::Raised(error) => (
                FAILURE_DETAIL_TYPE,
                "RetriesExhausted".to_string(),
                json!({
                    "statusCode": 200,
                    "executedVersion": "$LATEST",
                    "functionError": "Unhandled",
                }),
                json!(error),
            ),
            Outcome::RaisedPayload(payload) => (
                FAILURE_DETAIL_TYPE,
                "RetriesExhausted".to_string(),
                json!({
                    "statusCode": 200,
                    "executedVersion": "$LATEST",
                    "functionError": "Unhandled",
                }),
                payload.clone(),
            ),
            Outcome::Abandoned(condition) => (
                FAILURE_DETAIL_TYPE,
                condition.clone(),
                json!({ "statusCode": 200 }),
                Value::Null,
            ),
        };

        let mut detail = json!({
            "version": "1.0",
            "timestamp": timestamp,
            "requestContext": {
                "requestId": format!("invoke-{}", self.request_id),
                "functionArn": format!("{}:$LATEST", FUNCTION_ARN),
                "condition": condition,
                "approximateInvokeCount": 1,
            },
            "requestPayload": self.request_payload(),
            "responseContext": response_context,
        });
        if !response_payload.is_null() {
            detail["responsePayload"] = response_payload;
        }

        json!({
            "version": "0",
            "id": format!("event-{}", self.request_id),
            "detail-type": detail_type,
            "source": "lambda",
            "account": ACCOUNT_ID,
            "time": self.time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "region": REGION,
            "resources": [FUNCTION_ARN],
            "detail": detail,
        })
    }

    /// The envelope narrowed to the typed event.
    pub fn build_event(&self) -> ResponderResult<InvocationResultEvent> {
        InvocationResultEvent::from_value(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_custom_resource_responder::InvocationResult;

    #[test]
    fn test_create_event_shape() {
        let event = EventBuilder::create().returning(json!({})).build();
        assert_eq!(event["detail-type"], SUCCESS_DETAIL_TYPE);
        assert_eq!(event["source"], "lambda");
        assert_eq!(event["detail"]["requestPayload"]["RequestId"], REQUEST_ID);
        assert!(event["detail"]["requestPayload"].get("PhysicalResourceId").is_none());
        assert_eq!(event["detail"]["timestamp"], "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_raised_event_narrows_to_failure() {
        let event = EventBuilder::delete("bucket-1")
            .raising("KeyError", "'Bucket'")
            .build_event()
            .unwrap();
        match event.result {
            InvocationResult::Failure { error } => assert_eq!(error.reason(), "KeyError: 'Bucket'"),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(event.request.physical_resource_id.unwrap().as_str(), "bucket-1");
    }

    #[test]
    fn test_raised_payload_is_kept_verbatim() {
        let payload = json!({"errorType": "HttpError", "errorMessage": 404, "stackTrace": "trace"});
        let event = EventBuilder::create().raising_payload(payload.clone()).build();
        assert_eq!(event["detail-type"], FAILURE_DETAIL_TYPE);
        assert_eq!(event["detail"]["responsePayload"], payload);
    }

    #[test]
    fn test_abandoned_event_uses_condition() {
        let event = EventBuilder::create().abandoned("EventAgeExceeded").build_event().unwrap();
        match event.result {
            InvocationResult::Failure { error } => {
                assert_eq!(error.error_type, "EventAgeExceeded");
                assert_eq!(error.error_message, "");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_response_url_encodes_key() {
        let url = response_url("arn:aws:x", "L", "r");
        assert!(url.contains("/arn%3Aaws%3Ax%7CL%7Cr?"));
    }
}
