//! Default-value resolution for lifecycle responses.
//!
//! [`resolve`] is the typed, in-process statement of what the compiled
//! gateway rules do: a pure function from an invocation result and the
//! original request to a fully populated [`ResponsePayload`]. The gateway never
//! runs this code; the rule sets in [`crate::compiler`] are checked against it.
//!
//! # Field rules
//!
//! | Field | Success | Failure |
//! |-------|---------|---------|
//! | `Status` | handler's `SUCCESS`/`FAILED`, else `SUCCESS` | always `FAILED` |
//! | `Reason` | handler's value, else `""` | `"{errorType}: {errorMessage}"` |
//! | `PhysicalResourceId` | handler's value, else default | default |
//! | `StackId`, `RequestId`, `LogicalResourceId` | request | request |
//! | `Data`, `NoEcho` | handler's value if well-typed | omitted |
//!
//! The default physical id is the `RequestId` on Create and the id the
//! orchestrator already holds on Update and Delete.

use serde_json::{Map, Value};

use crate::event::{InvocationResult, InvocationResultEvent, LifecycleRequest, ResponsePayload, ResponseStatus};
use crate::types::PhysicalResourceId;

/// Response keys a handler may set.
pub const HANDLER_FIELDS: [&str; 5] = ["Status", "Reason", "PhysicalResourceId", "Data", "NoEcho"];

/// Response keys that always come from the request, whatever the handler says.
pub const REQUEST_FIELDS: [&str; 3] = ["StackId", "RequestId", "LogicalResourceId"];

/// Resolves the response for one invocation result.
pub fn resolve(result: &InvocationResult, request: &LifecycleRequest) -> ResponsePayload {
    match result {
        InvocationResult::Success { response } => resolve_success(response, request),
        InvocationResult::Failure { error } => {
            tracing::debug!(
                request_id = %request.request_id,
                error_type = %error.error_type,
                "Resolving failure response"
            );
            ResponsePayload {
                status: ResponseStatus::Failed,
                reason: error.reason(),
                physical_resource_id: default_physical_resource_id(request),
                stack_id: request.stack_id.clone(),
                request_id: request.request_id.clone(),
                logical_resource_id: request.logical_resource_id.clone(),
                data: None,
                no_echo: None,
            }
        }
    }
}

/// Resolves the response for a narrowed destination event.
pub fn resolve_event(event: &InvocationResultEvent) -> ResponsePayload {
    resolve(&event.result, &event.request)
}

/// Returns the physical id used when the handler does not supply one.
pub fn default_physical_resource_id(request: &LifecycleRequest) -> PhysicalResourceId {
    if request.is_create() {
        return PhysicalResourceId::from(request.request_id.as_str());
    }
    match request.prior_physical_resource_id() {
        Some(id) => id.clone(),
        None => {
            tracing::warn!(
                request_id = %request.request_id,
                request_type = %request.request_type,
                "Request carries no PhysicalResourceId, responding with an empty one"
            );
            PhysicalResourceId::default()
        }
    }
}

fn resolve_success(response: &Value, request: &LifecycleRequest) -> ResponsePayload {
    let empty = Map::new();
    let fields = match response.as_object() {
        Some(object) => object,
        None => {
            if !response.is_null() {
                tracing::warn!(
                    request_id = %request.request_id,
                    "Handler returned a non-object value, applying defaults to every field"
                );
            }
            &empty
        }
    };

    for key in fields.keys() {
        if REQUEST_FIELDS.contains(&key.as_str()) {
            tracing::debug!(key = %key, "Ignoring request-owned key in handler output");
        } else if !HANDLER_FIELDS.contains(&key.as_str()) {
            tracing::debug!(key = %key, "Ignoring unknown key in handler output");
        }
    }

    let status = match fields.get("Status") {
        None | Some(Value::Null) => ResponseStatus::Success,
        Some(value) => match value.as_str().and_then(ResponseStatus::parse) {
            Some(status) => status,
            None => {
                tracing::warn!(status = %value, "Ignoring unrecognised Status in handler output");
                ResponseStatus::Success
            }
        },
    };

    let reason = fields.get("Reason").and_then(handler_text).unwrap_or_default();

    let physical_resource_id = fields
        .get("PhysicalResourceId")
        .and_then(handler_text)
        .map(PhysicalResourceId::from)
        .unwrap_or_else(|| default_physical_resource_id(request));

    let data = fields.get("Data").and_then(|value| value.as_object().cloned());
    let no_echo = fields.get("NoEcho").and_then(Value::as_bool);

    ResponsePayload {
        status,
        reason,
        physical_resource_id,
        stack_id: request.stack_id.clone(),
        request_id: request.request_id.clone(),
        logical_resource_id: request.logical_resource_id.clone(),
        data,
        no_echo,
    }
}

/// Renders a handler-supplied scalar as response text.
///
/// Strings pass through; other values render as their JSON text. `null`
/// counts as not supplied.
pub(crate) fn handler_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
