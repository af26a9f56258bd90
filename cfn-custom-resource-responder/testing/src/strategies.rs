//! Proptest strategies for lifecycle requests, handler outputs and
//! destination events.
//!
//! Handler outputs deliberately include ill-typed and unknown fields and
//! non-object return values, since those are what the responder must absorb.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use cfn_custom_resource_responder::{FunctionError, RequestType};

use crate::fixtures::{EventBuilder, Outcome};

/// Strategy for generating RequestType values.
pub fn request_type_strategy() -> impl Strategy<Value = RequestType> {
    prop_oneof![
        Just(RequestType::Create),
        Just(RequestType::Update),
        Just(RequestType::Delete),
    ]
}

/// Strategy for generating identifier strings.
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9-]{0,35}".prop_map(|s| s)
}

/// Strategy for generating free-form text.
pub fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .:'\"/_-]{0,40}".prop_map(|s| s)
}

/// Strategy for generating JSON scalars, `null` included.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        text_strategy().prop_map(Value::String),
    ]
}

/// Strategy for generating arbitrary JSON values up to a small depth.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{1,8}", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for `Status` values a handler might return.
pub fn status_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!("SUCCESS")),
        Just(json!("FAILED")),
        Just(json!("failed")),
        Just(json!("Success")),
        scalar_strategy(),
    ]
}

/// Strategy for return values that are not objects.
pub fn malformed_output_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        scalar_strategy(),
        prop::collection::vec(scalar_strategy(), 0..4).prop_map(Value::Array),
    ]
}

/// Strategy for handler return objects: any subset of the response fields,
/// sometimes ill-typed, plus request-owned and unknown keys.
pub fn handler_object_strategy() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(status_value_strategy()),
        proptest::option::of(scalar_strategy()),
        proptest::option::of(prop_oneof![identifier_strategy().prop_map(Value::String), scalar_strategy()]),
        proptest::option::of(json_value_strategy()),
        proptest::option::of(scalar_strategy()),
        proptest::option::of(identifier_strategy()),
        proptest::option::of(json_value_strategy()),
    )
        .prop_map(|(status, reason, physical_id, data, no_echo, stolen_id, extra)| {
            let mut object = Map::new();
            let fields = [
                ("Status", status),
                ("Reason", reason),
                ("PhysicalResourceId", physical_id),
                ("Data", data),
                ("NoEcho", no_echo),
                ("RequestId", stolen_id.map(Value::String)),
                ("Unrelated", extra),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    object.insert(key.to_string(), value);
                }
            }
            Value::Object(object)
        })
}

/// Strategy for anything a handler might return.
pub fn handler_output_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => handler_object_strategy(),
        1 => malformed_output_strategy(),
    ]
}

/// Strategy for handler faults; the type may be empty.
pub fn function_error_strategy() -> impl Strategy<Value = FunctionError> {
    (prop_oneof![Just(String::new()), "[A-Z][a-zA-Z]{0,20}"], text_strategy())
        .prop_map(|(error_type, message)| FunctionError::new(error_type, message))
}

/// Strategy for fault payloads as a runtime might report them: fields may
/// be missing, `null` or of the wrong type, and the payload may not be an
/// object at all.
pub fn fault_payload_strategy() -> impl Strategy<Value = Value> {
    let error_type = prop_oneof![
        3 => "[A-Z][a-zA-Z]{0,20}".prop_map(Value::String),
        1 => scalar_strategy(),
    ];
    let error_message = prop_oneof![
        3 => text_strategy().prop_map(Value::String),
        1 => json_value_strategy(),
    ];
    let stack_trace = prop_oneof![
        prop::collection::vec(text_strategy().prop_map(Value::String), 0..3).prop_map(Value::Array),
        text_strategy().prop_map(Value::String),
        scalar_strategy(),
    ];
    let object = (
        proptest::option::of(error_type),
        proptest::option::of(error_message),
        proptest::option::of(stack_trace),
    )
        .prop_map(|(error_type, error_message, stack_trace)| {
            let mut object = Map::new();
            let fields = [
                ("errorType", error_type),
                ("errorMessage", error_message),
                ("stackTrace", stack_trace),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    object.insert(key.to_string(), value);
                }
            }
            Value::Object(object)
        });
    prop_oneof![
        4 => object,
        1 => malformed_output_strategy(),
    ]
}

/// Strategy for invocation outcomes.
pub fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        4 => handler_output_strategy().prop_map(Outcome::Returned),
        2 => function_error_strategy().prop_map(Outcome::Raised),
        1 => fault_payload_strategy().prop_map(Outcome::RaisedPayload),
        1 => prop_oneof![Just("RetriesExhausted"), Just("EventAgeExceeded")]
            .prop_map(|condition| Outcome::Abandoned(condition.to_string())),
    ]
}

/// Strategy for complete event builders.
///
/// Update and Delete requests usually carry a current physical id. Create
/// requests may carry a stray one, which must be ignored.
pub fn event_builder_strategy() -> impl Strategy<Value = EventBuilder> {
    (
        request_type_strategy(),
        identifier_strategy(),
        identifier_strategy(),
        "[A-Z][a-zA-Z0-9]{0,20}",
        prop::option::weighted(0.8, identifier_strategy()),
        outcome_strategy(),
    )
        .prop_map(|(request_type, stack_name, request_id, logical_id, physical_id, outcome)| {
            EventBuilder::request(request_type, physical_id)
                .with_stack_id(format!(
                    "arn:aws:cloudformation:us-east-1:123456789012:stack/{}/guid",
                    stack_name
                ))
                .with_request_id(request_id)
                .with_logical_resource_id(logical_id)
                .with_outcome(outcome)
        })
}

/// Strategy for raw destination events.
pub fn destination_event_strategy() -> impl Strategy<Value = Value> {
    event_builder_strategy().prop_map(|builder| builder.build())
}
