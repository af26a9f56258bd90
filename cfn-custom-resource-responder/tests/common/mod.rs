//! Shared test utilities for integration tests.
//!
//! This module provides helper functions for running events through both the
//! typed resolver and the compiled rules, and for inspecting the generated
//! template.

#![allow(dead_code)] // These utilities are used by other integration test files

use serde_json::Value;

use cfn_custom_resource_responder::{
    assemble, compile, resolve_event, EvalMode, InvocationResultEvent, ResponderConfig,
};

pub use cfn_custom_resource_responder_testing::fixtures::{
    EventBuilder, Outcome, LOGICAL_RESOURCE_ID, REQUEST_ID, STACK_ID,
};
pub use cfn_custom_resource_responder_testing::strategies::*;

/// The typed resolver's answer for a raw event, as JSON.
pub fn resolved_body(event: &Value) -> Value {
    let narrowed = InvocationResultEvent::from_value(event.clone()).expect("event should narrow");
    serde_json::to_value(resolve_event(&narrowed)).expect("payload should serialize")
}

/// The compiled rules' answer for a raw event, with gateway semantics.
pub fn rule_body(event: &Value) -> Value {
    let body = compile()
        .apply(event, EvalMode::DefaultOnMissing)
        .expect("default-on-missing evaluation never fails");
    Value::Object(body)
}

/// The default template as JSON.
pub fn default_template() -> Value {
    assemble(&ResponderConfig::default())
        .expect("default config should assemble")
        .to_value()
        .expect("template should serialize")
}

/// The single resource of `resource_type` in a template value.
pub fn single_resource<'a>(template: &'a Value, resource_type: &str) -> (&'a str, &'a Value) {
    let matches: Vec<(&str, &Value)> = template["Resources"]
        .as_object()
        .expect("Resources should be an object")
        .iter()
        .filter(|(_, resource)| resource["Type"] == resource_type)
        .map(|(id, resource)| (id.as_str(), resource))
        .collect();
    assert_eq!(matches.len(), 1, "expected exactly one {}", resource_type);
    matches[0]
}

/// The request mapping template embedded in a template value.
pub fn request_mapping_template(template: &Value) -> String {
    let (_, api) = single_resource(template, "AWS::ApiGateway::RestApi");
    api["Properties"]["Body"]["paths"]["/"]["put"]["x-amazon-apigateway-integration"]["requestTemplates"]
        ["application/json"]
        .as_str()
        .expect("request template should be a string")
        .to_string()
}
