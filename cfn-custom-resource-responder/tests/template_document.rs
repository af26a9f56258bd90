//! Integration tests for the generated CloudFormation document.

mod common;

use serde_json::{json, Value};

use cfn_custom_resource_responder::config::{MAXIMUM_EVENT_AGE, MAXIMUM_RETRY_ATTEMPTS};
use cfn_custom_resource_responder::event::{EVENT_SOURCE, FAILURE_DETAIL_TYPE, SUCCESS_DETAIL_TYPE};
use cfn_custom_resource_responder::template::{
    DEAD_LETTER_QUEUE_PARAMETER, DESTINATION_OUTPUT, DESTINATION_POLICY_OUTPUT, EVENT_BUS,
    MAXIMUM_EVENT_AGE_PARAMETER, MAXIMUM_RETRY_ATTEMPTS_PARAMETER,
};
use cfn_custom_resource_responder::{assemble, ResponderConfig};

use common::*;

fn stack_scoped(delimiter: &str, suffix: &str) -> Value {
    json!({"Fn::Join": [delimiter, [{"Ref": "AWS::StackName"}, suffix]]})
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_regeneration_is_byte_identical() {
    let first = assemble(&ResponderConfig::default()).unwrap().to_json().unwrap();
    let second = assemble(&ResponderConfig::default()).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_document_is_valid_json() {
    let text = assemble(&ResponderConfig::default()).unwrap().to_json().unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, default_template());
    assert_eq!(parsed["AWSTemplateFormatVersion"], "2010-09-09");
}

// =============================================================================
// Parameters
// =============================================================================

#[test]
fn test_retry_parameters_carry_bounds() {
    let template = default_template();
    let parameters = &template["Parameters"];

    let age = &parameters[MAXIMUM_EVENT_AGE_PARAMETER];
    assert_eq!(age["Type"], "Number");
    assert_eq!(age["Default"], MAXIMUM_EVENT_AGE.default);
    assert_eq!(age["MinValue"], 60);
    assert_eq!(age["MaxValue"], 86400);

    let attempts = &parameters[MAXIMUM_RETRY_ATTEMPTS_PARAMETER];
    assert_eq!(attempts["Default"], MAXIMUM_RETRY_ATTEMPTS.default);
    assert_eq!(attempts["MinValue"], 0);
    assert_eq!(attempts["MaxValue"], 185);

    assert_eq!(parameters[DEAD_LETTER_QUEUE_PARAMETER]["Default"], "");
}

#[test]
fn test_rule_target_reads_retry_parameters() {
    let template = default_template();
    let (_, rule) = single_resource(&template, "AWS::Events::Rule");
    let target = &rule["Properties"]["Targets"][0];
    assert_eq!(
        target["RetryPolicy"],
        json!({
            "MaximumEventAgeInSeconds": {"Ref": MAXIMUM_EVENT_AGE_PARAMETER},
            "MaximumRetryAttempts": {"Ref": MAXIMUM_RETRY_ATTEMPTS_PARAMETER},
        })
    );
}

// =============================================================================
// Portability
// =============================================================================

#[test]
fn test_no_region_or_account_is_hard_coded() {
    let template = default_template();
    let (api_id, _) = single_resource(&template, "AWS::ApiGateway::RestApi");
    let hash = api_id.trim_start_matches("Api").to_string();
    let text = assemble(&ResponderConfig::default())
        .unwrap()
        .to_json()
        .unwrap()
        .replace(&hash, "");
    for region in ["us-east-1", "us-west-2", "eu-west-1", "useast1"] {
        assert!(!text.contains(region), "template mentions {}", region);
    }

    let digits: Vec<&str> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| run.len() == 12)
        .collect();
    assert!(digits.is_empty(), "template mentions account-like ids {:?}", digits);
}

#[test]
fn test_names_are_scoped_to_stack() {
    let template = default_template();
    let (_, bus) = single_resource(&template, "AWS::Events::EventBus");
    assert_eq!(bus["Properties"]["Name"], stack_scoped("-", "CustomResourceResponderEventBus"));

    let (_, api) = single_resource(&template, "AWS::ApiGateway::RestApi");
    assert_eq!(
        api["Properties"]["Body"]["info"]["title"],
        stack_scoped("-", "CustomResourceResponderAPI")
    );
}

// =============================================================================
// Outputs
// =============================================================================

#[test]
fn test_destination_is_exported() {
    let template = default_template();
    let output = &template["Outputs"][DESTINATION_OUTPUT];
    assert_eq!(output["Value"], json!({"Fn::GetAtt": [EVENT_BUS, "Arn"]}));
    assert_eq!(output["Export"]["Name"], stack_scoped("::", "DestinationARN"));
}

#[test]
fn test_destination_policy_grants_put_events() {
    let template = default_template();
    let output = &template["Outputs"][DESTINATION_POLICY_OUTPUT];
    assert_eq!(output["Export"]["Name"], stack_scoped("::", "DestinationPolicyARN"));

    let (_, policy) = single_resource(&template, "AWS::IAM::ManagedPolicy");
    let statement = &policy["Properties"]["PolicyDocument"]["Statement"][0];
    assert_eq!(statement["Action"], json!(["events:PutEvents"]));
    assert_eq!(statement["Resource"], json!([{"Fn::GetAtt": [EVENT_BUS, "Arn"]}]));
}

// =============================================================================
// Routing
// =============================================================================

#[test]
fn test_rule_matches_both_invocation_outcomes() {
    let template = default_template();
    let (_, rule) = single_resource(&template, "AWS::Events::Rule");
    let pattern = &rule["Properties"]["EventPattern"];
    assert_eq!(pattern["detail-type"], json!([SUCCESS_DETAIL_TYPE, FAILURE_DETAIL_TYPE]));
    assert_eq!(pattern["source"], json!([EVENT_SOURCE]));
    assert_eq!(rule["Properties"]["EventBusName"], json!({"Ref": EVENT_BUS}));
}

#[test]
fn test_rule_target_invokes_stage() {
    let template = default_template();
    let (stage_id, _) = single_resource(&template, "AWS::ApiGateway::Stage");
    let (role_id, _) = single_resource(&template, "AWS::IAM::Role");
    let (_, rule) = single_resource(&template, "AWS::Events::Rule");

    let target = &rule["Properties"]["Targets"][0];
    let arn = serde_json::to_string(&target["Arn"]).unwrap();
    assert!(arn.contains("execute-api"));
    assert!(arn.contains(stage_id));
    assert_eq!(target["RoleArn"], json!({"Fn::GetAtt": [role_id, "Arn"]}));
}

#[test]
fn test_gateway_resources_share_content_hash() {
    let template = default_template();
    let (api_id, _) = single_resource(&template, "AWS::ApiGateway::RestApi");
    let (deployment_id, deployment) = single_resource(&template, "AWS::ApiGateway::Deployment");
    let (stage_id, _) = single_resource(&template, "AWS::ApiGateway::Stage");

    let hash = api_id.trim_start_matches("Api");
    assert_eq!(hash.len(), 12);
    assert_eq!(deployment_id, format!("Deployment{}", hash));
    assert_eq!(stage_id, format!("Stage{}", hash));
    assert_eq!(deployment["Properties"]["RestApiId"], json!({"Ref": api_id}));
}

// =============================================================================
// Mapping template
// =============================================================================

#[test]
fn test_request_template_is_embedded() {
    let template = default_template();
    let mapping = request_mapping_template(&template);
    assert!(mapping.contains("$context.requestOverride.path.path"));
    assert!(mapping.contains(FAILURE_DETAIL_TYPE));
    for field in [
        "Status",
        "Reason",
        "PhysicalResourceId",
        "StackId",
        "RequestId",
        "LogicalResourceId",
        "Data",
        "NoEcho",
    ] {
        assert!(mapping.contains(&format!("\"{}\"", field)), "missing {}", field);
    }
}

#[test]
fn test_integration_writes_to_response_bucket() {
    let template = default_template();
    let (_, api) = single_resource(&template, "AWS::ApiGateway::RestApi");
    let integration = &api["Properties"]["Body"]["paths"]["/"]["put"]["x-amazon-apigateway-integration"];
    assert_eq!(integration["httpMethod"], "PUT");
    assert_eq!(integration["requestParameters"]["integration.request.header.Content-Type"], "''");
    let uri = serde_json::to_string(&integration["uri"]).unwrap();
    assert!(uri.contains("cloudformation-custom-resource-response-"));
    assert!(uri.contains("AWS::URLSuffix"));
}
