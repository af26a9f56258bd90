//! Template assembly.
//!
//! [`assemble`] composes the compiled mapping rules and the surrounding
//! wiring into one infrastructure document:
//!
//! ```text
//! handler ──destination──▶ EventBus ──Rule──▶ Api{hash} PUT / ──▶ ResponseURL
//!                                       │
//!                                 RuleTargetRole
//! ```
//!
//! The gateway's logical id, and those of its deployment and stage, end in a
//! content hash of the gateway definition. Any change to the mapping
//! template therefore produces a new deployment instead of leaving the stage
//! on a stale one.
//!
//! Nothing account- or region-specific is written literally; see
//! [`intrinsics`].

pub mod intrinsics;

use blake2::{Blake2b512, Digest};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::compiler::{self, vtl};
use crate::config::{ParameterSpec, ResponderConfig};
use crate::error::{ResponderError, ResponderResult};
use crate::event::{EVENT_SOURCE, FAILURE_DETAIL_TYPE, SUCCESS_DETAIL_TYPE};

use self::intrinsics::{
    equals, get_att, if_, is_pseudo_parameter, join, join_list, not, reference, split, stack_scoped,
    ACCOUNT_ID, NO_VALUE, PARTITION, REGION, URL_SUFFIX,
};

/// Template format version written to every document.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// Parameter: how long the bus retries delivery.
pub const MAXIMUM_EVENT_AGE_PARAMETER: &str = "MaximumEventAgeInSeconds";
/// Parameter: how many delivery attempts the bus makes.
pub const MAXIMUM_RETRY_ATTEMPTS_PARAMETER: &str = "MaximumRetryAttempts";
/// Parameter: optional queue for undeliverable events.
pub const DEAD_LETTER_QUEUE_PARAMETER: &str = "DeadLetterQueueArn";
/// Condition: a dead-letter queue was given.
pub const HAS_DEAD_LETTER_QUEUE: &str = "HasDeadLetterQueue";

/// Logical id of the event bus handlers publish to.
pub const EVENT_BUS: &str = "EventBus";
/// Logical id of the role the bus rule assumes.
pub const RULE_TARGET_ROLE: &str = "RuleTargetRole";
/// Logical id of the bus rule.
pub const RULE: &str = "Rule";
/// Logical id of the policy granting handlers publish rights.
pub const DESTINATION_POLICY: &str = "DestinationPolicy";
/// Output carrying the destination ARN.
pub const DESTINATION_OUTPUT: &str = "DestinationARN";
/// Output carrying the publisher policy ARN.
pub const DESTINATION_POLICY_OUTPUT: &str = "DestinationPolicyARN";

const POLICY_VERSION: &str = "2012-10-17";
const RESPONSE_BUCKET_PREFIX: &str = "https://cloudformation-custom-resource-response-";

/// A complete infrastructure document.
///
/// Sections are `serde_json` maps with sorted keys, so serialization is
/// byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    /// Always [`FORMAT_VERSION`]
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    /// Free-form description
    #[serde(rename = "Description")]
    pub description: String,
    /// Deploy-time inputs
    #[serde(rename = "Parameters")]
    pub parameters: Map<String, Value>,
    /// Named conditions
    #[serde(rename = "Conditions")]
    pub conditions: Map<String, Value>,
    /// Resources by logical id
    #[serde(rename = "Resources")]
    pub resources: Map<String, Value>,
    /// Outputs by name
    #[serde(rename = "Outputs")]
    pub outputs: Map<String, Value>,
}

impl Template {
    fn new(description: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: description.to_string(),
            parameters: Map::new(),
            conditions: Map::new(),
            resources: Map::new(),
            outputs: Map::new(),
        }
    }

    fn add_resource(&mut self, logical_id: impl Into<String>, resource_type: &str, properties: Value) {
        self.resources.insert(
            logical_id.into(),
            json!({ "Type": resource_type, "Properties": properties }),
        );
    }

    /// Returns a resource by logical id.
    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources.get(logical_id)
    }

    /// Logical ids of every resource of `resource_type`.
    pub fn resource_ids_of_type(&self, resource_type: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, resource)| resource["Type"] == resource_type)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Returns an output by name.
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Checks that every `Ref`, `Fn::GetAtt` and `Fn::If` target is declared.
    pub fn validate_references(&self) -> ResponderResult<()> {
        let mut dangling = Vec::new();
        for section in [&self.conditions, &self.resources, &self.outputs] {
            for value in section.values() {
                for name in intrinsics::references(value) {
                    let declared = is_pseudo_parameter(&name)
                        || self.parameters.contains_key(&name)
                        || self.conditions.contains_key(&name)
                        || self.resources.contains_key(&name);
                    if !declared && !dangling.contains(&name) {
                        dangling.push(name);
                    }
                }
            }
        }
        if dangling.is_empty() {
            Ok(())
        } else {
            Err(ResponderError::validation(format!(
                "undeclared references: {}",
                dangling.join(", ")
            )))
        }
    }

    /// The document as a JSON value.
    pub fn to_value(&self) -> ResponderResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The document as pretty-printed JSON.
    pub fn to_json(&self) -> ResponderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Uppercase hex BLAKE2b-512 digest of the canonical JSON text of `value`,
/// truncated to `length` characters.
pub fn content_hash(value: &Value, length: usize) -> ResponderResult<String> {
    let canonical = serde_json::to_vec(value)?;
    let mut hasher = Blake2b512::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|byte| format!("{:02X}", byte)).collect();
    Ok(hex.chars().take(length).collect())
}

/// Builds the complete document.
pub fn assemble(config: &ResponderConfig) -> ResponderResult<Template> {
    config.validate()?;

    let rules = compiler::compile();
    let request_template = vtl::render_request_template(&rules);

    let api = gateway_api(config, &request_template);
    let hash = content_hash(&api, config.hash_length)?;
    let api_id = format!("Api{}", hash);
    let deployment_id = format!("Deployment{}", hash);
    let stage_id = format!("Stage{}", hash);

    let mut template = Template::new(&config.description);
    add_parameters(&mut template, config);
    template.conditions.insert(
        HAS_DEAD_LETTER_QUEUE.to_string(),
        not(equals(reference(DEAD_LETTER_QUEUE_PARAMETER), Value::from(""))),
    );

    template.resources.insert(api_id.clone(), api);
    template.add_resource(
        deployment_id.clone(),
        "AWS::ApiGateway::Deployment",
        json!({ "RestApiId": reference(&api_id) }),
    );
    template.add_resource(
        stage_id.clone(),
        "AWS::ApiGateway::Stage",
        json!({
            "RestApiId": reference(&api_id),
            "DeploymentId": reference(&deployment_id),
            "StageName": config.stage_name,
        }),
    );

    let endpoint_arn = join(
        ":",
        vec![
            Value::from("arn"),
            reference(PARTITION),
            Value::from("execute-api"),
            reference(REGION),
            reference(ACCOUNT_ID),
            join(
                "/",
                vec![reference(&api_id), reference(&stage_id), Value::from("PUT"), Value::from("")],
            ),
        ],
    );
    let invoke_name = format!("Invoke{}", api_id);

    template.add_resource(
        EVENT_BUS,
        "AWS::Events::EventBus",
        json!({ "Name": stack_scoped("-", &config.event_bus_name_suffix) }),
    );

    template.add_resource(
        DESTINATION_POLICY,
        "AWS::IAM::ManagedPolicy",
        json!({
            "Description": "Allows a function to use the responder as its invocation destination",
            "PolicyDocument": {
                "Version": POLICY_VERSION,
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["events:PutEvents"],
                    "Resource": [get_att(EVENT_BUS, "Arn")],
                }],
            },
        }),
    );

    template.add_resource(
        RULE_TARGET_ROLE,
        "AWS::IAM::Role",
        json!({
            "AssumeRolePolicyDocument": {
                "Version": POLICY_VERSION,
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": ["events.amazonaws.com"] },
                    "Action": ["sts:AssumeRole"],
                }],
            },
            "Policies": [{
                "PolicyName": invoke_name,
                "PolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": ["execute-api:Invoke"],
                        "Resource": [endpoint_arn],
                    }],
                },
            }],
        }),
    );

    template.add_resource(
        RULE,
        "AWS::Events::Rule",
        json!({
            "EventBusName": reference(EVENT_BUS),
            "EventPattern": {
                "detail-type": [SUCCESS_DETAIL_TYPE, FAILURE_DETAIL_TYPE],
                "source": [EVENT_SOURCE],
            },
            "Targets": [{
                "Id": invoke_name,
                "Arn": endpoint_arn,
                "RoleArn": get_att(RULE_TARGET_ROLE, "Arn"),
                "RetryPolicy": {
                    "MaximumEventAgeInSeconds": reference(MAXIMUM_EVENT_AGE_PARAMETER),
                    "MaximumRetryAttempts": reference(MAXIMUM_RETRY_ATTEMPTS_PARAMETER),
                },
                "DeadLetterConfig": if_(
                    HAS_DEAD_LETTER_QUEUE,
                    json!({ "Arn": reference(DEAD_LETTER_QUEUE_PARAMETER) }),
                    reference(NO_VALUE),
                ),
            }],
        }),
    );

    template.outputs.insert(
        DESTINATION_OUTPUT.to_string(),
        json!({
            "Description": "Invocation destination for custom resource handlers",
            "Value": get_att(EVENT_BUS, "Arn"),
            "Export": { "Name": stack_scoped("::", &config.export_name_suffix) },
        }),
    );
    template.outputs.insert(
        DESTINATION_POLICY_OUTPUT.to_string(),
        json!({
            "Description": "Managed policy to attach to handler execution roles",
            "Value": reference(DESTINATION_POLICY),
            "Export": { "Name": stack_scoped("::", &config.policy_export_name_suffix) },
        }),
    );

    template.validate_references()?;
    tracing::info!(
        hash = %hash,
        resources = template.resources.len(),
        "Assembled responder template"
    );
    Ok(template)
}

fn add_parameters(template: &mut Template, config: &ResponderConfig) {
    template.parameters.insert(
        MAXIMUM_EVENT_AGE_PARAMETER.to_string(),
        number_parameter(
            &config.maximum_event_age,
            "Seconds the event bus keeps retrying delivery of a response",
        ),
    );
    template.parameters.insert(
        MAXIMUM_RETRY_ATTEMPTS_PARAMETER.to_string(),
        number_parameter(
            &config.maximum_retry_attempts,
            "Delivery attempts the event bus makes for a response",
        ),
    );
    template.parameters.insert(
        DEAD_LETTER_QUEUE_PARAMETER.to_string(),
        json!({
            "Type": "String",
            "Default": "",
            "Description": "Optional SQS queue ARN receiving responses that could not be delivered",
        }),
    );
}

fn number_parameter(spec: &ParameterSpec, description: &str) -> Value {
    json!({
        "Type": "Number",
        "Default": spec.default,
        "MinValue": spec.min,
        "MaxValue": spec.max,
        "Description": description,
    })
}

/// The regional REST API whose single `PUT /` operation hosts the mapping
/// template and proxies the write to the response bucket.
fn gateway_api(config: &ResponderConfig, request_template: &str) -> Value {
    let bucket_uri = join(
        "",
        vec![
            Value::from(RESPONSE_BUCKET_PREFIX),
            join_list("", split("-", reference(REGION))),
            Value::from(".s3."),
            reference(URL_SUFFIX),
            Value::from("/{path}"),
        ],
    );

    json!({
        "Type": "AWS::ApiGateway::RestApi",
        "Properties": {
            "EndpointConfiguration": { "Types": ["REGIONAL"] },
            "FailOnWarnings": true,
            "Body": {
                "swagger": "2.0",
                "info": { "title": stack_scoped("-", &config.api_name_suffix) },
                "paths": {
                    "/": {
                        "put": {
                            "consumes": ["application/json"],
                            "produces": ["application/json"],
                            "security": [{ "sigv4": [] }],
                            "responses": {
                                "200": { "description": "200 response" },
                                "500": { "description": "500 response" },
                            },
                            "x-amazon-apigateway-integration": {
                                "type": "http",
                                "httpMethod": "PUT",
                                "uri": bucket_uri,
                                "passthroughBehavior": "never",
                                "requestParameters": {
                                    "integration.request.header.Content-Type": "''",
                                },
                                "requestTemplates": {
                                    "application/json": request_template,
                                },
                                "responses": {
                                    "default": { "statusCode": "200" },
                                    "[^2]\\d{2}": { "statusCode": "500" },
                                },
                            },
                        },
                    },
                },
                "securityDefinitions": {
                    "sigv4": {
                        "type": "apiKey",
                        "name": "Authorization",
                        "in": "header",
                        "x-amazon-apigateway-authtype": "awsSigv4",
                    },
                },
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        assemble(&ResponderConfig::default()).unwrap()
    }

    #[test]
    fn test_content_hash_shape() {
        let hash = content_hash(&json!({"a": 1}), 12).unwrap();
        assert_eq!(hash.len(), 12);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(hash, content_hash(&json!({"a": 2}), 12).unwrap());
        assert_eq!(content_hash(&json!({"a": 1}), 128).unwrap().len(), 128);
    }

    #[test]
    fn test_gateway_ids_share_hash() {
        let template = template();
        let apis = template.resource_ids_of_type("AWS::ApiGateway::RestApi");
        assert_eq!(apis.len(), 1);
        let hash = apis[0].trim_start_matches("Api");
        assert_eq!(hash.len(), 12);
        assert!(template.resource(&format!("Deployment{}", hash)).is_some());
        assert!(template.resource(&format!("Stage{}", hash)).is_some());
    }

    #[test]
    fn test_hash_tracks_config() {
        let a = template();
        let mut config = ResponderConfig::default();
        config.api_name_suffix = "OtherAPI".to_string();
        let b = assemble(&config).unwrap();
        assert_ne!(
            a.resource_ids_of_type("AWS::ApiGateway::RestApi"),
            b.resource_ids_of_type("AWS::ApiGateway::RestApi")
        );
    }

    #[test]
    fn test_stage_name_from_config() {
        let template = template();
        let stage_id = template.resource_ids_of_type("AWS::ApiGateway::Stage")[0];
        assert_eq!(template.resources[stage_id]["Properties"]["StageName"], "api");
    }

    #[test]
    fn test_integration_sets_empty_content_type() {
        let template = template();
        let api_id = template.resource_ids_of_type("AWS::ApiGateway::RestApi")[0];
        let integration = &template.resources[api_id]["Properties"]["Body"]["paths"]["/"]["put"]
            ["x-amazon-apigateway-integration"];
        assert_eq!(integration["requestParameters"]["integration.request.header.Content-Type"], "''");
        assert_eq!(integration["passthroughBehavior"], "never");
        assert!(integration["requestTemplates"]["application/json"]
            .as_str()
            .unwrap()
            .contains("requestOverride"));
    }

    #[test]
    fn test_dead_letter_config_is_conditional() {
        let template = template();
        let target = &template.resources[RULE]["Properties"]["Targets"][0];
        assert_eq!(target["DeadLetterConfig"]["Fn::If"][0], HAS_DEAD_LETTER_QUEUE);
        assert_eq!(target["RetryPolicy"]["MaximumEventAgeInSeconds"], reference(MAXIMUM_EVENT_AGE_PARAMETER));
        assert!(template.conditions.contains_key(HAS_DEAD_LETTER_QUEUE));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ResponderConfig::default();
        config.hash_length = 0;
        assert!(matches!(assemble(&config), Err(ResponderError::Validation { .. })));
    }

    #[test]
    fn test_dangling_reference_detected() {
        let mut template = template();
        template.outputs.insert("Broken".to_string(), json!({"Value": reference("Nope")}));
        let err = template.validate_references().unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }
}
