//! Intrinsic functions and pseudo parameters of the template language.
//!
//! Every account-, region- or stack-specific value in the generated document
//! is one of these, resolved by the orchestrator at deploy time.

use std::collections::BTreeSet;

use serde_json::{json, Value};

/// `AWS::AccountId`
pub const ACCOUNT_ID: &str = "AWS::AccountId";
/// `AWS::NoValue`
pub const NO_VALUE: &str = "AWS::NoValue";
/// `AWS::Partition`
pub const PARTITION: &str = "AWS::Partition";
/// `AWS::Region`
pub const REGION: &str = "AWS::Region";
/// `AWS::StackName`
pub const STACK_NAME: &str = "AWS::StackName";
/// `AWS::URLSuffix`
pub const URL_SUFFIX: &str = "AWS::URLSuffix";

/// `{"Ref": name}`
pub fn reference(name: &str) -> Value {
    json!({ "Ref": name })
}

/// `{"Fn::GetAtt": [resource, attribute]}`
pub fn get_att(resource: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [resource, attribute] })
}

/// `{"Fn::Join": [delimiter, parts]}`
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// `{"Fn::Join": [delimiter, list]}` for a list produced by another intrinsic.
pub fn join_list(delimiter: &str, list: Value) -> Value {
    json!({ "Fn::Join": [delimiter, list] })
}

/// `{"Fn::Split": [delimiter, source]}`
pub fn split(delimiter: &str, source: Value) -> Value {
    json!({ "Fn::Split": [delimiter, source] })
}

/// `{"Fn::If": [condition, then, otherwise]}`
pub fn if_(condition: &str, then: Value, otherwise: Value) -> Value {
    json!({ "Fn::If": [condition, then, otherwise] })
}

/// `{"Fn::Equals": [left, right]}`
pub fn equals(left: Value, right: Value) -> Value {
    json!({ "Fn::Equals": [left, right] })
}

/// `{"Fn::Not": [condition]}`
pub fn not(condition: Value) -> Value {
    json!({ "Fn::Not": [condition] })
}

/// `{StackName}{delimiter}{suffix}`
pub fn stack_scoped(delimiter: &str, suffix: &str) -> Value {
    join(delimiter, vec![reference(STACK_NAME), Value::from(suffix)])
}

/// Returns true for `AWS::` pseudo parameters.
pub fn is_pseudo_parameter(name: &str) -> bool {
    name.starts_with("AWS::")
}

/// Every name targeted by a `Ref` or `Fn::GetAtt` inside `value`, and every
/// condition named by `Fn::If`.
pub fn references(value: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::Object(object) => {
            if let Some(Value::String(name)) = object.get("Ref") {
                found.insert(name.clone());
            }
            for key in ["Fn::GetAtt", "Fn::If"] {
                if let Some(Value::String(name)) = object.get(key).and_then(|args| args.get(0)) {
                    found.insert(name.clone());
                }
            }
            for nested in object.values() {
                collect_references(nested, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        _ => {}
    }
}
