//! Mapping rule compiler.
//!
//! Builds the success-path and failure-path [`RuleSet`]s that turn a
//! destination event into the orchestrator's response body, and renders them
//! into the gateway mapping template ([`vtl`]). The rules read only the event
//! itself; no lookup or compute happens while a response is built.
//!
//! The rule sets encode exactly what [`crate::resolver::resolve`] computes,
//! which the tests in `tests/rule_equivalence.rs` hold them to.

pub mod vtl;

use crate::event::{RequestType, ResponseStatus, FAILURE_DETAIL_TYPE};
use crate::rules::{Condition, Expr, FieldPath, FieldRule, JsonKind, MappingRules, ResultVariant, RuleSet};

/// Where the destination record keeps the original lifecycle request.
pub const REQUEST_PAYLOAD: &str = "detail.requestPayload";

/// Where the destination record keeps the handler's return value or fault.
pub const RESPONSE_PAYLOAD: &str = "detail.responsePayload";

/// Present when the handler raised.
pub const FUNCTION_ERROR: &str = "detail.responseContext.functionError";

/// Why the destination mechanism gave up, e.g. `RetriesExhausted`.
pub const INVOCATION_CONDITION: &str = "detail.requestContext.condition";

/// Envelope key carrying the Success/Failure detail-type.
pub const DETAIL_TYPE: &str = "detail-type";

/// Path to a field of the original lifecycle request.
pub fn request_field(name: &str) -> FieldPath {
    FieldPath::parse(REQUEST_PAYLOAD).child(name)
}

/// Path to a field of the handler's response payload.
pub fn response_field(name: &str) -> FieldPath {
    FieldPath::parse(RESPONSE_PAYLOAD).child(name)
}

/// Holds for events describing a failed invocation.
pub fn failure_condition() -> Condition {
    Condition::Any(vec![
        Condition::present(FUNCTION_ERROR),
        Condition::equals(FieldPath::new([DETAIL_TYPE]), FAILURE_DETAIL_TYPE),
    ])
}

/// Compiles both rule sets.
pub fn compile() -> MappingRules {
    let rules = MappingRules {
        failure_when: failure_condition(),
        success: compile_success_rules(),
        failure: compile_failure_rules(),
    };
    tracing::debug!(
        success_fields = rules.success.fields.len(),
        failure_fields = rules.failure.fields.len(),
        "Compiled mapping rules"
    );
    rules
}

/// Rules for an invocation that returned normally.
///
/// Handler-supplied values win where they are well-typed; everything else
/// falls back to a default or to the request.
pub fn compile_success_rules() -> RuleSet {
    let statuses = ResponseStatus::all().map(|status| status.as_str());
    let mut fields = vec![
        FieldRule::required(
            "Status",
            Expr::coalesce(vec![
                Expr::one_of(response_field("Status"), statuses),
                Expr::literal(ResponseStatus::Success.as_str()),
            ]),
        ),
        FieldRule::required(
            "Reason",
            Expr::coalesce(vec![Expr::text(response_field("Reason")), Expr::literal("")]),
        ),
        FieldRule::required(
            "PhysicalResourceId",
            Expr::coalesce(vec![
                Expr::text(response_field("PhysicalResourceId")),
                default_physical_resource_id(),
            ]),
        ),
    ];
    fields.extend(request_identity_fields());
    fields.push(FieldRule::optional(
        "Data",
        Expr::of_kind(response_field("Data"), JsonKind::Object),
    ));
    fields.push(FieldRule::optional(
        "NoEcho",
        Expr::of_kind(response_field("NoEcho"), JsonKind::Boolean),
    ));
    RuleSet::new(ResultVariant::Success, fields)
}

/// Rules for an invocation that raised.
///
/// The status is fixed; the reason names the fault.
pub fn compile_failure_rules() -> RuleSet {
    let mut fields = vec![
        FieldRule::required("Status", Expr::literal(ResponseStatus::Failed.as_str())),
        FieldRule::required(
            "Reason",
            Expr::concat(vec![
                Expr::coalesce(vec![
                    Expr::of_kind(response_field("errorType"), JsonKind::NonEmptyString),
                    Expr::text(INVOCATION_CONDITION),
                ]),
                Expr::literal(": "),
                Expr::text(response_field("errorMessage")),
            ]),
        ),
        FieldRule::required("PhysicalResourceId", default_physical_resource_id()),
    ];
    fields.extend(request_identity_fields());
    RuleSet::new(ResultVariant::Failure, fields)
}

/// RequestId on Create, the orchestrator's current id otherwise.
fn default_physical_resource_id() -> Expr {
    Expr::when(
        Condition::equals(request_field("RequestType"), RequestType::Create.as_str()),
        Expr::text(request_field("RequestId")),
        Expr::text(request_field("PhysicalResourceId")),
    )
}

fn request_identity_fields() -> Vec<FieldRule> {
    ["StackId", "RequestId", "LogicalResourceId"]
        .into_iter()
        .map(|name| FieldRule::required(name, Expr::path(request_field(name))))
        .collect()
}
