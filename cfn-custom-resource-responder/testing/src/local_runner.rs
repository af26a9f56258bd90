//! Local test runner playing the gateway's part.
//!
//! `LocalGatewayRunner` takes destination events, applies the compiled
//! mapping rules the way the deployed mapping template does (missing values
//! become `""`), and resolves the write to the event's ResponseURL. Nothing
//! leaves the process; deliveries are recorded for inspection.
//!
//! # Examples
//!
//! ```
//! use cfn_custom_resource_responder::{FunctionError, LifecycleRequest};
//! use cfn_custom_resource_responder_testing::{EventBuilder, LocalGatewayRunner};
//! use serde_json::{json, Value};
//!
//! fn handler(request: &LifecycleRequest) -> Result<Value, FunctionError> {
//!     if request.is_create() {
//!         Ok(json!({"PhysicalResourceId": "bucket-1"}))
//!     } else {
//!         Err(FunctionError::new("NotImplementedError", "only Create is supported"))
//!     }
//! }
//!
//! let mut runner = LocalGatewayRunner::with_handler(handler);
//! let result = runner.run(EventBuilder::create()).unwrap();
//! assert!(result.is_success());
//! assert_eq!(result.get_physical_resource_id().unwrap(), "bucket-1");
//!
//! let result = runner.run(EventBuilder::delete("bucket-1")).unwrap();
//! assert!(result.is_failure());
//! assert_eq!(result.get_physical_resource_id().unwrap(), "bucket-1");
//! ```

use serde_json::Value;

use cfn_custom_resource_responder::compiler::request_field;
use cfn_custom_resource_responder::destination::resolve_body_write;
use cfn_custom_resource_responder::{compile, EvalMode, FunctionError, LifecycleRequest, MappingRules};

use crate::error::TestError;
use crate::fixtures::{EventBuilder, Outcome};
use crate::test_result::TestResult;

type Handler = Box<dyn Fn(&LifecycleRequest) -> Result<Value, FunctionError> + Send + Sync>;

/// In-process stand-in for the deployed gateway.
pub struct LocalGatewayRunner {
    rules: MappingRules,
    mode: EvalMode,
    handler: Option<Handler>,
    deliveries: Vec<TestResult>,
}

impl Default for LocalGatewayRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalGatewayRunner {
    /// Creates a runner with the compiled rules and gateway semantics.
    pub fn new() -> Self {
        Self {
            rules: compile(),
            mode: EvalMode::DefaultOnMissing,
            handler: None,
            deliveries: Vec::new(),
        }
    }

    /// Creates a runner that invokes `handler` for [`LocalGatewayRunner::run`].
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&LifecycleRequest) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        let mut runner = Self::new();
        runner.handler = Some(Box::new(handler));
        runner
    }

    /// Switches evaluation mode. [`EvalMode::Strict`] surfaces missing
    /// fields as errors instead of writing `""`.
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// The rules in use.
    pub fn rules(&self) -> &MappingRules {
        &self.rules
    }

    /// Delivers one raw destination event.
    pub fn deliver(&mut self, event: &Value) -> Result<TestResult, TestError> {
        let rule_set = self.rules.select(event);
        let body = rule_set.apply(event, self.mode)?;

        let response_url = request_field("ResponseURL")
            .lookup(event)
            .and_then(Value::as_str)
            .ok_or_else(|| TestError::invalid_event("event carries no ResponseURL"))?;
        let write = resolve_body_write(&body, response_url)?;

        tracing::debug!(variant = %rule_set.variant, url = %write.url, "Delivered response");
        let result = TestResult::new(rule_set.variant, body, write);
        self.deliveries.push(result.clone());
        Ok(result)
    }

    /// Invokes the registered handler for the builder's request, then
    /// delivers the resulting destination event.
    ///
    /// Without a handler the builder's own outcome is delivered.
    pub fn run(&mut self, builder: EventBuilder) -> Result<TestResult, TestError> {
        let builder = match &self.handler {
            Some(handler) => {
                let request = builder.lifecycle_request()?;
                let outcome = match handler(&request) {
                    Ok(value) => Outcome::Returned(value),
                    Err(error) => Outcome::Raised(error),
                };
                builder.with_outcome(outcome)
            }
            None => builder,
        };
        self.deliver(&builder.build())
    }

    /// Every delivery so far, oldest first.
    pub fn deliveries(&self) -> &[TestResult] {
        &self.deliveries
    }

    /// The most recent delivery.
    pub fn last_delivery(&self) -> Result<&TestResult, TestError> {
        self.deliveries.last().ok_or(TestError::NoDelivery)
    }

    /// Forgets recorded deliveries.
    pub fn reset(&mut self) {
        self.deliveries.clear();
    }
}

impl std::fmt::Debug for LocalGatewayRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalGatewayRunner")
            .field("mode", &self.mode)
            .field("has_handler", &self.handler.is_some())
            .field("deliveries", &self.deliveries.len())
            .finish()
    }
}
