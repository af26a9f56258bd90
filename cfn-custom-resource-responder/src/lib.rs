//! # CloudFormation Custom Resource Responder
//!
//! Generates an infrastructure template that answers custom resource
//! lifecycle callbacks on behalf of a Lambda handler, so the handler never
//! has to call its ResponseURL.
//!
//! ## Overview
//!
//! The handler's asynchronous invocation is configured with an event bus as
//! both its success and failure destination. A bus rule forwards every
//! invocation result to a gateway endpoint whose only behaviour is a mapping
//! template: it fills in every field the handler omitted and writes the
//! response to the pre-signed ResponseURL. No code runs to build a response,
//! so a crashing or misbehaving handler still gets an answer to the
//! orchestrator.
//!
//! ### Key Features
//!
//! - **Zero handler changes**: return a partial response (or nothing) and
//!   let the responder complete it. See [`docs::protocol`].
//! - **Faults become FAILED**: unhandled errors report their type and message
//!   as the reason.
//! - **Fail-closed mapping**: missing context fields become empty strings
//!   instead of aborting the write.
//! - **Configurable delivery**: retry window, retry count and a dead-letter
//!   queue are template parameters.
//!
//! ## Important Documentation
//!
//! - [`docs::protocol`]: What a handler returns and what the orchestrator receives
//! - [`docs::limits`]: Limits you need to know
//!
//! ## Generating the Template
//!
//! The `cfn-responder-template` binary prints the document to stdout:
//!
//! ```text
//! cfn-responder-template > responder.json
//! ```
//!
//! Or from code:
//!
//! ```rust
//! use cfn_custom_resource_responder::{assemble, ResponderConfig};
//!
//! let template = assemble(&ResponderConfig::default()).unwrap();
//! assert!(template.output("DestinationARN").is_some());
//! let json = template.to_json().unwrap();
//! assert!(json.contains("AWS::Events::EventBus"));
//! ```
//!
//! ## How a Response is Built
//!
//! [`resolver::resolve`] states the field rules as a typed function:
//!
//! ```rust
//! use cfn_custom_resource_responder::{resolve, InvocationResult, LifecycleRequest, RequestType};
//! use serde_json::json;
//!
//! let request = LifecycleRequest::new(
//!     RequestType::Create,
//!     "arn:aws:cloudformation:us-east-1:123456789012:stack/demo/guid",
//!     "req-1",
//!     "Bucket",
//!     "https://example.com/response",
//! );
//! let result = InvocationResult::Success { response: json!({"Data": {"Name": "b"}}) };
//!
//! let payload = resolve(&result, &request);
//! assert!(payload.is_success());
//! assert_eq!(payload.physical_resource_id.as_str(), "req-1");
//! ```
//!
//! [`compiler`] expresses the same rules as [`rules::RuleSet`]s, which are
//! evaluated in-process by [`rules::MappingRules::apply`] and rendered into
//! the gateway template by [`compiler::vtl`]. The two are kept equivalent by
//! the crate's tests.
//!
//! ## Error Handling
//!
//! Errors never reach the orchestrator. [`ResponderError`] covers malformed
//! destination events, unparseable ResponseURLs, strict-mode rule evaluation
//! and invalid configuration.
//!
//! ## Logging
//!
//! The crate logs through `tracing`. The binary installs a subscriber that
//! writes to stderr, filtered by `RUST_LOG` (default `warn`).
//!
//! ## Module Organization
//!
//! - [`compiler`]: Mapping rule sets and the gateway template renderer
//! - [`config`]: Template assembly configuration
//! - [`destination`]: ResponseURL parsing and the outbound write
//! - [`docs`]: **Documentation modules**
//!   - [`docs::protocol`]: The handler-facing contract
//!   - [`docs::limits`]: Limits and constraints
//! - [`error`]: Error types
//! - [`event`]: Lifecycle requests, destination events, response payloads
//! - [`resolver`]: Default-value resolution
//! - [`rules`]: The mapping rule language and its evaluator
//! - [`template`]: Template assembly
//! - [`types`]: Identifier newtypes

pub mod compiler;
pub mod config;
pub mod destination;
pub mod docs;
pub mod error;
pub mod event;
pub mod resolver;
pub mod rules;
pub mod template;
pub mod types;

// Re-export main types at crate root
pub use compiler::compile;
pub use config::{ParameterSpec, ResponderConfig};
pub use destination::{resolve_write, ResponseTarget, WriteRequest, RESPONSE_BODY_LIMIT};
pub use error::{FunctionError, ResponderError, ResponderResult};
pub use event::{
    DestinationEnvelope, InvocationResult, InvocationResultEvent, LifecycleRequest, RequestType,
    ResponsePayload, ResponseStatus,
};
pub use resolver::{resolve, resolve_event};
pub use rules::{EvalMode, MappingRules, RuleSet};
pub use template::{assemble, Template};
pub use types::{LogicalResourceId, PhysicalResourceId, RequestId, StackId};
