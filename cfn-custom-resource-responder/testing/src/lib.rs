//! Testing utilities for the CloudFormation custom resource responder
//!
//! This crate provides tools for testing custom resource handlers wired to
//! the responder, without deploying anything.
//!
//! # Features
//!
//! - **LocalGatewayRunner**: Play the gateway's part in-process and inspect
//!   the response it would write
//! - **EventBuilder**: Build realistic destination events for Create, Update
//!   and Delete requests
//! - **Strategies**: Proptest strategies for handler outputs and events
//!
//! # Example
//!
//! ```
//! use cfn_custom_resource_responder_testing::{EventBuilder, LocalGatewayRunner};
//! use serde_json::json;
//!
//! let mut runner = LocalGatewayRunner::new();
//! let result = runner
//!     .run(EventBuilder::create().returning(json!({"Data": {"Name": "demo"}})))
//!     .unwrap();
//!
//! assert!(result.is_success());
//! assert_eq!(result.get_data().unwrap()["Name"], "demo");
//! ```

// Module declarations
pub mod error;
pub mod fixtures;
pub mod local_runner;
pub mod strategies;
pub mod test_result;

// Re-export core types from this crate
pub use error::TestError;
pub use fixtures::{EventBuilder, Outcome};
pub use local_runner::LocalGatewayRunner;
pub use test_result::TestResult;

// Re-export key types from the responder for convenience
pub use cfn_custom_resource_responder::{
    EvalMode, FunctionError, InvocationResultEvent, LifecycleRequest, RequestType, ResponsePayload,
    ResponseStatus,
};
