//! # The Response Protocol
//!
//! A handler wired to the responder never calls the ResponseURL itself. It
//! returns (or raises) and the responder writes the response.
//!
//! ## Returning
//!
//! The return value is read as a partial response. Every key is optional:
//!
//! ```json
//! {"PhysicalResourceId": "bucket-1234", "Data": {"Arn": "arn:aws:s3:::bucket-1234"}}
//! ```
//!
//! | Key | Accepted values | When absent or not accepted |
//! |-----|-----------------|-----------------------------|
//! | `Status` | `"SUCCESS"`, `"FAILED"` | `SUCCESS` |
//! | `Reason` | any scalar, rendered as text | `""` |
//! | `PhysicalResourceId` | any scalar, rendered as text | `RequestId` on Create, the current id otherwise |
//! | `Data` | an object | omitted |
//! | `NoEcho` | a boolean | omitted |
//!
//! `StackId`, `RequestId` and `LogicalResourceId` always come from the
//! request; handler values for them are ignored. So is any other key, and a
//! return value that is not an object counts as `{}`.
//!
//! Returning `"Status": "FAILED"` reports a failure without raising.
//!
//! ## Raising
//!
//! An unhandled error always produces `FAILED` with the reason
//! `"{errorType}: {errorMessage}"`. When the destination reports a failure
//! with no error type, such as an invocation that exhausted its retries, the
//! destination's condition (for example `RetriesExhausted`) takes its place.
//!
//! ## Wiring
//!
//! Configure the function's asynchronous invocation with the exported
//! `DestinationARN` as both the success and the failure destination, and
//! attach the exported `DestinationPolicyARN` to its execution role.
//!
//! ## Physical ids on Update and Delete
//!
//! Returning a different `PhysicalResourceId` on Update tells the
//! orchestrator the resource was replaced, and it will later send a Delete
//! for the old id. Omitting the key keeps the current id.

// This module is documentation-only.
