//! # Limits and Constraints
//!
//! ## Quick Summary
//!
//! | Limit | Value |
//! |-------|-------|
//! | Maximum response body accepted at the ResponseURL | 4096 bytes |
//! | Pre-signed ResponseURL validity | 2 hours |
//! | Event bus retry window (`MaximumEventAgeInSeconds`) | 60 s to 24 h, default 1 h |
//! | Event bus delivery attempts (`MaximumRetryAttempts`) | 0 to 185, default 185 |
//! | Handler payload delivered through the destination | 256 KB |
//! | Gateway integration timeout | 29 seconds |
//!
//! Bodies over the response limit are still sent, with a warning from
//! [`crate::destination::WriteRequest::new`]. The orchestrator rejects them,
//! and the stack operation waits until its own timeout. Keep `Data` small.
//!
//! A retry window longer than the ResponseURL's validity only produces
//! writes that the storage service refuses.

// This module is documentation-only.
