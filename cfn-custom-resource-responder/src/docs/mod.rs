//! # Documentation Modules
//!
//! This module contains background documentation for deployers and for
//! authors of custom resource handlers wired to the responder.
//!
//! ## Available Documentation
//!
//! - [`protocol`]: What a handler returns and what the orchestrator receives
//! - [`limits`]: Limits and constraints imposed by the services involved
//!
//! These modules are documentation-only and do not contain executable code.

pub mod limits;
pub mod protocol;
