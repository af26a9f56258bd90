//! Configuration for template assembly.
//!
//! [`ResponderConfig::default`] is what the `cfn-responder-template` binary
//! uses. Library consumers embedding the assembler can change names and the
//! defaults of the deployment parameters, within the ranges the event bus
//! accepts.
//!
//! ## Example
//!
//! ```rust
//! use cfn_custom_resource_responder::ResponderConfig;
//!
//! let mut config = ResponderConfig::default();
//! config.maximum_event_age.default = 900;
//! assert!(config.validate().is_ok());
//!
//! config.maximum_retry_attempts.default = 500;
//! assert!(config.validate().is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ResponderError, ResponderResult};

/// Source repository named in the template description.
pub const DEFAULT_DESCRIPTION: &str = "https://github.com/schlarpc/cfn-custom-resource-responder";

/// Gateway stage the rule target invokes.
pub const DEFAULT_STAGE_NAME: &str = "api";

/// Length of the content hash appended to gateway logical ids.
pub const DEFAULT_HASH_LENGTH: usize = 12;

/// Longest content hash that can be taken from a BLAKE2b-512 digest in hex.
pub const MAX_HASH_LENGTH: usize = 128;

/// Bounds and default of one numeric template parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Value used when the deployer does not override it
    pub default: u32,
    /// Smallest accepted value
    pub min: u32,
    /// Largest accepted value
    pub max: u32,
}

impl ParameterSpec {
    /// Creates a parameter spec.
    pub const fn new(default: u32, min: u32, max: u32) -> Self {
        Self { default, min, max }
    }

    /// Returns true if `value` is within bounds.
    pub fn accepts(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn validate(&self, name: &str) -> ResponderResult<()> {
        if self.min > self.max {
            return Err(ResponderError::validation(format!(
                "{}: minimum {} is greater than maximum {}",
                name, self.min, self.max
            )));
        }
        if !self.accepts(self.default) {
            return Err(ResponderError::validation(format!(
                "{}: default {} is outside {}..={}",
                name, self.default, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// How long the event bus keeps retrying delivery, in seconds.
pub const MAXIMUM_EVENT_AGE: ParameterSpec = ParameterSpec::new(3600, 60, 86400);

/// How many delivery attempts the event bus makes.
pub const MAXIMUM_RETRY_ATTEMPTS: ParameterSpec = ParameterSpec::new(185, 0, 185);

/// Settings for [`crate::template::assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Template `Description`
    pub description: String,
    /// Gateway stage name
    pub stage_name: String,
    /// Suffix of the gateway title, after the stack name
    pub api_name_suffix: String,
    /// Suffix of the event bus name, after the stack name
    pub event_bus_name_suffix: String,
    /// Name of the exported destination output, after the stack name
    pub export_name_suffix: String,
    /// Name of the exported publisher policy output, after the stack name
    pub policy_export_name_suffix: String,
    /// Characters of content hash in gateway logical ids
    pub hash_length: usize,
    /// `MaximumEventAgeInSeconds` parameter
    pub maximum_event_age: ParameterSpec,
    /// `MaximumRetryAttempts` parameter
    pub maximum_retry_attempts: ParameterSpec,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            stage_name: DEFAULT_STAGE_NAME.to_string(),
            api_name_suffix: "CustomResourceResponderAPI".to_string(),
            event_bus_name_suffix: "CustomResourceResponderEventBus".to_string(),
            export_name_suffix: "DestinationARN".to_string(),
            policy_export_name_suffix: "DestinationPolicyARN".to_string(),
            hash_length: DEFAULT_HASH_LENGTH,
            maximum_event_age: MAXIMUM_EVENT_AGE,
            maximum_retry_attempts: MAXIMUM_RETRY_ATTEMPTS,
        }
    }
}

impl ResponderConfig {
    /// Checks that the configuration can produce a deployable template.
    pub fn validate(&self) -> ResponderResult<()> {
        if self.hash_length == 0 || self.hash_length > MAX_HASH_LENGTH {
            return Err(ResponderError::validation(format!(
                "hash_length must be within 1..={}, got {}",
                MAX_HASH_LENGTH, self.hash_length
            )));
        }
        if self.stage_name.is_empty()
            || !self
                .stage_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ResponderError::validation(format!(
                "stage_name must be non-empty and contain only alphanumerics, '-' or '_', got '{}'",
                self.stage_name
            )));
        }
        for (name, suffix) in [
            ("api_name_suffix", &self.api_name_suffix),
            ("event_bus_name_suffix", &self.event_bus_name_suffix),
            ("export_name_suffix", &self.export_name_suffix),
            ("policy_export_name_suffix", &self.policy_export_name_suffix),
        ] {
            if suffix.is_empty() {
                return Err(ResponderError::validation(format!("{} must not be empty", name)));
            }
        }
        if self.export_name_suffix == self.policy_export_name_suffix {
            return Err(ResponderError::validation("export names must differ"));
        }
        self.maximum_event_age.validate("maximum_event_age")?;
        // The event bus enforces these bounds; a narrower range is fine.
        if self.maximum_event_age.min < MAXIMUM_EVENT_AGE.min || self.maximum_event_age.max > MAXIMUM_EVENT_AGE.max {
            return Err(ResponderError::validation("maximum_event_age: bounds exceed 60..=86400"));
        }
        self.maximum_retry_attempts.validate("maximum_retry_attempts")?;
        if self.maximum_retry_attempts.max > MAXIMUM_RETRY_ATTEMPTS.max {
            return Err(ResponderError::validation("maximum_retry_attempts: bounds exceed 0..=185"));
        }
        Ok(())
    }
}
