//! Newtype wrappers for the identifiers that flow through a lifecycle callback.
//!
//! The orchestrator hands the handler four identifiers that must come back
//! verbatim (or, for the physical id, defaulted) in the response. Wrapping them
//! keeps the resolver from ever swapping a `RequestId` for a
//! `PhysicalResourceId` by accident.
//!
//! # Example
//!
//! ```rust
//! use cfn_custom_resource_responder::types::{PhysicalResourceId, RequestId};
//!
//! let request_id = RequestId::from("unique-id-for-create-request");
//! let physical_id = PhysicalResourceId::from(request_id.as_str());
//! assert_eq!(physical_id.as_str(), "unique-id-for-create-request");
//!
//! // Deref to str
//! assert!(request_id.starts_with("unique"));
//! ```

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Returns a reference to the inner string.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner string value.
            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// The ARN of the stack the custom resource belongs to.
    StackId
}

string_id! {
    /// The orchestrator's unique id for one lifecycle request.
    ///
    /// Doubles as the default physical id on `Create`.
    RequestId
}

string_id! {
    /// The template-local name of the custom resource.
    LogicalResourceId
}

string_id! {
    /// The stable identity of the provisioned resource.
    ///
    /// Returning a different value on `Update` makes the orchestrator treat
    /// the update as a replacement and issue a `Delete` for the old id.
    PhysicalResourceId
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = StackId::from("arn:aws:cloudformation:us-east-1:123456789012:stack/s/guid");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""arn:aws:cloudformation:us-east-1:123456789012:stack/s/guid""#);

        let back: StackId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display_and_deref() {
        let id = LogicalResourceId::from("MyResource".to_string());
        assert_eq!(id.to_string(), "MyResource");
        assert_eq!(id.len(), 10);
        let s: &str = id.as_ref();
        assert_eq!(s, "MyResource");
    }

    #[test]
    fn test_ids_hash_by_value() {
        let mut set = HashSet::new();
        set.insert(PhysicalResourceId::from("abc-123"));
        set.insert(PhysicalResourceId::from("abc-123"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(RequestId::default().is_empty());
        assert_eq!(PhysicalResourceId::default().into_inner(), "");
    }
}
