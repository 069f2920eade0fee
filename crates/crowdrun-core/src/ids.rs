//! Newtype wrappers for platform identifiers to ensure type safety.
//!
//! The platform assigns every id on creation and always transmits it as a
//! string, even when it looks numeric.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new id from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string reference.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Identifier of a Project.
    ProjectId
);

string_id!(
    /// Identifier of a Training pool.
    TrainingId
);

string_id!(
    /// Identifier of a Pool.
    PoolId
);

string_id!(
    /// Identifier of a Task.
    TaskId
);

impl From<TrainingId> for PoolId {
    /// Pools and training pools share one task-submission id space.
    fn from(id: TrainingId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = PoolId::new("12345");
        assert_eq!(format!("{}", id), "12345");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ProjectId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""42""#);
        let back: ProjectId = serde_json::from_str(r#""42""#).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_training_id_converts_to_pool_id() {
        let pool_id: PoolId = TrainingId::new("7").into();
        assert_eq!(pool_id.as_str(), "7");
    }
}
