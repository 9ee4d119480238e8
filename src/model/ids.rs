//! Identifiers for persisted records
//!
//! Every identifier serializes as a plain string. Fresh identifiers are UUID v4;
//! identifiers arriving from callers are accepted verbatim.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random identifier (UUID-based)
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Create an identifier from an existing string
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifies a project (the scope boundary for chapters and entities)
    ProjectId
);
string_id!(
    /// Identifies the caller performing an operation
    UserId
);
string_id!(
    /// Identifies a chapter
    ChapterId
);
string_id!(
    /// Identifies a chapter version
    VersionId
);
string_id!(
    /// Identifies a codex entity
    EntityId
);
string_id!(
    /// Identifies a relationship edge
    RelationshipId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ChapterId::from_string("chapter:prologue");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"chapter:prologue\"");

        let back: ChapterId = serde_json::from_str("\"chapter:prologue\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(EntityId::new(), EntityId::new());
    }
}
