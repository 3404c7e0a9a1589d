//! Identity types for Planforge entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour shared by the strongly-typed UUID identifiers.
pub trait EntityIdType: Copy + fmt::Display + FromStr {
    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;

    /// Generate a fresh timestamp-sortable (UUIDv7) identifier.
    fn now_v7() -> Self;

    /// Return the underlying UUID.
    fn as_uuid(&self) -> Uuid;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a project (the aggregate root).
    ProjectId
);

define_entity_id!(
    /// Identifier of a generated floor plan.
    FloorPlanId
);

define_entity_id!(
    /// Identifier of an activity (audit) record.
    ActivityId
);

/// Opaque caller identity as issued by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_roundtrips_through_string() {
        let id = ProjectId::now_v7();
        let parsed: ProjectId = id.to_string().parse().expect("valid uuid");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_malformed_id_is_rejected() {
        assert!("P1".parse::<ProjectId>().is_err());
        assert!("".parse::<FloorPlanId>().is_err());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let uuid = Uuid::nil();
        let json = serde_json::to_string(&FloorPlanId::new(uuid)).expect("serialize");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn test_v7_ids_sort_by_creation() {
        let first = ActivityId::now_v7();
        let second = ActivityId::now_v7();
        assert!(first <= second);
    }
}
