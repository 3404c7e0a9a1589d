//! Core entity structures

use crate::{ActivityId, EntityIdType, FloorPlanId, ProjectId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bedroom count assumed when a stored project does not carry one.
pub const DEFAULT_BEDROOMS: u32 = 3;

/// Bathroom count assumed when a stored project does not carry one.
pub const DEFAULT_BATHROOMS: u32 = 2;

/// Where the project is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub state: String,
    pub country: String,
}

/// Project - the aggregate root owning generated floor plans.
///
/// `linked_artifact_ids` is the back-reference sequence. It is always a
/// concrete (possibly empty) list here; the stored document may lack it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub building_type: String,
    pub land_area: f64,
    pub land_area_unit: String,
    pub budget: f64,
    pub currency: String,
    pub location: Location,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub linked_artifact_ids: Vec<FloorPlanId>,
}

/// Lifecycle state of a floor plan. Generation only ever produces `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorPlanStatus {
    Completed,
}

impl FloorPlanStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, StatusParseError> {
        match s {
            "completed" => Ok(Self::Completed),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a stored status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParseError(pub String);

impl fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid status: {}", self.0)
    }
}

impl std::error::Error for StatusParseError {}

/// Reference to a generated image as returned by the provider.
///
/// Only http(s) URLs with a non-empty remainder are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    /// Accept `raw` if it looks like a usable image URL.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))?;
        if rest.is_empty() || rest.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// FloorPlan - the artifact produced by a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub floor_plan_id: FloorPlanId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub image_url: String,
    pub requirements: Option<String>,
    pub status: FloorPlanStatus,
    pub created_at: Timestamp,
}

impl FloorPlan {
    /// Build a completed floor plan with a fresh id.
    pub fn completed(
        project_id: ProjectId,
        user_id: UserId,
        image: ImageReference,
        requirements: Option<String>,
    ) -> Self {
        Self {
            floor_plan_id: FloorPlanId::now_v7(),
            project_id,
            user_id,
            image_url: image.into_string(),
            requirements,
            status: FloorPlanStatus::Completed,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Action tag recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    GenerateFloorPlan,
}

impl ActivityAction {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::GenerateFloorPlan => "generate_floor_plan",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, StatusParseError> {
        match s {
            "generate_floor_plan" => Ok(Self::GenerateFloorPlan),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: ActivityId,
    pub user_id: UserId,
    pub action: ActivityAction,
    pub floor_plan_id: FloorPlanId,
    pub project_id: ProjectId,
    pub created_at: Timestamp,
}
