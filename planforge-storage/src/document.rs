//! Stored project document.
//!
//! The store keeps projects in the shape they were written by the wider
//! system, which predates this service. Fields this service relies on may be
//! missing or, for `linked_artifact_ids`, not even an array. `ProjectDocument`
//! models that shape honestly; `Project` is the cleaned-up domain view.

use planforge_core::{
    FloorPlanId, Location, Project, ProjectId, DEFAULT_BATHROOMS, DEFAULT_BEDROOMS,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw project as held by a [`crate::DocumentStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub project_id: ProjectId,
    pub building_type: String,
    pub land_area: f64,
    pub land_area_unit: String,
    pub budget: f64,
    pub currency: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    /// `None` when never initialized. Any JSON value may be stored here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_artifact_ids: Option<Value>,
}

impl ProjectDocument {
    /// Append `floor_plan_id` to the back-reference list.
    ///
    /// An absent or non-array value is replaced by a fresh single-element
    /// array. Returns `true` when the document changed, which is always the
    /// case for an append.
    pub fn push_linked_artifact(&mut self, floor_plan_id: FloorPlanId) -> bool {
        let entry = Value::String(floor_plan_id.to_string());
        match self.linked_artifact_ids.as_mut() {
            Some(Value::Array(ids)) => ids.push(entry),
            _ => self.linked_artifact_ids = Some(Value::Array(vec![entry])),
        }
        true
    }

    /// Whether `floor_plan_id` appears in the back-reference list.
    pub fn links(&self, floor_plan_id: FloorPlanId) -> bool {
        self.linked_ids().contains(&floor_plan_id)
    }

    /// Parsed back-references, in stored order.
    ///
    /// Entries that are not identifier strings are skipped.
    pub fn linked_ids(&self) -> Vec<FloorPlanId> {
        let Some(Value::Array(entries)) = &self.linked_artifact_ids else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| {
                let parsed = entry.as_str().and_then(|raw| raw.parse::<FloorPlanId>().ok());
                if parsed.is_none() {
                    tracing::warn!(
                        project_id = %self.project_id,
                        entry = %entry,
                        "Skipping malformed linked artifact id"
                    );
                }
                parsed
            })
            .collect()
    }

    /// Convert into the domain view, applying count defaults.
    pub fn into_project(self) -> Project {
        let linked_artifact_ids = self.linked_ids();
        Project {
            project_id: self.project_id,
            building_type: self.building_type,
            land_area: self.land_area,
            land_area_unit: self.land_area_unit,
            budget: self.budget,
            currency: self.currency,
            location: self.location,
            bedrooms: self.bedrooms.unwrap_or(DEFAULT_BEDROOMS),
            bathrooms: self.bathrooms.unwrap_or(DEFAULT_BATHROOMS),
            linked_artifact_ids,
        }
    }
}

impl From<ProjectDocument> for Project {
    fn from(document: ProjectDocument) -> Self {
        document.into_project()
    }
}
