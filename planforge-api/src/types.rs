//! Request and response bodies.

use chrono::{DateTime, Utc};
use planforge_core::{FloorPlan, FloorPlanId};
use serde::{Deserialize, Serialize};

/// Body of `POST /generate-floor-plan`.
///
/// Only used for documentation; the handler validates the raw JSON value so
/// that type errors surface as validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GenerateFloorPlanRequest {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

/// A stored floor plan as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FloorPlanResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = Uuid))]
    pub id: FloorPlanId,
    pub image_url: String,
    pub requirements: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FloorPlan> for FloorPlanResponse {
    fn from(plan: FloorPlan) -> Self {
        Self {
            id: plan.floor_plan_id,
            image_url: plan.image_url,
            requirements: plan.requirements,
            created_at: plan.created_at,
        }
    }
}

/// Success body of `POST /generate-floor-plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GenerateFloorPlanResponse {
    pub success: bool,
    pub floor_plan: FloorPlanResponse,
}

impl GenerateFloorPlanResponse {
    pub fn committed(plan: FloorPlan) -> Self {
        Self {
            success: true,
            floor_plan: plan.into(),
        }
    }
}

/// Body of `GET /projects/{projectId}/floor-plans`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FloorPlanListResponse {
    pub floor_plans: Vec<FloorPlanResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use planforge_core::{EntityIdType, ImageReference, ProjectId, UserId};

    #[test]
    fn test_success_body_shape() -> Result<(), serde_json::Error> {
        let image = ImageReference::parse("https://img/abc.png").expect("valid url");
        let plan = FloorPlan::completed(
            ProjectId::now_v7(),
            UserId::new("u1"),
            image,
            None,
        );
        let id = plan.floor_plan_id;
        let body = serde_json::to_value(GenerateFloorPlanResponse::committed(plan))?;

        assert_eq!(body["success"], true);
        assert_eq!(body["floorPlan"]["id"], id.to_string());
        assert_eq!(body["floorPlan"]["imageUrl"], "https://img/abc.png");
        assert!(body["floorPlan"]["requirements"].is_null());
        let created = body["floorPlan"]["createdAt"].as_str().unwrap_or_default();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
        Ok(())
    }
}
