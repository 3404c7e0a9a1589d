//! Floor plan routes.
//!
//! - `POST /generate-floor-plan` generates, persists and links a floor plan.
//! - `GET /projects/:project_id/floor-plans` lists a project's linked floor plans.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use planforge_core::ProjectId;
use planforge_storage::ProjectRepository;
use serde_json::Value;

use crate::auth::IdentityProvider;
use crate::error::{ApiError, ApiResult};
use crate::services::GenerationService;
use crate::state::AppState;
use crate::telemetry::metrics::with_metrics;
use crate::types::{FloorPlanListResponse, FloorPlanResponse, GenerateFloorPlanResponse};

/// POST /generate-floor-plan
///
/// The body is taken raw so that unparseable JSON is reported as a
/// validation failure rather than axum's default rejection.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/generate-floor-plan",
    tag = "Floor Plans",
    request_body = crate::types::GenerateFloorPlanRequest,
    responses(
        (status = 200, description = "Floor plan generated and linked", body = GenerateFloorPlanResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 401, description = "No authenticated caller", body = crate::error::ErrorBody),
        (status = 404, description = "Project not found", body = crate::error::ErrorBody),
        (status = 500, description = "Generation or persistence failed", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
))]
pub async fn generate_floor_plan(
    State(generation): State<Arc<GenerationService>>,
    State(identity): State<Arc<dyn IdentityProvider>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<GenerateFloorPlanResponse>> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Rejected unparseable request body");
        with_metrics(|metrics| metrics.record_generation_outcome("validation"));
        ApiError::from(e)
    })?;

    let caller = identity.identify(&headers).await;
    let plan = generation.generate(&payload, caller).await?;

    Ok(Json(GenerateFloorPlanResponse::committed(plan)))
}

/// GET /projects/:project_id/floor-plans
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/projects/{projectId}/floor-plans",
    tag = "Floor Plans",
    params(("projectId" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Linked floor plans in link order", body = FloorPlanListResponse),
        (status = 400, description = "Malformed project id", body = crate::error::ErrorBody),
        (status = 401, description = "No authenticated caller", body = crate::error::ErrorBody),
        (status = 404, description = "Project not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_floor_plans(
    State(repository): State<ProjectRepository>,
    State(identity): State<Arc<dyn IdentityProvider>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> ApiResult<Json<FloorPlanListResponse>> {
    if identity.identify(&headers).await.is_none() {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let project_id: ProjectId = project_id
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid_format("projectId", "a valid identifier"))?;

    let plans = repository.linked_floor_plans(project_id).await?;

    Ok(Json(FloorPlanListResponse {
        floor_plans: plans.into_iter().map(FloorPlanResponse::from).collect(),
    }))
}

/// Floor plan routes over the shared state.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/generate-floor-plan", post(generate_floor_plan))
        .route("/projects/:project_id/floor-plans", get(list_floor_plans))
}
