//! OpenAPI document for the HTTP surface.

use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorBody;
use crate::routes::health::{ComponentHealth, HealthResponse, HealthStatus, ReadinessDetails};
use crate::types::{
    FloorPlanListResponse, FloorPlanResponse, GenerateFloorPlanRequest, GenerateFloorPlanResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Planforge API",
        description = "Floor plan generation and project linkage"
    ),
    paths(
        crate::routes::floor_plan::generate_floor_plan,
        crate::routes::floor_plan::list_floor_plans,
        crate::routes::health::ping,
        crate::routes::health::liveness,
        crate::routes::health::readiness,
        crate::telemetry::metrics::metrics_handler,
    ),
    components(schemas(
        GenerateFloorPlanRequest,
        GenerateFloorPlanResponse,
        FloorPlanResponse,
        FloorPlanListResponse,
        ErrorBody,
        HealthResponse,
        HealthStatus,
        ReadinessDetails,
        ComponentHealth,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Floor Plans", description = "Generate and list floor plans"),
        (name = "Health", description = "Liveness and readiness"),
        (name = "Observability", description = "Prometheus metrics"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// GET /openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
