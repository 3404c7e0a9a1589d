//! End-to-end smoke test against PostgreSQL. Requires a database reachable
//! through the `PLANFORGE_DB_*` environment variables.

#![cfg(feature = "db-tests")]

mod support;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use planforge_api::{
    create_api_router, generate_jwt_token, ApiConfig, ApiResult, AppState, JwtIdentityProvider,
};
use planforge_core::FloorPlanId;
use planforge_storage::{DbConfig, DocumentStore, PgStore};
use planforge_test_utils::fixtures::{self, IMAGE_URL};
use planforge_test_utils::FakeImageProvider;
use serde_json::{json, Value};
use tower::ServiceExt;

#[tokio::test]
async fn smoke_test_generate_against_postgres() -> ApiResult<()> {
    let store = PgStore::from_config(&DbConfig::from_env())?;
    store.migrate().await?;

    let document = fixtures::project_document();
    let project_id = document.project_id;
    store.upsert_project(&document).await?;

    let auth = support::test_auth_config();
    let token = generate_jwt_token(&auth, fixtures::test_user().as_str())?;
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(FakeImageProvider::returning(IMAGE_URL)),
        Arc::new(JwtIdentityProvider::new(auth)),
        support::IMAGE_TIMEOUT,
    );
    let router = create_api_router(state, &ApiConfig::default(), false);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate-floor-plan")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(
            json!({ "projectId": project_id.to_string(), "requirements": "3 bedrooms" })
                .to_string(),
        ))
        .expect("request builds");

    let response = router.oneshot(request).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body: Value = serde_json::from_slice(&bytes)?;
    let floor_plan_id: FloorPlanId = body["floorPlan"]["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("floor plan id in response");

    let stored = store.find_project(project_id).await?.expect("project stored");
    assert_eq!(stored.linked_ids(), vec![floor_plan_id]);
    assert_eq!(store.count_activities(floor_plan_id).await?, 1);
    Ok(())
}
