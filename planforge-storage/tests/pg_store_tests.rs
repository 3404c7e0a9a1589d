#![cfg(feature = "db-tests")]
//! PostgreSQL store tests. Require a database reachable through the
//! `PLANFORGE_DB_*` environment variables.

use planforge_core::{PersistenceError, StorageError};
use planforge_storage::{DbConfig, DocumentStore, PgStore, StoreSession, TransactionCoordinator};
use planforge_test_utils::fixtures::{
    image, project_document, project_document_with_links, test_user,
};
use planforge_test_utils::*;
use serde_json::json;
use std::sync::Arc;

async fn test_store() -> Result<PgStore, StorageError> {
    let store = PgStore::from_config(&DbConfig::from_env())?;
    store.migrate().await?;
    Ok(store)
}

#[tokio::test]
async fn pg_persist_initializes_null_links() -> Result<(), StorageError> {
    let store = test_store().await?;
    let document = project_document();
    let project_id = document.project_id;
    store.upsert_project(&document).await?;

    let coordinator = TransactionCoordinator::new(Arc::new(store.clone()));
    let plan = coordinator
        .persist(project_id, test_user(), image(), Some("3 bedrooms".to_string()))
        .await
        .expect("persist");

    let stored = store.find_project(project_id).await?.expect("project");
    assert_eq!(stored.linked_ids(), vec![plan.floor_plan_id]);
    assert_eq!(store.count_activities(plan.floor_plan_id).await?, 1);

    let plans = store.list_floor_plans(project_id).await?;
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].requirements.as_deref(), Some("3 bedrooms"));
    Ok(())
}

#[tokio::test]
async fn pg_persist_coerces_scalar_links() -> Result<(), StorageError> {
    let store = test_store().await?;
    let document = project_document_with_links(json!("legacy"));
    let project_id = document.project_id;
    store.upsert_project(&document).await?;

    let coordinator = TransactionCoordinator::new(Arc::new(store.clone()));
    let plan = coordinator
        .persist(project_id, test_user(), image(), None)
        .await
        .expect("persist");

    let stored = store.find_project(project_id).await?.expect("project");
    assert_eq!(stored.linked_artifact_ids, Some(json!([plan.floor_plan_id.to_string()])));
    Ok(())
}

#[tokio::test]
async fn pg_missing_project_rolls_back_artifact() -> Result<(), StorageError> {
    let store = test_store().await?;
    let project_id = ProjectId::now_v7();

    let coordinator = TransactionCoordinator::new(Arc::new(store.clone()));
    let err = coordinator
        .persist(project_id, test_user(), image(), None)
        .await
        .unwrap_err();

    assert_eq!(err, PersistenceError::ProjectNotFoundDuringLink { project_id });
    assert!(store.list_floor_plans(project_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn pg_dropped_session_rolls_back() -> Result<(), StorageError> {
    let store = test_store().await?;
    let document = project_document();
    let project_id = document.project_id;
    store.upsert_project(&document).await?;

    {
        let mut session = store.start_session().await?;
        let plan = planforge_core::FloorPlan::completed(project_id, test_user(), image(), None);
        session.insert_floor_plan(&plan).await?;
        session
            .push_linked_artifact(project_id, plan.floor_plan_id)
            .await?;
    }

    assert!(store.list_floor_plans(project_id).await?.is_empty());
    let stored = store.find_project(project_id).await?.expect("project");
    assert!(stored.linked_artifact_ids.is_none());
    Ok(())
}

#[tokio::test]
async fn pg_health_check() -> Result<(), StorageError> {
    let store = test_store().await?;
    store.health_check().await?;
    assert_eq!(store.backend_name(), "postgres");
    Ok(())
}
