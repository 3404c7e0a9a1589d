//! Transaction coordinator tests against the in-memory store.

use planforge_core::{
    ActivityAction, FloorPlanStatus, PersistenceError, StorageError,
};
use planforge_storage::{DocumentStore, ProjectRepository, TransactionCoordinator};
use planforge_test_utils::fixtures::{
    image, project_document, project_document_with_links, store_with, test_user,
};
use planforge_test_utils::generators::arb_project_document;
use planforge_test_utils::*;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn coordinator(store: &InMemoryStore) -> TransactionCoordinator {
    TransactionCoordinator::new(Arc::new(store.clone()))
}

#[tokio::test]
async fn persist_initializes_missing_link_list() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;

    let plan = coordinator(&store)
        .persist(project_id, test_user(), image(), Some("3 bedrooms".to_string()))
        .await
        .expect("persist");

    assert_eq!(plan.project_id, project_id);
    assert_eq!(plan.status, FloorPlanStatus::Completed);
    assert_eq!(plan.image_url, "https://img/abc.png");
    assert_eq!(plan.requirements.as_deref(), Some("3 bedrooms"));

    let stored = store.project_document(project_id).await.expect("project");
    assert_eq!(stored.linked_artifact_ids, Some(json!([plan.floor_plan_id.to_string()])));

    let plans = store.floor_plans().await;
    assert_eq!(plans, vec![plan.clone()]);

    let activities = store.activities().await;
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].floor_plan_id, plan.floor_plan_id);
    assert_eq!(activities[0].project_id, project_id);
    assert_eq!(activities[0].action, ActivityAction::GenerateFloorPlan);
    assert_eq!(activities[0].user_id, test_user());
}

#[tokio::test]
async fn persist_replaces_non_array_link_value() {
    let document = project_document_with_links(json!("legacy-value"));
    let project_id = document.project_id;
    let store = store_with(document).await;

    let plan = coordinator(&store)
        .persist(project_id, test_user(), image(), None)
        .await
        .expect("persist");

    let stored = store.project_document(project_id).await.expect("project");
    assert_eq!(stored.linked_ids(), vec![plan.floor_plan_id]);
}

#[tokio::test]
async fn persist_appends_to_existing_links() {
    let existing = FloorPlanId::now_v7();
    let document = project_document_with_links(json!([existing.to_string()]));
    let project_id = document.project_id;
    let store = store_with(document).await;

    let plan = coordinator(&store)
        .persist(project_id, test_user(), image(), None)
        .await
        .expect("persist");

    let stored = store.project_document(project_id).await.expect("project");
    assert_eq!(stored.linked_ids(), vec![existing, plan.floor_plan_id]);
}

async fn assert_nothing_written(store: &InMemoryStore, project_id: ProjectId) {
    assert!(store.floor_plans().await.is_empty(), "no floor plan");
    assert!(store.activities().await.is_empty(), "no activity");
    if let Some(stored) = store.project_document(project_id).await {
        assert!(stored.linked_artifact_ids.is_none(), "project untouched");
    }
}

#[tokio::test]
async fn artifact_insert_failure_rolls_back() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    store.inject(Fault::ArtifactInsert);

    let err = coordinator(&store)
        .persist(project_id, test_user(), image(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PersistenceError::ArtifactInsert { .. }));
    assert_nothing_written(&store, project_id).await;
}

#[tokio::test]
async fn vanished_project_rolls_back() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    store.inject(Fault::ProjectVanishes);

    let err = coordinator(&store)
        .persist(project_id, test_user(), image(), None)
        .await
        .unwrap_err();

    assert_eq!(err, PersistenceError::ProjectNotFoundDuringLink { project_id });
    assert_eq!(err.to_string(), "project not found during link");
    // The deletion happened inside the aborted session, so the project is still there.
    assert!(store.project_document(project_id).await.is_some());
    assert_nothing_written(&store, project_id).await;
}

#[tokio::test]
async fn unmodified_link_rolls_back() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    store.inject(Fault::NoOpLink);

    let err = coordinator(&store)
        .persist(project_id, test_user(), image(), None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "link update had no effect");
    assert_nothing_written(&store, project_id).await;
}

#[tokio::test]
async fn audit_failure_rolls_back() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    store.inject(Fault::AuditInsert);

    let err = coordinator(&store)
        .persist(project_id, test_user(), image(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PersistenceError::AuditInsert { .. }));
    assert_nothing_written(&store, project_id).await;
}

#[tokio::test]
async fn repeated_requests_create_distinct_artifacts() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    let coordinator = coordinator(&store);

    let first = coordinator
        .persist(project_id, test_user(), image(), Some("pool".to_string()))
        .await
        .expect("first");
    let second = coordinator
        .persist(project_id, test_user(), image(), Some("pool".to_string()))
        .await
        .expect("second");

    assert_ne!(first.floor_plan_id, second.floor_plan_id);
    let stored = store.project_document(project_id).await.expect("project");
    assert_eq!(stored.linked_ids(), vec![first.floor_plan_id, second.floor_plan_id]);
    assert_eq!(store.activities().await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_persists_keep_every_link() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    let coordinator = coordinator(&store);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .persist(project_id, test_user(), image(), None)
                    .await
            })
        })
        .collect();

    let mut created = Vec::new();
    for handle in handles {
        let plan = handle.await.expect("join").expect("persist");
        created.push(plan.floor_plan_id);
    }

    let stored = store.project_document(project_id).await.expect("project");
    let linked = stored.linked_ids();
    assert_eq!(linked.len(), created.len());
    for id in &created {
        assert!(linked.contains(id), "link for {id} lost");
    }
    assert_eq!(store.floor_plans().await.len(), 16);
    assert_eq!(store.activities().await.len(), 16);
}

#[tokio::test]
async fn repository_defaults_room_counts() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    let repository = ProjectRepository::new(Arc::new(store));

    let project = repository.find_by_id(project_id).await.expect("project");
    assert_eq!((project.bedrooms, project.bathrooms), (3, 2));
}

#[tokio::test]
async fn repository_reports_missing_project() {
    let repository = ProjectRepository::new(Arc::new(InMemoryStore::new()));
    let err = repository.find_by_id(ProjectId::now_v7()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn repository_lists_linked_plans_in_link_order() {
    let document = project_document();
    let project_id = document.project_id;
    let store = store_with(document).await;
    let coordinator = coordinator(&store);

    let first = coordinator
        .persist(project_id, test_user(), image(), None)
        .await
        .expect("first");
    let second = coordinator
        .persist(project_id, test_user(), image(), None)
        .await
        .expect("second");

    let repository = ProjectRepository::new(Arc::new(store.clone()));
    let plans = repository.linked_floor_plans(project_id).await.expect("plans");
    let ids: Vec<_> = plans.iter().map(|plan| plan.floor_plan_id).collect();
    assert_eq!(ids, vec![first.floor_plan_id, second.floor_plan_id]);
}

#[tokio::test]
async fn memory_store_reports_healthy() {
    let store = InMemoryStore::new();
    assert!(store.health_check().await.is_ok());
    assert_eq!(store.backend_name(), "memory");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn persist_always_leaves_new_id_last(document in arb_project_document()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");

        runtime.block_on(async {
            let project_id = document.project_id;
            let before = document.linked_ids();
            let store = store_with(document).await;

            let plan = coordinator(&store)
                .persist(project_id, test_user(), image(), None)
                .await
                .expect("persist");

            let after = store
                .project_document(project_id)
                .await
                .expect("project")
                .linked_ids();
            let mut expected = before;
            expected.push(plan.floor_plan_id);
            assert_eq!(after, expected);
        });
    }
}
