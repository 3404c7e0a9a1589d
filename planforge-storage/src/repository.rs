//! Project lookups.

use crate::DocumentStore;
use planforge_core::{EntityKind, FloorPlan, Project, ProjectId, StorageError};
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to projects and their floor plans.
#[derive(Clone)]
pub struct ProjectRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load a project, failing with `NotFound` when it does not exist.
    pub async fn find_by_id(&self, project_id: ProjectId) -> Result<Project, StorageError> {
        self.store
            .find_project(project_id)
            .await?
            .map(Project::from)
            .ok_or_else(|| not_found(project_id))
    }

    /// Floor plans linked from the project, in link order.
    ///
    /// Stored floor plans that the project does not link are left out.
    pub async fn linked_floor_plans(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<FloorPlan>, StorageError> {
        let project = self.find_by_id(project_id).await?;
        let mut by_id: HashMap<_, _> = self
            .store
            .list_floor_plans(project_id)
            .await?
            .into_iter()
            .map(|plan| (plan.floor_plan_id, plan))
            .collect();

        Ok(project
            .linked_artifact_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }
}

fn not_found(project_id: ProjectId) -> StorageError {
    StorageError::NotFound {
        entity: EntityKind::Project,
        id: project_id.to_string(),
    }
}
