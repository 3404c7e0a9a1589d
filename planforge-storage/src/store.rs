//! Store abstraction.
//!
//! A [`DocumentStore`] serves point reads and hands out [`StoreSession`]s.
//! A session is a unit of work: its writes become visible together on
//! [`StoreSession::commit`] or not at all. Dropping a session without
//! committing rolls it back.

use crate::ProjectDocument;
use ::async_trait::async_trait;
use planforge_core::{ActivityRecord, FloorPlan, FloorPlanId, ProjectId, StorageError};

/// Result of a conditional link update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkOutcome {
    /// Number of projects the update selected.
    pub matched: u64,
    /// Number of projects whose document actually changed.
    pub modified: u64,
}

impl LinkOutcome {
    pub fn new(matched: u64, modified: u64) -> Self {
        Self { matched, modified }
    }
}

/// Durable aggregate store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up a project by id.
    async fn find_project(&self, project_id: ProjectId)
        -> Result<Option<ProjectDocument>, StorageError>;

    /// All floor plans whose owning project is `project_id`, oldest first.
    async fn list_floor_plans(&self, project_id: ProjectId) -> Result<Vec<FloorPlan>, StorageError>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<(), StorageError>;

    /// Begin a unit of work.
    async fn start_session(&self) -> Result<Box<dyn StoreSession>, StorageError>;

    /// Backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// An open unit of work.
#[async_trait]
pub trait StoreSession: Send {
    async fn insert_floor_plan(&mut self, plan: &FloorPlan) -> Result<(), StorageError>;

    /// Append `floor_plan_id` to the project's back-references, initializing
    /// the list when absent or not an array.
    async fn push_linked_artifact(
        &mut self,
        project_id: ProjectId,
        floor_plan_id: FloorPlanId,
    ) -> Result<LinkOutcome, StorageError>;

    async fn insert_activity(&mut self, record: &ActivityRecord) -> Result<(), StorageError>;

    /// Make every write of this session visible.
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discard every write of this session.
    async fn abort(self: Box<Self>) -> Result<(), StorageError>;
}
