//! In-memory document store.
//!
//! Used for local development (`PLANFORGE_STORE=memory`) and tests. A session
//! holds the store lock for its whole lifetime and writes to a private copy of
//! the state, which replaces the shared state on commit. Sessions therefore
//! run one at a time and always apply to the latest committed state.

use crate::{DocumentStore, LinkOutcome, ProjectDocument, StoreSession};
use ::async_trait::async_trait;
use planforge_core::{
    ActivityRecord, EntityKind, FloorPlan, FloorPlanId, ProjectId, StorageError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Failure modes that can be switched on for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Floor plan insert returns an error.
    ArtifactInsert,
    /// Activity insert returns an error.
    AuditInsert,
    /// Link update matches the project but reports no modification.
    NoOpLink,
    /// The project disappears right before the link update.
    ProjectVanishes,
}

#[derive(Debug, Default)]
struct Faults {
    artifact_insert: AtomicBool,
    audit_insert: AtomicBool,
    noop_link: AtomicBool,
    project_vanishes: AtomicBool,
}

impl Faults {
    fn flag(&self, fault: Fault) -> &AtomicBool {
        match fault {
            Fault::ArtifactInsert => &self.artifact_insert,
            Fault::AuditInsert => &self.audit_insert,
            Fault::NoOpLink => &self.noop_link,
            Fault::ProjectVanishes => &self.project_vanishes,
        }
    }

    fn is_set(&self, fault: Fault) -> bool {
        self.flag(fault).load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    projects: HashMap<ProjectId, ProjectDocument>,
    floor_plans: Vec<FloorPlan>,
    activities: Vec<ActivityRecord>,
}

/// In-memory [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a project document.
    pub async fn insert_project(&self, document: ProjectDocument) {
        let mut state = self.state.lock().await;
        state.projects.insert(document.project_id, document);
    }

    /// Current committed document for `project_id`.
    pub async fn project_document(&self, project_id: ProjectId) -> Option<ProjectDocument> {
        self.state.lock().await.projects.get(&project_id).cloned()
    }

    /// Every committed floor plan, in insertion order.
    pub async fn floor_plans(&self) -> Vec<FloorPlan> {
        self.state.lock().await.floor_plans.clone()
    }

    /// Every committed activity record, in insertion order.
    pub async fn activities(&self) -> Vec<ActivityRecord> {
        self.state.lock().await.activities.clone()
    }

    /// Turn a fault on.
    pub fn inject(&self, fault: Fault) {
        self.faults.flag(fault).store(true, Ordering::SeqCst);
    }

    /// Turn a fault off.
    pub fn clear(&self, fault: Fault) {
        self.faults.flag(fault).store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<ProjectDocument>, StorageError> {
        Ok(self.project_document(project_id).await)
    }

    async fn list_floor_plans(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<FloorPlan>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .floor_plans
            .iter()
            .filter(|plan| plan.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn start_session(&self) -> Result<Box<dyn StoreSession>, StorageError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemorySession {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Session over [`InMemoryStore`]. Dropping it discards `working`.
struct MemorySession {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn insert_floor_plan(&mut self, plan: &FloorPlan) -> Result<(), StorageError> {
        if self.faults.is_set(Fault::ArtifactInsert) {
            return Err(StorageError::InsertFailed {
                entity: EntityKind::FloorPlan,
                reason: "injected failure".to_string(),
            });
        }
        if self
            .working
            .floor_plans
            .iter()
            .any(|existing| existing.floor_plan_id == plan.floor_plan_id)
        {
            return Err(StorageError::InsertFailed {
                entity: EntityKind::FloorPlan,
                reason: "already exists".to_string(),
            });
        }
        self.working.floor_plans.push(plan.clone());
        Ok(())
    }

    async fn push_linked_artifact(
        &mut self,
        project_id: ProjectId,
        floor_plan_id: FloorPlanId,
    ) -> Result<LinkOutcome, StorageError> {
        if self.faults.is_set(Fault::ProjectVanishes) {
            self.working.projects.remove(&project_id);
        }

        let Some(document) = self.working.projects.get_mut(&project_id) else {
            return Ok(LinkOutcome::new(0, 0));
        };

        if self.faults.is_set(Fault::NoOpLink) {
            return Ok(LinkOutcome::new(1, 0));
        }

        let modified = document.push_linked_artifact(floor_plan_id);
        Ok(LinkOutcome::new(1, u64::from(modified)))
    }

    async fn insert_activity(&mut self, record: &ActivityRecord) -> Result<(), StorageError> {
        if self.faults.is_set(Fault::AuditInsert) {
            return Err(StorageError::InsertFailed {
                entity: EntityKind::Activity,
                reason: "injected failure".to_string(),
            });
        }
        self.working.activities.push(record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemorySession {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}
