//! Atomic persist-link-audit sequence.
//!
//! A floor plan is inserted, appended to its project's back-references and
//! recorded in the activity log inside one session. Either all three writes
//! commit or none do.

use crate::{ActivityAuditLog, DocumentStore, LinkOutcome, StoreSession};
use planforge_core::{
    FloorPlan, ImageReference, PersistenceError, ProjectId, StorageError, UserId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the persistence unit of work for a generated floor plan.
#[derive(Clone)]
pub struct TransactionCoordinator {
    store: Arc<dyn DocumentStore>,
    audit: ActivityAuditLog,
}

impl TransactionCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            audit: ActivityAuditLog::new(),
        }
    }

    /// Persist a new completed floor plan for `project_id` and link it.
    ///
    /// Any failure aborts the session; a returned error means nothing was
    /// written.
    pub async fn persist(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        image: ImageReference,
        requirements: Option<String>,
    ) -> Result<FloorPlan, PersistenceError> {
        let plan = FloorPlan::completed(project_id, user_id, image, requirements);

        let mut session =
            self.store
                .start_session()
                .await
                .map_err(|e| PersistenceError::Session {
                    reason: e.to_string(),
                })?;

        if let Err(err) = self.write_all(session.as_mut(), &plan).await {
            warn!(
                project_id = %project_id,
                floor_plan_id = %plan.floor_plan_id,
                error = %err,
                "Persisting floor plan failed; rolling back"
            );
            if let Err(abort_err) = session.abort().await {
                warn!(error = %abort_err, "Rollback reported an error");
            }
            return Err(err);
        }

        session.commit().await.map_err(|e| PersistenceError::Commit {
            reason: e.to_string(),
        })?;

        info!(
            project_id = %project_id,
            floor_plan_id = %plan.floor_plan_id,
            "Floor plan persisted and linked"
        );
        Ok(plan)
    }

    async fn write_all(
        &self,
        session: &mut dyn StoreSession,
        plan: &FloorPlan,
    ) -> Result<(), PersistenceError> {
        session
            .insert_floor_plan(plan)
            .await
            .map_err(|e| PersistenceError::ArtifactInsert {
                reason: e.to_string(),
            })?;

        let outcome = session
            .push_linked_artifact(plan.project_id, plan.floor_plan_id)
            .await
            .map_err(link_error)?;
        debug!(
            project_id = %plan.project_id,
            matched = outcome.matched,
            modified = outcome.modified,
            "Link update applied"
        );
        verify_link(plan.project_id, outcome)?;

        self.audit
            .record_generation(session, plan)
            .await
            .map_err(|e| PersistenceError::AuditInsert {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

/// Exactly one project must match and change.
pub fn verify_link(project_id: ProjectId, outcome: LinkOutcome) -> Result<(), PersistenceError> {
    match (outcome.matched, outcome.modified) {
        (0, _) => Err(PersistenceError::ProjectNotFoundDuringLink { project_id }),
        (1, 1) => Ok(()),
        (1, _) => Err(PersistenceError::LinkUpdateNoEffect { project_id }),
        (matched, _) => Err(PersistenceError::AmbiguousLink {
            project_id,
            matched,
        }),
    }
}

fn link_error(err: StorageError) -> PersistenceError {
    PersistenceError::LinkUpdate {
        reason: err.to_string(),
    }
}
