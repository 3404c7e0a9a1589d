//! Activity audit log.

use crate::StoreSession;
use planforge_core::{
    ActivityAction, ActivityId, ActivityRecord, EntityIdType, FloorPlan, StorageError,
};

/// Writes generation events into the caller's unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityAuditLog;

impl ActivityAuditLog {
    pub fn new() -> Self {
        Self
    }

    /// Build the record describing the creation of `plan`.
    pub fn record_for(&self, plan: &FloorPlan) -> ActivityRecord {
        ActivityRecord {
            activity_id: ActivityId::now_v7(),
            user_id: plan.user_id.clone(),
            action: ActivityAction::GenerateFloorPlan,
            floor_plan_id: plan.floor_plan_id,
            project_id: plan.project_id,
            created_at: plan.created_at,
        }
    }

    /// Append the generation record for `plan` inside `session`.
    pub async fn record_generation(
        &self,
        session: &mut dyn StoreSession,
        plan: &FloorPlan,
    ) -> Result<ActivityRecord, StorageError> {
        let record = self.record_for(plan);
        session.insert_activity(&record).await?;
        Ok(record)
    }
}
