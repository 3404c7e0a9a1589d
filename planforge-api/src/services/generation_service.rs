//! Generation Service
//!
//! Drives one floor plan generation request through its stages:
//!
//! ```text
//! Validating -> Authorizing -> LoadingProject -> Generating -> Persisting -> Committed
//! ```
//!
//! Any stage may fail, which ends the request. Stages are never re-entered
//! and nothing is retried. Every terminal outcome is counted in
//! `planforge_floor_plan_generations_total`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use planforge_core::{
    build_floor_plan_prompt, validate_generation_request, FloorPlan, ProjectId,
};
use planforge_llm::{generate_with_timeout, ImageGenerationProvider};
use planforge_storage::{ProjectRepository, TransactionCoordinator};
use serde_json::Value;

use crate::auth::CallerIdentity;
use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics::with_metrics;

/// Stage of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Validating,
    Authorizing,
    LoadingProject,
    Generating,
    Persisting,
    Committed,
}

impl GenerationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Validating => "validating",
            GenerationStage::Authorizing => "authorizing",
            GenerationStage::LoadingProject => "loading_project",
            GenerationStage::Generating => "generating",
            GenerationStage::Persisting => "persisting",
            GenerationStage::Committed => "committed",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates validation, lookup, image generation and persistence.
#[derive(Clone)]
pub struct GenerationService {
    repository: ProjectRepository,
    coordinator: TransactionCoordinator,
    provider: Arc<dyn ImageGenerationProvider>,
    image_timeout: Duration,
}

impl GenerationService {
    pub fn new(
        repository: ProjectRepository,
        coordinator: TransactionCoordinator,
        provider: Arc<dyn ImageGenerationProvider>,
        image_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            coordinator,
            provider,
            image_timeout,
        }
    }

    /// Run a request end to end.
    ///
    /// `caller` is the identity resolved for the request, if any. It is only
    /// consulted once the payload has validated.
    pub async fn generate(
        &self,
        payload: &Value,
        caller: Option<CallerIdentity>,
    ) -> ApiResult<FloorPlan> {
        let result = self.run(payload, caller).await;
        let outcome = match &result {
            Ok(_) => GenerationStage::Committed.as_str(),
            Err(err) => err.code.outcome_label(),
        };
        with_metrics(|metrics| metrics.record_generation_outcome(outcome));
        result
    }

    async fn run(&self, payload: &Value, caller: Option<CallerIdentity>) -> ApiResult<FloorPlan> {
        enter(GenerationStage::Validating, None);
        let request = validate_generation_request(payload)
            .map_err(|e| fail(GenerationStage::Validating, None, e.into()))?;
        let project_id = request.project_id;

        enter(GenerationStage::Authorizing, Some(project_id));
        let caller = caller.ok_or_else(|| {
            fail(
                GenerationStage::Authorizing,
                Some(project_id),
                ApiError::unauthorized("Unauthorized"),
            )
        })?;

        enter(GenerationStage::LoadingProject, Some(project_id));
        let project = self
            .repository
            .find_by_id(project_id)
            .await
            .map_err(|e| fail(GenerationStage::LoadingProject, Some(project_id), e.into()))?;

        enter(GenerationStage::Generating, Some(project_id));
        let prompt = build_floor_plan_prompt(&project, request.requirements.as_deref());
        let started = Instant::now();
        let generated =
            generate_with_timeout(self.provider.as_ref(), &prompt, self.image_timeout).await;
        let elapsed = started.elapsed();
        with_metrics(|metrics| metrics.record_image_generation(elapsed.as_secs_f64()));
        let image = generated
            .map_err(|e| fail(GenerationStage::Generating, Some(project_id), e.into()))?;
        tracing::debug!(
            project_id = %project_id,
            provider = self.provider.provider_id(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Image generated"
        );

        enter(GenerationStage::Persisting, Some(project_id));
        let plan = self
            .coordinator
            .persist(project_id, caller.user_id, image, request.requirements)
            .await
            .map_err(|e| fail(GenerationStage::Persisting, Some(project_id), e.into()))?;

        tracing::info!(
            project_id = %project_id,
            floor_plan_id = %plan.floor_plan_id,
            stage = %GenerationStage::Committed,
            "Floor plan generated"
        );
        Ok(plan)
    }
}

fn enter(stage: GenerationStage, project_id: Option<ProjectId>) {
    match project_id {
        Some(project_id) => {
            tracing::debug!(stage = %stage, project_id = %project_id, "Entering stage")
        }
        None => tracing::debug!(stage = %stage, "Entering stage"),
    }
}

fn fail(stage: GenerationStage, project_id: Option<ProjectId>, err: ApiError) -> ApiError {
    let project_id = project_id.map(|id| id.to_string()).unwrap_or_default();
    if err.status_code().is_server_error() {
        tracing::error!(
            stage = %stage,
            project_id = %project_id,
            error_kind = %err.code,
            error = %err.message,
            "Floor plan generation failed"
        );
    } else {
        tracing::warn!(
            stage = %stage,
            project_id = %project_id,
            error_kind = %err.code,
            error = %err.message,
            "Floor plan generation rejected"
        );
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use planforge_core::{EntityIdType, UserId};
    use planforge_storage::InMemoryStore;
    use serde_json::json;

    struct Unreachable;

    #[::async_trait::async_trait]
    impl ImageGenerationProvider for Unreachable {
        async fn generate(
            &self,
            _prompt: &str,
        ) -> Result<planforge_core::ImageReference, planforge_core::GenerationError> {
            panic!("provider must not be called");
        }

        fn provider_id(&self) -> &str {
            "unreachable"
        }
    }

    fn service() -> GenerationService {
        let store = Arc::new(InMemoryStore::new());
        GenerationService::new(
            ProjectRepository::new(store.clone()),
            TransactionCoordinator::new(store),
            Arc::new(Unreachable),
            Duration::from_secs(60),
        )
    }

    fn caller() -> Option<CallerIdentity> {
        Some(CallerIdentity {
            user_id: UserId::new("u1"),
        })
    }

    #[tokio::test]
    async fn test_validation_runs_before_authorization() {
        let err = service().generate(&json!({}), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "projectId required");
    }

    #[tokio::test]
    async fn test_missing_caller_is_unauthorized() {
        let payload = json!({ "projectId": ProjectId::now_v7().to_string() });
        let err = service().generate(&payload, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_unknown_project_never_reaches_provider() {
        let payload = json!({ "projectId": ProjectId::now_v7().to_string() });
        let err = service().generate(&payload, caller()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(GenerationStage::LoadingProject.to_string(), "loading_project");
        assert_eq!(GenerationStage::Committed.as_str(), "committed");
    }
}
