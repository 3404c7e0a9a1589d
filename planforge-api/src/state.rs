//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use planforge_llm::ImageGenerationProvider;
use planforge_storage::{DocumentStore, ProjectRepository, TransactionCoordinator};

use crate::auth::IdentityProvider;
use crate::services::GenerationService;

/// Application-wide state shared across all routes.
///
/// Every field is an immutable handle; per-request state lives in the store.
#[derive(Clone)]
pub struct AppState {
    /// Backing store, used directly by readiness checks.
    pub store: Arc<dyn DocumentStore>,
    pub repository: ProjectRepository,
    pub generation: Arc<GenerationService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the components together over one store and one image provider.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn ImageGenerationProvider>,
        identity: Arc<dyn IdentityProvider>,
        image_timeout: Duration,
    ) -> Self {
        let repository = ProjectRepository::new(store.clone());
        let coordinator = TransactionCoordinator::new(store.clone());
        let generation = Arc::new(GenerationService::new(
            repository.clone(),
            coordinator,
            provider,
            image_timeout,
        ));

        Self {
            store,
            repository,
            generation,
            identity,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<dyn DocumentStore>, store);
crate::impl_from_ref!(ProjectRepository, repository);
crate::impl_from_ref!(Arc<GenerationService>, generation);
crate::impl_from_ref!(Arc<dyn IdentityProvider>, identity);
crate::impl_from_ref!(Instant, start_time);
