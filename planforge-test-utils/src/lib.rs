//! Planforge Test Utilities
//!
//! Shared test infrastructure for the Planforge workspace:
//! - Fixtures for stored project documents
//! - A scriptable fake image provider
//! - Proptest generators for requests and documents

pub use planforge_core::{
    EntityIdType, FloorPlanId, GenerationError, ImageReference, Location, ProjectId, UserId,
    MAX_REQUIREMENTS_CHARS,
};
pub use planforge_storage::{Fault, InMemoryStore, ProjectDocument};

use ::async_trait::async_trait;
use planforge_llm::ImageGenerationProvider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// FAKE IMAGE PROVIDER
// ============================================================================

/// What a [`FakeImageProvider`] does when called.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Return this URL as the image reference.
    Url(String),
    /// Respond without a usable image reference.
    NoImage,
    /// Fail with this error.
    Fail(GenerationError),
    /// Sleep, then return this URL.
    Slow(Duration, String),
}

/// Scriptable [`ImageGenerationProvider`] that records its calls.
#[derive(Debug, Clone)]
pub struct FakeImageProvider {
    behavior: FakeBehavior,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeImageProvider {
    pub const PROVIDER_ID: &'static str = "fake";

    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always returns `url`.
    pub fn returning(url: impl Into<String>) -> Self {
        Self::new(FakeBehavior::Url(url.into()))
    }

    /// Always responds without an image reference.
    pub fn without_image() -> Self {
        Self::new(FakeBehavior::NoImage)
    }

    /// Always fails with a provider-side error.
    pub fn failing() -> Self {
        Self::new(FakeBehavior::Fail(GenerationError::RequestFailed {
            provider: Self::PROVIDER_ID.to_string(),
            status: 503,
            message: "service unavailable".to_string(),
        }))
    }

    /// Returns `url` after `delay`.
    pub fn slow(delay: Duration, url: impl Into<String>) -> Self {
        Self::new(FakeBehavior::Slow(delay, url.into()))
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    fn reference(&self, url: &str) -> Result<ImageReference, GenerationError> {
        ImageReference::parse(url).ok_or_else(|| GenerationError::MissingImageReference {
            provider: Self::PROVIDER_ID.to_string(),
        })
    }
}

#[async_trait]
impl ImageGenerationProvider for FakeImageProvider {
    async fn generate(&self, prompt: &str) -> Result<ImageReference, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        match &self.behavior {
            FakeBehavior::Url(url) => self.reference(url),
            FakeBehavior::NoImage => Err(GenerationError::MissingImageReference {
                provider: Self::PROVIDER_ID.to_string(),
            }),
            FakeBehavior::Fail(err) => Err(err.clone()),
            FakeBehavior::Slow(delay, url) => {
                tokio::time::sleep(*delay).await;
                self.reference(url)
            }
        }
    }

    fn provider_id(&self) -> &str {
        Self::PROVIDER_ID
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use serde_json::Value;

    /// URL returned by the default fake provider.
    pub const IMAGE_URL: &str = "https://img/abc.png";

    /// A project document without counts or back-references.
    pub fn project_document() -> ProjectDocument {
        ProjectDocument {
            project_id: ProjectId::now_v7(),
            building_type: "duplex".to_string(),
            land_area: 450.0,
            land_area_unit: "sqm".to_string(),
            budget: 25_000_000.0,
            currency: "NGN".to_string(),
            location: Location {
                state: "Lagos".to_string(),
                country: "Nigeria".to_string(),
            },
            bedrooms: None,
            bathrooms: None,
            linked_artifact_ids: None,
        }
    }

    /// A project document whose back-reference field holds `linked`.
    pub fn project_document_with_links(linked: Value) -> ProjectDocument {
        ProjectDocument {
            linked_artifact_ids: Some(linked),
            ..project_document()
        }
    }

    /// A store holding `document`.
    pub async fn store_with(document: ProjectDocument) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_project(document).await;
        store
    }

    /// The caller used throughout the tests.
    pub fn test_user() -> UserId {
        UserId::new("test-user")
    }

    /// A usable image reference.
    pub fn image() -> ImageReference {
        ImageReference::parse(IMAGE_URL).unwrap_or_else(|| unreachable!("fixture URL is valid"))
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for requests and stored documents.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    /// A random ProjectId.
    pub fn arb_project_id() -> impl Strategy<Value = ProjectId> {
        any::<[u8; 16]>().prop_map(|bytes| ProjectId::new(uuid::Uuid::from_bytes(bytes)))
    }

    /// Requirements text within the length limit (possibly empty).
    pub fn arb_requirements_within_limit() -> impl Strategy<Value = String> {
        prop::collection::vec(any::<char>(), 0..=MAX_REQUIREMENTS_CHARS)
            .prop_map(|chars| chars.into_iter().collect())
    }

    /// Requirements text strictly over the length limit.
    pub fn arb_requirements_over_limit() -> impl Strategy<Value = String> {
        (MAX_REQUIREMENTS_CHARS + 1..MAX_REQUIREMENTS_CHARS + 200)
            .prop_map(|len| "r".repeat(len))
    }

    /// Any shape the back-reference field may be stored in.
    pub fn arb_linked_field() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            Just(Some(Value::Null)),
            Just(Some(json!("legacy"))),
            Just(Some(json!({ "0": "x" }))),
            any::<i64>().prop_map(|n| Some(json!(n))),
            prop::collection::vec(Just(()), 0..5).prop_map(|ids| {
                Some(Value::Array(
                    ids.into_iter()
                        .map(|_| Value::String(FloorPlanId::now_v7().to_string()))
                        .collect(),
                ))
            }),
        ]
    }

    /// A stored project document with an arbitrary back-reference field.
    pub fn arb_project_document() -> impl Strategy<Value = ProjectDocument> {
        (
            arb_project_id(),
            arb_linked_field(),
            prop::option::of(1u32..10),
            prop::option::of(1u32..6),
        )
            .prop_map(|(project_id, linked, bedrooms, bathrooms)| ProjectDocument {
                project_id,
                bedrooms,
                bathrooms,
                linked_artifact_ids: linked,
                ..fixtures::project_document()
            })
    }
}
