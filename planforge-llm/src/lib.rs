//! Planforge LLM - Image Generation Providers
//!
//! Provider-agnostic trait for turning a text prompt into a generated image
//! reference, plus the OpenAI Images implementation. Providers are injected
//! into the API layer so tests can substitute fakes.

pub mod config;
pub mod providers;

pub use config::ImageProviderConfig;
pub use providers::OpenAIImageProvider;

use ::async_trait::async_trait;
use planforge_core::{GenerationError, ImageReference};
use std::time::Duration;

// ============================================================================
// IMAGE GENERATION PROVIDER TRAIT
// ============================================================================

/// Trait for generative image providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Contract
/// * One call per invocation. Implementations never retry.
/// * A response without a usable image URL is an error, never a success.
#[async_trait]
pub trait ImageGenerationProvider: Send + Sync {
    /// Generate an image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<ImageReference, GenerationError>;

    /// Short provider name used in errors and logs (e.g. "openai").
    fn provider_id(&self) -> &str;
}

/// Run `provider.generate` with an upper bound on its duration.
///
/// Expiry yields [`GenerationError::Timeout`]; the in-flight call is dropped.
pub async fn generate_with_timeout(
    provider: &dyn ImageGenerationProvider,
    prompt: &str,
    timeout: Duration,
) -> Result<ImageReference, GenerationError> {
    match tokio::time::timeout(timeout, provider.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout {
            provider: provider.provider_id().to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
