//! OpenAI image generation provider implementation

use super::client::OpenAIClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::{ImageGenerationProvider, ImageProviderConfig};
use ::async_trait::async_trait;
use planforge_core::{GenerationError, ImageReference};

const PROVIDER: &str = "openai";

/// OpenAI Images provider (dall-e-3 by default).
pub struct OpenAIImageProvider {
    client: OpenAIClient,
    model: String,
    size: String,
    quality: String,
}

impl OpenAIImageProvider {
    /// Create a provider from explicit settings.
    pub fn new(
        client: OpenAIClient,
        model: impl Into<String>,
        size: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            size: size.into(),
            quality: quality.into(),
        }
    }

    /// Create a provider from configuration. Fails without an API key.
    pub fn from_config(config: &ImageProviderConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenerationError::NotConfigured {
                provider: PROVIDER.to_string(),
            })?;
        let client = OpenAIClient::new(api_key, config.base_url.clone(), config.timeout)?;
        Ok(Self::new(
            client,
            config.model.clone(),
            config.size.clone(),
            config.quality.clone(),
        ))
    }

    fn request_for(&self, prompt: &str) -> ImageGenerationRequest {
        ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.size.clone(),
            quality: self.quality.clone(),
        }
    }
}

/// Pick the first usable image URL out of a provider response.
pub fn image_from_response(
    response: ImageGenerationResponse,
) -> Result<ImageReference, GenerationError> {
    let first = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MissingImageReference {
            provider: PROVIDER.to_string(),
        })?;

    if let Some(revised) = first.revised_prompt.as_deref() {
        tracing::debug!(revised_prompt = %revised, "Provider revised the prompt");
    }

    first
        .url
        .as_deref()
        .and_then(ImageReference::parse)
        .ok_or_else(|| GenerationError::MissingImageReference {
            provider: PROVIDER.to_string(),
        })
}

#[async_trait]
impl ImageGenerationProvider for OpenAIImageProvider {
    async fn generate(&self, prompt: &str) -> Result<ImageReference, GenerationError> {
        let request = self.request_for(prompt);
        let response: ImageGenerationResponse =
            self.client.request("images/generations", &request).await?;
        image_from_response(response)
    }

    fn provider_id(&self) -> &str {
        PROVIDER
    }
}

impl std::fmt::Debug for OpenAIImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIImageProvider")
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .finish()
    }
}
