//! Image provider configuration.

use std::fmt;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_IMAGE_QUALITY: &str = "standard";
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 60;

/// Settings for the image generation provider.
#[derive(Clone)]
pub struct ImageProviderConfig {
    /// API key. `None` leaves the provider unconfigured.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub quality: String,
    /// Upper bound on one generation call.
    pub timeout: Duration,
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
            quality: DEFAULT_IMAGE_QUALITY.to_string(),
            timeout: Duration::from_secs(DEFAULT_IMAGE_TIMEOUT_SECS),
        }
    }
}

impl ImageProviderConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PLANFORGE_OPENAI_API_KEY`
    /// - `PLANFORGE_OPENAI_BASE_URL`
    /// - `PLANFORGE_IMAGE_MODEL`
    /// - `PLANFORGE_IMAGE_SIZE`
    /// - `PLANFORGE_IMAGE_QUALITY`
    /// - `PLANFORGE_IMAGE_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("PLANFORGE_OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: std::env::var("PLANFORGE_OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: std::env::var("PLANFORGE_IMAGE_MODEL").unwrap_or(defaults.model),
            size: std::env::var("PLANFORGE_IMAGE_SIZE").unwrap_or(defaults.size),
            quality: std::env::var("PLANFORGE_IMAGE_QUALITY").unwrap_or(defaults.quality),
            timeout: std::env::var("PLANFORGE_IMAGE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for ImageProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .field("timeout", &self.timeout)
            .finish()
    }
}
