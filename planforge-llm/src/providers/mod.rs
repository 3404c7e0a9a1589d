//! Image provider implementations

pub mod openai;

pub use openai::{OpenAIClient, OpenAIImageProvider};

use planforge_core::GenerationError;

pub(crate) fn request_failed(
    provider: &str,
    status: u16,
    message: impl Into<String>,
) -> GenerationError {
    GenerationError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> GenerationError {
    GenerationError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}
