//! OpenAI provider implementation
//!
//! Image generation through the OpenAI Images API.

pub mod client;
pub mod images;
pub mod types;

pub use client::OpenAIClient;
pub use images::OpenAIImageProvider;
