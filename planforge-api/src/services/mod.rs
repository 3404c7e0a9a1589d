//! Service layer: request orchestration kept out of the HTTP handlers.

pub mod generation_service;

pub use generation_service::{GenerationService, GenerationStage};
