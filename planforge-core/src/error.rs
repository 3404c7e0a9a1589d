//! Error types for Planforge operations

use crate::ProjectId;
use std::fmt;
use thiserror::Error;

/// Entity discriminator used in storage error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    FloorPlan,
    Activity,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Project => "project",
            EntityKind::FloorPlan => "floor plan",
            EntityKind::Activity => "activity",
        };
        f.write_str(name)
    }
}

/// Request validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} required")]
    RequiredFieldMissing { field: String },

    #[error("{field} {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("Invalid request body: {reason}")]
    InvalidPayload { reason: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },

    #[error("Insert failed for {entity}: {reason}")]
    InsertFailed { entity: EntityKind, reason: String },

    #[error("Update failed for {entity} {id}: {reason}")]
    UpdateFailed {
        entity: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Malformed stored {entity}: {reason}")]
    Malformed { entity: EntityKind, reason: String },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

/// Image generation provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Image provider {provider} is not configured")]
    NotConfigured { provider: String },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("{provider} returned no usable image reference")]
    MissingImageReference { provider: String },
}

/// Failures of the transactional persist-link-audit sequence.
///
/// Raising any of these implies the surrounding unit of work was aborted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("could not start session: {reason}")]
    Session { reason: String },

    #[error("artifact insert failed: {reason}")]
    ArtifactInsert { reason: String },

    #[error("project not found during link")]
    ProjectNotFoundDuringLink { project_id: ProjectId },

    #[error("link update had no effect")]
    LinkUpdateNoEffect { project_id: ProjectId },

    #[error("link update matched {matched} projects")]
    AmbiguousLink { project_id: ProjectId, matched: u64 },

    #[error("link update failed: {reason}")]
    LinkUpdate { reason: String },

    #[error("activity insert failed: {reason}")]
    AuditInsert { reason: String },

    #[error("commit failed: {reason}")]
    Commit { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Planforge errors.
#[derive(Debug, Clone, Error)]
pub enum PlanforgeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityIdType;

    #[test]
    fn test_required_field_message() {
        let err = ValidationError::RequiredFieldMissing {
            field: "projectId".to_string(),
        };
        assert_eq!(err.to_string(), "projectId required");
    }

    #[test]
    fn test_link_failure_messages() {
        let project_id = ProjectId::now_v7();
        assert_eq!(
            PersistenceError::ProjectNotFoundDuringLink { project_id }.to_string(),
            "project not found during link"
        );
        assert_eq!(
            PersistenceError::LinkUpdateNoEffect { project_id }.to_string(),
            "link update had no effect"
        );
    }

    #[test]
    fn test_storage_not_found_display() {
        let err = StorageError::NotFound {
            entity: EntityKind::Project,
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "project abc not found");
    }

    #[test]
    fn test_generation_timeout_display() {
        let err = GenerationError::Timeout {
            provider: "openai".to_string(),
            timeout_ms: 1500,
        };
        let msg = err.to_string();
        assert!(msg.contains("openai"));
        assert!(msg.contains("1500ms"));
    }

    #[test]
    fn test_master_error_wraps_kinds() {
        let err: PlanforgeError = GenerationError::MissingImageReference {
            provider: "fake".to_string(),
        }
        .into();
        assert!(matches!(err, PlanforgeError::Generation(_)));
        assert!(err.to_string().starts_with("Generation error"));
    }
}
