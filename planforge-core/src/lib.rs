//! Planforge Core - Domain Types
//!
//! Entities, identifiers, error kinds, request validation and prompt
//! assembly. Every other crate in the workspace depends on this one; it
//! performs no I/O.

pub mod entities;
pub mod error;
pub mod identity;
pub mod prompt;
pub mod validation;

pub use entities::{
    ActivityAction, ActivityRecord, FloorPlan, FloorPlanStatus, ImageReference, Location, Project,
    StatusParseError, DEFAULT_BATHROOMS, DEFAULT_BEDROOMS,
};
pub use error::{
    ConfigError, EntityKind, GenerationError, PersistenceError, PlanforgeError, StorageError,
    ValidationError,
};
pub use identity::{ActivityId, EntityIdType, FloorPlanId, ProjectId, Timestamp, UserId};
pub use prompt::{build_floor_plan_prompt, DEFAULT_REQUIREMENTS_PHRASE};
pub use validation::{validate_generation_request, GenerationRequest, MAX_REQUIREMENTS_CHARS};
