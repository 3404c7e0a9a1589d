//! Planforge API - HTTP Layer
//!
//! Axum server exposing floor plan generation. A request is validated,
//! attributed to a caller, matched to a stored project, sent to the image
//! provider and finally persisted and linked to its project in a single
//! unit of work.

pub mod auth;
pub mod config;
pub mod error;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

pub use auth::{
    bearer_token, generate_jwt_token, validate_jwt_token, AuthConfig, CallerIdentity, Claims,
    FixedClock, IdentityProvider, JwtClock, JwtIdentityProvider, JwtSecret, SystemClock,
};
pub use config::{ApiConfig, Environment, StoreBackend};
pub use error::{ApiError, ApiResult, ErrorBody, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{GenerationService, GenerationStage};
pub use state::AppState;
pub use types::*;
