//! Generation request validation.
//!
//! Works on the raw JSON payload rather than a derived struct so that type
//! mismatches (e.g. a numeric `requirements`) surface as validation errors
//! instead of deserializer rejections.

use crate::{ProjectId, ValidationError};
use serde_json::Value;

/// Maximum length of the free-text requirements, in characters.
pub const MAX_REQUIREMENTS_CHARS: usize = 1000;

const PROJECT_ID_FIELD: &str = "projectId";
const REQUIREMENTS_FIELD: &str = "requirements";

/// A validated floor-plan generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub project_id: ProjectId,
    /// `None` when absent or `null`; otherwise the text as sent.
    pub requirements: Option<String>,
}

/// Validate a raw request body.
pub fn validate_generation_request(payload: &Value) -> Result<GenerationRequest, ValidationError> {
    let body = payload
        .as_object()
        .ok_or_else(|| ValidationError::InvalidPayload {
            reason: "expected a JSON object".to_string(),
        })?;

    // Missing, empty, non-string and malformed ids all report the same error.
    let project_id = body
        .get(PROJECT_ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|raw| raw.trim().parse::<ProjectId>().ok())
        .ok_or_else(|| ValidationError::RequiredFieldMissing {
            field: PROJECT_ID_FIELD.to_string(),
        })?;

    let requirements = match body.get(REQUIREMENTS_FIELD) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => {
            let length = text.chars().count();
            if length > MAX_REQUIREMENTS_CHARS {
                return Err(ValidationError::TooLong {
                    field: REQUIREMENTS_FIELD.to_string(),
                    max: MAX_REQUIREMENTS_CHARS,
                    actual: length,
                });
            }
            Some(text.clone())
        }
        Some(_) => {
            return Err(ValidationError::InvalidValue {
                field: REQUIREMENTS_FIELD.to_string(),
                reason: "must be a string".to_string(),
            })
        }
    };

    Ok(GenerationRequest {
        project_id,
        requirements,
    })
}
