//! Prompt assembly for the image provider.

use crate::Project;

/// Phrase used when the caller supplied no requirements.
pub const DEFAULT_REQUIREMENTS_PHRASE: &str = "standard layout";

/// Build the generation prompt for `project`.
///
/// Output depends only on the inputs, so identical projects and
/// requirements always produce identical prompts.
pub fn build_floor_plan_prompt(project: &Project, requirements: Option<&str>) -> String {
    let requirements = requirements
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_REQUIREMENTS_PHRASE);

    format!(
        "Generate a detailed architectural floor plan for a {building_type} on {area} {unit} of land \
         in {state}, {country}. Budget: {budget} {currency}. \
         The design must include {bedrooms} bedrooms and {bathrooms} bathrooms. \
         Requirements: {requirements}. \
         Render as a clean top-down 2D blueprint with labelled rooms and dimensions.",
        building_type = project.building_type,
        area = format_number(project.land_area),
        unit = project.land_area_unit,
        state = project.location.state,
        country = project.location.country,
        budget = format_number(project.budget),
        currency = project.currency,
        bedrooms = project.bedrooms,
        bathrooms = project.bathrooms,
    )
}

// Whole numbers print without a trailing ".0".
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityIdType, Location, ProjectId, DEFAULT_BATHROOMS, DEFAULT_BEDROOMS};

    fn project() -> Project {
        Project {
            project_id: ProjectId::now_v7(),
            building_type: "duplex".to_string(),
            land_area: 450.0,
            land_area_unit: "sqm".to_string(),
            budget: 25_000_000.0,
            currency: "NGN".to_string(),
            location: Location {
                state: "Lagos".to_string(),
                country: "Nigeria".to_string(),
            },
            bedrooms: DEFAULT_BEDROOMS,
            bathrooms: DEFAULT_BATHROOMS,
            linked_artifact_ids: Vec::new(),
        }
    }

    #[test]
    fn test_prompt_contains_project_attributes() {
        let prompt = build_floor_plan_prompt(&project(), Some("open kitchen"));
        assert!(prompt.contains("duplex"));
        assert!(prompt.contains("450 sqm"));
        assert!(prompt.contains("Lagos, Nigeria"));
        assert!(prompt.contains("25000000 NGN"));
        assert!(prompt.contains("3 bedrooms and 2 bathrooms"));
        assert!(prompt.contains("Requirements: open kitchen."));
    }

    #[test]
    fn test_prompt_uses_default_phrase() {
        let project = project();
        let absent = build_floor_plan_prompt(&project, None);
        let blank = build_floor_plan_prompt(&project, Some("  "));
        assert!(absent.contains("Requirements: standard layout."));
        assert_eq!(absent, blank);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let project = project();
        assert_eq!(
            build_floor_plan_prompt(&project, Some("pool")),
            build_floor_plan_prompt(&project, Some("pool"))
        );
    }

    #[test]
    fn test_fractional_values_keep_decimals() {
        let mut project = project();
        project.land_area = 120.5;
        assert!(build_floor_plan_prompt(&project, None).contains("120.5 sqm"));
    }
}
