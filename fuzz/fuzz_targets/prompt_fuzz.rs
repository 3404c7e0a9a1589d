//! Fuzz target for prompt construction.
//!
//! Arbitrary requirements text must end up trimmed in the prompt, and blank
//! text must fall back to the default phrase.
//!
//! Run with: cargo +nightly fuzz run prompt_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use planforge_core::{
    build_floor_plan_prompt, EntityIdType, Location, Project, ProjectId,
    DEFAULT_REQUIREMENTS_PHRASE,
};

fuzz_target!(|data: &[u8]| {
    let Ok(requirements) = std::str::from_utf8(data) else {
        return;
    };

    let project = Project {
        project_id: ProjectId::now_v7(),
        building_type: "bungalow".to_string(),
        land_area: 600.0,
        land_area_unit: "sqm".to_string(),
        budget: 40_000_000.0,
        currency: "NGN".to_string(),
        location: Location {
            state: "Abuja".to_string(),
            country: "Nigeria".to_string(),
        },
        bedrooms: 3,
        bathrooms: 2,
        linked_artifact_ids: Vec::new(),
    };

    let prompt = build_floor_plan_prompt(&project, Some(requirements));
    let trimmed = requirements.trim();
    if trimmed.is_empty() {
        assert!(prompt.contains(DEFAULT_REQUIREMENTS_PHRASE));
    } else {
        assert!(prompt.contains(trimmed));
    }
    assert_eq!(prompt, build_floor_plan_prompt(&project, Some(requirements)));
});
