//! Fuzz target for generation request validation.
//!
//! Any byte sequence that parses as JSON must either validate or produce a
//! validation error; it must never panic.
//!
//! Run with: cargo +nightly fuzz run request_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use planforge_core::{validate_generation_request, MAX_REQUIREMENTS_CHARS};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    match validate_generation_request(&payload) {
        Ok(request) => {
            if let Some(text) = &request.requirements {
                assert!(text.chars().count() <= MAX_REQUIREMENTS_CHARS);
            }
        }
        Err(err) => {
            assert!(!err.to_string().is_empty());
        }
    }
});
