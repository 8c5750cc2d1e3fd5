#![no_main]

use libfuzzer_sys::fuzz_target;
use jobseq::sequence::{validate_max_sequence, Candidate, MAX_MAX_SEQUENCE_ID, MIN_MAX_SEQUENCE_ID};

fuzz_target!(|data: &[u8]| {
    // Arbitrary text as a max_job_sequence_id value - must never panic and
    // anything accepted must be in range.
    let text = String::from_utf8_lossy(data);
    if let Ok(value) = validate_max_sequence(&Candidate::from(text.as_ref())) {
        assert!((MIN_MAX_SEQUENCE_ID..=MAX_MAX_SEQUENCE_ID).contains(&value.get()));
    }

    // Same bytes as a JSON document
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) {
        if let Ok(value) = validate_max_sequence(&Candidate::from(json)) {
            assert!((MIN_MAX_SEQUENCE_ID..=MAX_MAX_SEQUENCE_ID).contains(&value.get()));
        }
    }
});
