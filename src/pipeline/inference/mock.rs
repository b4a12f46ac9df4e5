//! Deterministic simulated verdicts.
//!
//! The same reference number always maps to the same diagnosis and
//! confidence, so a simulated case reads the same on every replay.

use crate::models::ClinicalResult;
use crate::pipeline::normalizer::mock_result;

/// Verdict used when no seed is available.
const UNSEEDED_CONFIDENCE: u8 = 85;
const SEEDED_CONFIDENCE_BASE: u32 = 60;
const SEEDED_CONFIDENCE_SPAN: u32 = 30;

/// 32-bit polynomial string hash (`h = h * 31 + unit` over UTF-16 code
/// units, wrapping), returned as its absolute value.
pub fn seed_hash(seed: &str) -> u32 {
    seed.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
        .unsigned_abs()
}

/// Simulated verdict keyed by `seed`: even hash means pneumonia, and the
/// confidence lands in 60..=89.
pub fn deterministic_mock(seed: Option<&str>, reason: impl Into<String>) -> ClinicalResult {
    let (is_positive, confidence) = match seed.map(str::trim).filter(|s| !s.is_empty()) {
        Some(seed) => {
            let h = seed_hash(seed);
            let confidence = SEEDED_CONFIDENCE_BASE + h % SEEDED_CONFIDENCE_SPAN;
            (h % 2 == 0, confidence as u8)
        }
        None => (true, UNSEEDED_CONFIDENCE),
    };

    mock_result(is_positive, confidence, reason)
}
