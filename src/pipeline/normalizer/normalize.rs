use rand::Rng;

use super::derive::{build_result, ParsedVerdict};
use super::fallback::random_mock;
use super::freetext::{parse_lines, script_failure};
use super::structured::{parse_embedded, parse_value};
use super::types::RawInferenceOutput;
use super::NormalizeError;
use crate::models::ClinicalResult;

/// One parser in the free-text chain. `Ok(None)` hands over to the next stage;
/// an error stops the chain.
type TextStage = fn(&str) -> Result<Option<ParsedVerdict>, NormalizeError>;

const TEXT_STAGES: &[(&str, TextStage)] = &[
    ("embedded_json", parse_embedded as TextStage),
    ("key_value_lines", key_value_stage as TextStage),
];

fn key_value_stage(text: &str) -> Result<Option<ParsedVerdict>, NormalizeError> {
    Ok(parse_lines(text))
}

/// Normalize without any fallback, surfacing why the payload was unusable.
pub fn try_normalize(raw: &RawInferenceOutput) -> Result<ClinicalResult, NormalizeError> {
    let verdict = match raw {
        RawInferenceOutput::Structured(value) => parse_value(value)?,
        RawInferenceOutput::FreeText(text) => parse_text(text)?,
    };
    Ok(build_result(verdict))
}

fn parse_text(text: &str) -> Result<ParsedVerdict, NormalizeError> {
    if let Some(marker) = script_failure(text) {
        return Err(NormalizeError::ScriptFailure(marker.to_string()));
    }

    for (name, stage) in TEXT_STAGES {
        if let Some(verdict) = stage(text)? {
            tracing::debug!(stage = name, "Normalizer: verdict parsed");
            return Ok(verdict);
        }
    }

    Err(NormalizeError::NoVerdict)
}

/// Canonical result for any payload; unusable payloads become a flagged
/// random mock.
pub fn normalize(raw: &RawInferenceOutput) -> ClinicalResult {
    normalize_with_rng(raw, &mut rand::thread_rng())
}

pub fn normalize_with_rng<R: Rng + ?Sized>(raw: &RawInferenceOutput, rng: &mut R) -> ClinicalResult {
    match try_normalize(raw) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "Normalizer: unusable inference output, using fallback verdict");
            random_mock(rng, format!("Analysis error, using fallback prediction: {e}"))
        }
    }
}
