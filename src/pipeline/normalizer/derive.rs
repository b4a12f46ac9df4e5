//! Unit canonicalization and the clinical fields derived from a verdict.

use chrono::Utc;

use crate::models::{ClinicalResult, Diagnosis, PneumoniaType, Probabilities, Severity};

pub const NORMAL_ACTION: &str =
    "No action required. Regular check-up schedule should be maintained.";
pub const FURTHER_EVALUATION_ACTION: &str = "Further evaluation required.";

/// Pneumonia probability above which the infection is typed bacterial.
const BACTERIAL_ABOVE: u8 = 85;
const MODERATE_FROM: u8 = 80;
const SEVERE_FROM: u8 = 90;

/// Convert a fraction (0–1) or percentage (0–100) to an integer percentage.
///
/// Values strictly above 1 are already percentages; 1.0 itself means 100%.
/// Non-finite input maps to 0 and the result is clamped to 0..=100.
pub fn to_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    let pct = if value > 1.0 { value } else { value * 100.0 };
    pct.round().clamp(0.0, 100.0) as u8
}

/// A diagnosis with its confidence, before clinical derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub diagnosis: Diagnosis,
    /// Already canonical (0–100).
    pub confidence: u8,
    /// Raw class probabilities as reported; `None` members were absent.
    pub normal: Option<f64>,
    pub pneumonia: Option<f64>,
}

impl ParsedVerdict {
    fn probabilities(&self) -> Option<Probabilities> {
        if self.normal.is_none() && self.pneumonia.is_none() {
            return None;
        }
        Some(Probabilities {
            normal: self.normal.map(to_percent).unwrap_or(0),
            pneumonia: self.pneumonia.map(to_percent).unwrap_or(0),
        })
    }
}

/// Type, severity and guidance for a pneumonia finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PneumoniaAssessment {
    pub pneumonia_type: PneumoniaType,
    pub severity: Severity,
    pub severity_description: &'static str,
    pub recommended_action: &'static str,
}

/// Derive the assessment from the pneumonia probability (0–100).
pub fn assess_pneumonia(probability: u8) -> PneumoniaAssessment {
    let pneumonia_type = if probability > BACTERIAL_ABOVE {
        PneumoniaType::Bacterial
    } else {
        PneumoniaType::Viral
    };

    let (severity, severity_description, recommended_action) = if probability < MODERATE_FROM {
        (
            Severity::Mild,
            "The pneumonia appears to be in early stages with minimal lung involvement.",
            "Outpatient treatment with oral antibiotics is recommended. Follow up in 2-3 days.",
        )
    } else if probability < SEVERE_FROM {
        (
            Severity::Moderate,
            "The pneumonia shows significant lung involvement without severe complications.",
            "Consider short hospitalization or close outpatient monitoring. IV antibiotics may be necessary.",
        )
    } else {
        (
            Severity::Severe,
            "The pneumonia shows extensive lung involvement with possible complications.",
            "Immediate hospitalization required. IV antibiotics, oxygen therapy and close monitoring recommended.",
        )
    };

    PneumoniaAssessment {
        pneumonia_type,
        severity,
        severity_description,
        recommended_action,
    }
}

/// Build the canonical result. The only place pneumonia fields are filled in.
pub fn build_result(verdict: ParsedVerdict) -> ClinicalResult {
    let probabilities = verdict.probabilities();

    let mut result = ClinicalResult {
        diagnosis: verdict.diagnosis.clone(),
        confidence: verdict.confidence,
        pneumonia_type: None,
        severity: None,
        severity_description: None,
        recommended_action: String::new(),
        probabilities,
        is_mock: false,
        source_error: None,
        image_url: None,
        image_public_id: None,
        analyzed_at: Utc::now(),
    };

    match &verdict.diagnosis {
        Diagnosis::Pneumonia => {
            // No reported pneumonia probability: the confidence is that probability
            let p = verdict
                .pneumonia
                .map(to_percent)
                .unwrap_or(verdict.confidence);
            let assessment = assess_pneumonia(p);
            result.pneumonia_type = Some(assessment.pneumonia_type);
            result.severity = Some(assessment.severity);
            result.severity_description = Some(assessment.severity_description.to_string());
            result.recommended_action = assessment.recommended_action.to_string();
        }
        Diagnosis::Normal => result.recommended_action = NORMAL_ACTION.to_string(),
        Diagnosis::Other(_) => result.recommended_action = FURTHER_EVALUATION_ACTION.to_string(),
    }

    result
}
