use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Diagnosis, PneumoniaType, PredictionLabel, Severity};

/// Class probabilities on the 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probabilities {
    pub normal: u8,
    pub pneumonia: u8,
}

/// Canonical clinical verdict for one uploaded image.
///
/// `pneumonia_type`, `severity` and `severity_description` are set exactly
/// when `diagnosis` is `Pneumonia`. All percentages are integers in 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalResult {
    pub diagnosis: Diagnosis,
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pneumonia_type: Option<PneumoniaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_description: Option<String>,
    pub recommended_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Probabilities>,
    pub is_mock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    /// Stored copy of the image, when the secondary upload succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_public_id: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl ClinicalResult {
    /// Map the verdict onto the label set used by the route layer.
    pub fn prediction_label(&self) -> PredictionLabel {
        match &self.diagnosis {
            Diagnosis::Normal => PredictionLabel::Normal,
            Diagnosis::Pneumonia => match self.pneumonia_type {
                Some(PneumoniaType::Viral) => PredictionLabel::ViralPneumonia,
                Some(PneumoniaType::Bacterial) | None => PredictionLabel::BacterialPneumonia,
            },
            Diagnosis::Other(label) => label
                .parse::<PredictionLabel>()
                .ok()
                .filter(PredictionLabel::is_validation_only)
                .unwrap_or(PredictionLabel::Normal),
        }
    }
}
