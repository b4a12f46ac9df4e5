//! Upload intake: classify, infer, then decide whether the verdict may be
//! persisted.
//!
//! Text-only PDFs never reach the inference service. Validation labels
//! (`NON_XRAY`, `COVID`, `TB`) and PDFs uploaded without symptoms are
//! reported back but marked as not persistable.

use std::sync::Arc;

use serde::Serialize;

use crate::config::IntakeConfig;
use crate::models::{
    generate_reference_number, ClinicalResult, PatientContext, PredictionLabel, UploadedFile,
};
use crate::pipeline::classifier::{ContentClassifier, ContentVerdict};
use crate::pipeline::inference::{
    CircuitBreaker, CloudinaryStore, FileFlagStore, HttpInferenceClient, InferOptions,
    InferenceError, InferenceOrchestrator,
};

const UPLOAD_XRAY_ACTION: &str =
    "Please upload a medical X-ray image (PNG, JPG, or scanned X-ray PDF)";
const VALIDATION_ACTION: &str = "Further evaluation required";
const SAFETY_ACTION: &str =
    "Please provide symptom information and ensure you're uploading a medical X-ray image.";
const SAFETY_REASON: &str = "PDF uploaded without symptom information. As a safety measure, \
     this requires clinical verification before saving.";

/// One uploaded scan with everything reported alongside it.
#[derive(Debug, Clone)]
pub struct IntakeRequest {
    pub file: UploadedFile,
    pub patient: PatientContext,
    pub symptoms: Vec<String>,
    pub options: InferOptions,
}

impl IntakeRequest {
    pub fn new(file: UploadedFile) -> Self {
        Self {
            file,
            patient: PatientContext::default(),
            symptoms: Vec::new(),
            options: InferOptions::default(),
        }
    }

    fn has_symptoms(&self) -> bool {
        self.symptoms.iter().any(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// Text-only PDF, rejected before inference.
    Ineligible {
        reference_number: String,
        prediction: PredictionLabel,
        confidence: u8,
        recommended_action: String,
        verdict: ContentVerdict,
    },
    /// Reported to the caller, never persisted.
    ValidationOnly {
        reference_number: String,
        prediction: PredictionLabel,
        confidence: u8,
        recommended_action: String,
        reason: String,
        safety_rejected: bool,
        result: ClinicalResult,
    },
    Diagnosed {
        reference_number: String,
        prediction: PredictionLabel,
        result: ClinicalResult,
    },
}

impl IntakeOutcome {
    pub fn reference_number(&self) -> &str {
        match self {
            Self::Ineligible {
                reference_number, ..
            }
            | Self::ValidationOnly {
                reference_number, ..
            }
            | Self::Diagnosed {
                reference_number, ..
            } => reference_number,
        }
    }

    pub fn prediction(&self) -> PredictionLabel {
        match self {
            Self::Ineligible { prediction, .. }
            | Self::ValidationOnly { prediction, .. }
            | Self::Diagnosed { prediction, .. } => *prediction,
        }
    }

    pub fn is_persistable(&self) -> bool {
        matches!(self, Self::Diagnosed { .. })
    }
}

pub struct IntakePipeline {
    classifier: ContentClassifier,
    orchestrator: InferenceOrchestrator,
    mock_enabled: bool,
}

impl IntakePipeline {
    pub fn new(classifier: ContentClassifier, orchestrator: InferenceOrchestrator) -> Self {
        Self {
            classifier,
            orchestrator,
            mock_enabled: false,
        }
    }

    /// Answer every request with a simulated verdict.
    pub fn with_mock_enabled(mut self, enabled: bool) -> Self {
        self.mock_enabled = enabled;
        self
    }

    /// Wire the HTTP client, file-backed circuit flag and optional image
    /// store from `config`.
    pub fn from_config(config: &IntakeConfig) -> Result<Self, InferenceError> {
        let client = HttpInferenceClient::new(&config.api_url, config.timeout_secs)?;
        let circuit = Arc::new(CircuitBreaker::new(
            config.failure_threshold,
            Box::new(FileFlagStore::new(&config.simulation_flag_path)),
        ));

        let mut orchestrator = InferenceOrchestrator::new(Box::new(client), circuit);
        if let Some(cloudinary) = &config.cloudinary {
            match CloudinaryStore::new(&cloudinary.cloud_name, &cloudinary.upload_preset) {
                Ok(store) => orchestrator = orchestrator.with_image_store(Box::new(store)),
                Err(e) => tracing::warn!(error = %e, "Intake: image storage disabled"),
            }
        }

        tracing::info!(
            api_url = %config.api_url,
            timeout_secs = config.timeout_secs,
            mock_enabled = config.mock_enabled,
            "Intake: pipeline configured"
        );

        Ok(Self::new(ContentClassifier::default(), orchestrator).with_mock_enabled(config.mock_enabled))
    }

    pub fn circuit(&self) -> &Arc<CircuitBreaker> {
        self.orchestrator.circuit()
    }

    pub fn run(&self, request: IntakeRequest) -> IntakeOutcome {
        let reference_number = request
            .patient
            .reference_number
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| {
                generate_reference_number(chrono::Utc::now().date_naive(), &mut rand::thread_rng())
            });
        let patient = request.patient.clone().with_reference(reference_number.clone());
        let is_pdf = request.file.is_pdf();

        if is_pdf {
            let verdict = self
                .classifier
                .classify(&request.file.bytes, &request.file.media_type);
            if verdict.is_text_only {
                tracing::info!(
                    reference = %reference_number,
                    reason = %verdict.reason,
                    "Intake: text-only PDF, skipping inference"
                );
                return IntakeOutcome::Ineligible {
                    reference_number,
                    prediction: PredictionLabel::NonXray,
                    confidence: (verdict.confidence * 100.0).round().clamp(0.0, 100.0) as u8,
                    recommended_action: UPLOAD_XRAY_ACTION.to_string(),
                    verdict,
                };
            }
        }

        let mut options = request.options;
        options.use_mock |= self.mock_enabled;

        let mut result = self.orchestrator.infer(&request.file, &patient, options);
        let label = result.prediction_label();
        let safety_rejected = is_pdf && !request.has_symptoms() && label.is_clinical_finding();

        if label.is_validation_only() || safety_rejected {
            let prediction = if safety_rejected {
                PredictionLabel::NonXraySafety
            } else {
                label
            };
            tracing::info!(
                reference = %reference_number,
                prediction = %prediction,
                safety_rejected,
                "Intake: validation-only result, not persistable"
            );

            // Validation images are not kept
            result.image_url = None;
            result.image_public_id = None;

            let (recommended_action, reason) = if safety_rejected {
                (SAFETY_ACTION, SAFETY_REASON.to_string())
            } else {
                (
                    VALIDATION_ACTION,
                    format!("{prediction} is a validation label and is not stored"),
                )
            };

            return IntakeOutcome::ValidationOnly {
                reference_number,
                prediction,
                confidence: result.confidence,
                recommended_action: recommended_action.to_string(),
                reason,
                safety_rejected,
                result,
            };
        }

        tracing::info!(
            reference = %reference_number,
            prediction = %label,
            is_mock = result.is_mock,
            "Intake: diagnosis ready"
        );
        IntakeOutcome::Diagnosed {
            reference_number,
            prediction: label,
            result,
        }
    }
}
