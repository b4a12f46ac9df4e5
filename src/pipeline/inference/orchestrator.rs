use std::sync::Arc;
use std::time::Instant;

use super::circuit::CircuitBreaker;
use super::mock::deterministic_mock;
use super::storage::ImageStore;
use super::types::{InferOptions, InferenceTransport, PredictRequest};
use super::InferenceError;
use crate::models::{ClinicalResult, PatientContext, UploadedFile};
use crate::pipeline::normalizer::{try_normalize, RawInferenceOutput};

const REQUESTED_SIMULATION: &str = "Simulation mode requested";
const ACTIVE_SIMULATION: &str = "Simulation mode active, inference service not called";

/// Routes each request to the live service or to a simulated verdict.
///
/// Never fails: every path ends in a `ClinicalResult`, simulated ones
/// flagged `is_mock` with the reason in `source_error`.
pub struct InferenceOrchestrator {
    transport: Box<dyn InferenceTransport + Send + Sync>,
    circuit: Arc<CircuitBreaker>,
    image_store: Option<Box<dyn ImageStore>>,
}

impl InferenceOrchestrator {
    pub fn new(
        transport: Box<dyn InferenceTransport + Send + Sync>,
        circuit: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            transport,
            circuit,
            image_store: None,
        }
    }

    /// Upload live-analysed images to `store`.
    pub fn with_image_store(mut self, store: Box<dyn ImageStore>) -> Self {
        self.image_store = Some(store);
        self
    }

    pub fn circuit(&self) -> &Arc<CircuitBreaker> {
        &self.circuit
    }

    pub fn infer(
        &self,
        image: &UploadedFile,
        patient: &PatientContext,
        options: InferOptions,
    ) -> ClinicalResult {
        let seed = patient.reference_number.as_deref();

        if options.use_mock {
            tracing::info!(reference = seed.unwrap_or(""), "Inference: mock requested");
            return deterministic_mock(seed, REQUESTED_SIMULATION);
        }

        if options.force_simulation {
            self.circuit.force_simulation();
        }

        if self.circuit.is_simulation_forced() {
            tracing::info!(reference = seed.unwrap_or(""), "Inference: simulation mode, skipping service");
            return deterministic_mock(seed, ACTIVE_SIMULATION);
        }

        let start = Instant::now();
        match self.call_service(image, patient) {
            Ok(mut result) => {
                self.circuit.record_success();
                tracing::info!(
                    diagnosis = %result.diagnosis,
                    confidence = result.confidence,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Inference: live verdict"
                );
                self.store_image(image, patient, &mut result);
                result
            }
            Err(e) if e.is_local() => {
                tracing::warn!(error = %e, "Inference: request not sent, using simulated verdict");
                deterministic_mock(seed, e.to_string())
            }
            Err(e) => {
                let state = self.circuit.record_failure();
                tracing::warn!(
                    error = %e,
                    consecutive_failures = state.consecutive_failures,
                    simulation_forced = state.simulation_forced,
                    "Inference: service call failed, using simulated verdict"
                );
                deterministic_mock(seed, e.to_string())
            }
        }
    }

    fn call_service(
        &self,
        image: &UploadedFile,
        patient: &PatientContext,
    ) -> Result<ClinicalResult, InferenceError> {
        let body = self.transport.predict(&PredictRequest { image, patient })?;
        let result = try_normalize(&RawInferenceOutput::from_body(&body))?;
        Ok(result)
    }

    /// Best effort: a failed upload only loses the image link.
    fn store_image(&self, image: &UploadedFile, patient: &PatientContext, result: &mut ClinicalResult) {
        let Some(store) = &self.image_store else {
            return;
        };

        let key = patient
            .reference_number
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let public_id = format!("xray-{key}");

        match store.upload(image, &public_id) {
            Ok(stored) => {
                result.image_url = Some(stored.url);
                result.image_public_id = Some(stored.public_id);
            }
            Err(e) => {
                tracing::warn!(error = %e, public_id = %public_id, "Inference: image upload failed");
            }
        }
    }
}
