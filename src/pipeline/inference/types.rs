use serde::{Deserialize, Serialize};

use super::InferenceError;
use crate::models::{PatientContext, UploadedFile};

/// One `/predict/` call: the image plus patient fields sent alongside it.
#[derive(Debug, Clone, Copy)]
pub struct PredictRequest<'a> {
    pub image: &'a UploadedFile,
    pub patient: &'a PatientContext,
}

/// Remote inference service abstraction (allows mocking).
///
/// Returns the raw response body of a 2xx reply; any other status is an
/// `InferenceError::ServiceError`.
pub trait InferenceTransport {
    fn predict(&self, request: &PredictRequest<'_>) -> Result<String, InferenceError>;
}

/// Per-request switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferOptions {
    /// Always answer with a simulated verdict; circuit state is untouched.
    pub use_mock: bool,
    /// Enter simulation mode (persisted) before answering.
    pub force_simulation: bool,
}
