//! Inference orchestration: remote `/predict/` calls behind a
//! consecutive-failure circuit breaker, with deterministic simulated
//! verdicts whenever the service cannot answer.

pub mod circuit;
pub mod client;
pub mod mock;
pub mod orchestrator;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_http;

pub use circuit::*;
pub use client::*;
pub use mock::*;
pub use orchestrator::*;
pub use storage::*;
pub use types::*;

use std::path::PathBuf;

use crate::pipeline::normalizer::NormalizeError;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Inference service unreachable at {0}")]
    Connection(String),

    #[error("Inference request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Inference service returned {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("Invalid inference request: {0}")]
    InvalidRequest(String),

    #[error("Unusable inference response: {0}")]
    MalformedResponse(#[from] NormalizeError),
}

impl InferenceError {
    /// Failed before anything was sent; says nothing about service health.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlagStoreError {
    #[error("Simulation flag at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Simulation flag store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Image storage is not configured")]
    NotConfigured,

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Image storage rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}
