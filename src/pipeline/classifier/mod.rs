//! Content gate: decides whether an upload looks like an image worth sending
//! to the inference service, rejecting text-only PDFs up front.

pub mod classify;
pub mod scan;
pub mod types;

pub use classify::*;
pub use scan::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("PDF buffer is empty")]
    EmptyBuffer,
}
