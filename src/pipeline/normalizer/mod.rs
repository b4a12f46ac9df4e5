//! Turns heterogeneous inference output into a canonical `ClinicalResult`.
//!
//! Accepts a JSON verdict, text embedding a JSON object, or `Key: value`
//! script output; confidences may be fractions or percentages. Payloads that
//! yield no usable diagnosis and confidence become a flagged mock verdict.

pub mod derive;
pub mod fallback;
pub mod freetext;
pub mod normalize;
pub mod structured;
pub mod types;

pub use derive::*;
pub use fallback::*;
pub use normalize::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Malformed JSON verdict: {0}")]
    MalformedJson(String),

    #[error("Verdict is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Verdict field `{field}` has unusable value {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Inference script reported: {0}")]
    ScriptFailure(String),

    #[error("No prediction and confidence found in output")]
    NoVerdict,
}
