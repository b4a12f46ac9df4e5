pub mod config;
pub mod models;
pub mod pipeline;

pub use pipeline::classifier::{classify, ContentClassifier, ContentVerdict};
pub use pipeline::inference::{InferOptions, InferenceOrchestrator};
pub use pipeline::intake::{IntakeOutcome, IntakePipeline, IntakeRequest};
pub use pipeline::normalizer::{normalize, RawInferenceOutput};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over the default filter.
/// Logs go to stderr so command output stays machine-readable.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
