pub mod classifier; // Upload gating: text-only PDF detection
pub mod inference; // Remote /predict/ calls, circuit breaker, simulated verdicts
pub mod intake; // Route-level composition and persistability decision
pub mod normalizer; // Canonical clinical result from raw service output
