//! Free-text stage: `Prediction:` / `Confidence:` lines printed by inference scripts.

use std::sync::LazyLock;

use regex::Regex;

use super::derive::{to_percent, ParsedVerdict};
use crate::models::Diagnosis;

static PREDICTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Prediction:\s*(Normal|Pneumonia)").unwrap());
static CONFIDENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Confidence:\s*([\d.]+)").unwrap());
static NORMAL_PROB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNormal:\s*([\d.]+)").unwrap());
static PNEUMONIA_PROB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPneumonia:\s*([\d.]+)").unwrap());

/// Markers inference scripts print when they could not run at all.
const SCRIPT_FAILURE_MARKERS: &[&str] = &["Error loading image", "Error loading model"];

/// The failure marker present in `text`, if any.
pub fn script_failure(text: &str) -> Option<&'static str> {
    SCRIPT_FAILURE_MARKERS
        .iter()
        .copied()
        .find(|marker| text.contains(marker))
}

/// Extract a verdict from `Key: value` lines. `None` when either the
/// prediction or a parseable confidence is missing.
pub fn parse_lines(text: &str) -> Option<ParsedVerdict> {
    let diagnosis = capture(&PREDICTION, text)?;
    let confidence: f64 = capture(&CONFIDENCE, text)?.parse().ok()?;

    Some(ParsedVerdict {
        diagnosis: Diagnosis::parse(diagnosis),
        confidence: to_percent(confidence),
        normal: probability(&NORMAL_PROB, text),
        pneumonia: probability(&PNEUMONIA_PROB, text),
    })
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// A matched but unparseable probability reads as zero.
fn probability(re: &Regex, text: &str) -> Option<f64> {
    capture(re, text).map(|raw| raw.parse().unwrap_or(0.0))
}
