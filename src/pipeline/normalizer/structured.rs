//! Structured stage: a JSON verdict, either a document or an object embedded in text.

use serde_json::Value;

use super::derive::{to_percent, ParsedVerdict};
use super::NormalizeError;
use crate::models::Diagnosis;

/// Locate the outermost `{...}` span in free text.
///
/// Returns `None` when the text holds no object at all, which lets the
/// caller move on to the next stage.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the embedded object, if any. `Ok(None)` means "no object here".
pub fn parse_embedded(text: &str) -> Result<Option<ParsedVerdict>, NormalizeError> {
    let Some(json_str) = find_json_object(text) else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| NormalizeError::MalformedJson(e.to_string()))?;
    parse_value(&value).map(Some)
}

/// Read `diagnosis`, `confidence` and optional `probabilities` from a JSON verdict.
pub fn parse_value(value: &Value) -> Result<ParsedVerdict, NormalizeError> {
    let object = value
        .as_object()
        .ok_or_else(|| NormalizeError::MalformedJson("verdict is not a JSON object".into()))?;

    let diagnosis = object
        .get("diagnosis")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or(NormalizeError::MissingField("diagnosis"))?;

    let confidence = match object.get("confidence") {
        None | Some(Value::Null) => return Err(NormalizeError::MissingField("confidence")),
        Some(raw) => number(raw).ok_or_else(|| NormalizeError::InvalidField {
            field: "confidence",
            value: raw.to_string(),
        })?,
    };

    let probabilities = object.get("probabilities").and_then(Value::as_object);
    let member = |name: &str| probabilities.and_then(|p| p.get(name)).and_then(number);

    Ok(ParsedVerdict {
        diagnosis: Diagnosis::parse(diagnosis),
        confidence: to_percent(confidence),
        normal: member("normal"),
        pneumonia: member("pneumonia"),
    })
}

/// A JSON number, or a string holding one.
fn number(value: &Value) -> Option<f64> {
    let parsed: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
