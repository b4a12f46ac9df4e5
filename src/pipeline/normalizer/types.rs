use serde_json::Value;

/// Inference output as it arrives, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInferenceOutput {
    /// A JSON document, e.g. the body of a `/predict/` response.
    Structured(Value),
    /// Log-style text that may embed a JSON object or `Key: value` lines.
    FreeText(String),
}

impl RawInferenceOutput {
    /// Classify a response body: a JSON object is structured, anything else is text.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(value @ Value::Object(_)) => Self::Structured(value),
            _ => Self::FreeText(body.to_string()),
        }
    }
}

impl From<Value> for RawInferenceOutput {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for RawInferenceOutput {
    fn from(text: String) -> Self {
        Self::FreeText(text)
    }
}

impl From<&str> for RawInferenceOutput {
    fn from(text: &str) -> Self {
        Self::FreeText(text.to_string())
    }
}
