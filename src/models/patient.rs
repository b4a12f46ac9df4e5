use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Patient metadata forwarded verbatim to the inference service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContext {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    /// Scan reference number; also seeds the deterministic mock verdict.
    pub reference_number: Option<String>,
}

impl PatientContext {
    pub fn with_reference(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }

    /// Non-empty `(field, value)` pairs in the order the service expects them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        [
            ("patient_name", &self.name),
            ("patient_age", &self.age),
            ("patient_gender", &self.gender),
            ("reference_number", &self.reference_number),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_string()))
        })
        .collect()
    }
}

/// Generate a scan reference number of the form `XR-YYMMDD-NNNN`.
pub fn generate_reference_number<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> String {
    format!(
        "XR-{:02}{:02}{:02}-{:04}",
        date.year().rem_euclid(100),
        date.month(),
        date.day(),
        rng.gen_range(0..10_000)
    )
}
