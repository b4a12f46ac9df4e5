//! Simulated verdicts, always flagged `is_mock` with the reason attached.

use rand::Rng;

use super::derive::{build_result, ParsedVerdict};
use crate::models::{ClinicalResult, Diagnosis};

/// Build a flagged mock verdict for a known diagnosis and confidence.
///
/// Probabilities are complementary, and pneumonia fields are derived
/// exactly as for a real verdict.
pub fn mock_result(is_positive: bool, confidence: u8, reason: impl Into<String>) -> ClinicalResult {
    let confidence = confidence.min(100);
    // Fractions, so a 1% share is not read as a whole
    let own = f64::from(confidence) / 100.0;
    let complement = f64::from(100 - confidence) / 100.0;

    let (diagnosis, normal, pneumonia) = if is_positive {
        (Diagnosis::Pneumonia, complement, own)
    } else {
        (Diagnosis::Normal, own, complement)
    };

    let mut result = build_result(ParsedVerdict {
        diagnosis,
        confidence,
        normal: Some(normal),
        pneumonia: Some(pneumonia),
    });
    result.is_mock = true;
    result.source_error = Some(reason.into());
    result
}

/// Unseeded fallback: even odds of either diagnosis, confidence drawn from 50..95 (upper bound excluded).
pub fn random_mock<R: Rng + ?Sized>(rng: &mut R, reason: impl Into<String>) -> ClinicalResult {
    let is_positive = rng.gen_bool(0.5);
    let confidence: u8 = rng.gen_range(50..95);
    mock_result(is_positive, confidence, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mock_pneumonia_is_fully_derived() {
        let r = mock_result(true, 92, "service down");
        assert!(r.is_mock);
        assert_eq!(r.diagnosis, Diagnosis::Pneumonia);
        assert_eq!(r.severity, Some(Severity::Severe));
        assert!(r.pneumonia_type.is_some());
        let p = r.probabilities.unwrap();
        assert_eq!((p.normal, p.pneumonia), (8, 92));
        assert_eq!(r.source_error.as_deref(), Some("service down"));
    }

    #[test]
    fn mock_normal_has_no_pneumonia_fields() {
        let r = mock_result(false, 70, "unparseable");
        assert_eq!(r.diagnosis, Diagnosis::Normal);
        assert!(r.severity.is_none());
        assert_eq!(r.probabilities.unwrap().normal, 70);
    }

    #[test]
    fn random_mock_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_positive = false;
        let mut seen_negative = false;
        for _ in 0..200 {
            let r = random_mock(&mut rng, "unparseable");
            assert!(r.is_mock);
            assert!((50..95).contains(&r.confidence), "{}", r.confidence);
            assert_eq!(r.diagnosis.is_pneumonia(), r.severity.is_some());
            seen_positive |= r.diagnosis.is_pneumonia();
            seen_negative |= !r.diagnosis.is_pneumonia();
        }
        assert!(seen_positive && seen_negative);
    }
}
