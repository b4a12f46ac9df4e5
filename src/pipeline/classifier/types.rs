use serde::{Deserialize, Serialize};

/// Eligibility decision for one uploaded document.
///
/// Built only through [`ContentVerdict::text_only`] and
/// [`ContentVerdict::with_images`], so `is_text_only` and `has_images` are
/// never both true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVerdict {
    pub is_text_only: bool,
    pub has_images: bool,
    pub has_text: bool,
    pub evidence_summary: String,
    /// Heuristic estimate in 0.0..=1.0, not a calibrated probability.
    pub confidence: f32,
    pub reason: String,
}

impl ContentVerdict {
    pub fn text_only(confidence: f32, reason: impl Into<String>, evidence: &PdfEvidence) -> Self {
        Self {
            is_text_only: true,
            has_images: false,
            has_text: evidence.has_text(),
            evidence_summary: evidence.summary(),
            confidence,
            reason: reason.into(),
        }
    }

    pub fn with_images(confidence: f32, reason: impl Into<String>, evidence: &PdfEvidence) -> Self {
        Self {
            is_text_only: false,
            has_images: true,
            has_text: evidence.has_text(),
            evidence_summary: evidence.summary(),
            confidence,
            reason: reason.into(),
        }
    }

    /// Whether the upload may be sent to the inference service.
    pub fn is_eligible(&self) -> bool {
        !self.is_text_only
    }
}

/// Raw signals gathered from a PDF buffer before the decision cascade runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfEvidence {
    pub size_kb: f64,
    /// Any embedded-image or compressed-stream marker in the marker window.
    pub has_image_stream: bool,
    /// Control bytes inside the binary sniff window.
    pub has_high_binary: bool,
    /// `/XObject` followed on the same line by an `/Im` resource.
    pub has_image_xobject: bool,
    pub text_length: usize,
    pub word_count: usize,
}

impl PdfEvidence {
    pub fn has_text(&self) -> bool {
        self.text_length > 0
    }

    pub fn has_image_markers(&self) -> bool {
        self.has_image_stream || self.has_image_xobject
    }

    pub fn summary(&self) -> String {
        format!(
            "Size: {:.0}KB, Text: {}B, Words: {}, ImageStreams: {}, ImageXObject: {}",
            self.size_kb,
            self.text_length,
            self.word_count,
            self.has_image_stream,
            self.has_image_xobject
        )
    }
}

/// Thresholds for the PDF decision cascade.
///
/// Defaults are the empirically tuned production values. Sizes are in KB
/// (1024 bytes), text lengths in bytes of extracted printable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPolicy {
    /// Bytes scanned for image markers.
    pub marker_window_bytes: usize,
    /// Bytes scanned for extractable text.
    pub text_window_bytes: usize,
    /// Leading bytes sniffed for control characters.
    pub binary_sniff_bytes: usize,

    pub strong_text_min_length: usize,
    pub strong_text_max_kb: f64,
    pub strong_image_min_kb: f64,
    pub moderate_text_min_length: usize,
    pub moderate_text_min_words: usize,
    pub mild_text_max_kb: f64,
    pub mild_text_min_length: usize,
    pub sparse_text_max_length: usize,
    pub sparse_text_min_kb: f64,
    pub marker_image_min_kb: f64,
    pub small_file_max_kb: f64,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            marker_window_bytes: 100_000,
            text_window_bytes: 500_000,
            binary_sniff_bytes: 500,
            strong_text_min_length: 1000,
            strong_text_max_kb: 500.0,
            strong_image_min_kb: 1000.0,
            moderate_text_min_length: 2000,
            moderate_text_min_words: 100,
            mild_text_max_kb: 300.0,
            mild_text_min_length: 500,
            sparse_text_max_length: 200,
            sparse_text_min_kb: 300.0,
            marker_image_min_kb: 300.0,
            small_file_max_kb: 150.0,
        }
    }
}
