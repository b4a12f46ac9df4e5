use super::scan::scan_pdf;
use super::types::{ClassifierPolicy, ContentVerdict, PdfEvidence};
use super::ClassifierError;
use crate::models::is_pdf_media_type;

const STRONG_TEXT_CONFIDENCE: f32 = 0.98;
const STRONG_IMAGE_CONFIDENCE: f32 = 0.95;
const MODERATE_TEXT_CONFIDENCE: f32 = 0.85;
const MILD_TEXT_CONFIDENCE: f32 = 0.75;
const SPARSE_TEXT_IMAGE_CONFIDENCE: f32 = 0.85;
const MARKER_IMAGE_CONFIDENCE: f32 = 0.80;
const SMALL_FILE_CONFIDENCE: f32 = 0.70;
const UNCERTAIN_CONFIDENCE: f32 = 0.65;
const ANALYSIS_FAILED_CONFIDENCE: f32 = 0.5;

/// Decides whether an upload is worth sending to the inference service.
///
/// Only PDFs are inspected; every other media type is assumed to be an image.
/// Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct ContentClassifier {
    policy: ClassifierPolicy,
}

impl ContentClassifier {
    pub fn new(policy: ClassifierPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    pub fn classify(&self, buffer: &[u8], media_type: &str) -> ContentVerdict {
        if !is_pdf_media_type(media_type) {
            return ContentVerdict {
                is_text_only: false,
                has_images: true,
                has_text: false,
                evidence_summary: format!("Media type {media_type} is not inspected"),
                confidence: 1.0,
                reason: "Image upload, eligible for analysis.".into(),
            };
        }

        match self.analyze_pdf(buffer) {
            Ok(verdict) => {
                tracing::info!(
                    text_only = verdict.is_text_only,
                    confidence = verdict.confidence,
                    evidence = %verdict.evidence_summary,
                    "Content classifier: PDF verdict"
                );
                verdict
            }
            Err(e) => {
                // Permissive on our own failure: a parsing gap must not discard a valid upload
                tracing::warn!(error = %e, "Content classifier: analysis failed, allowing upload");
                ContentVerdict {
                    is_text_only: false,
                    has_images: true,
                    has_text: false,
                    evidence_summary: "Analysis failed".into(),
                    confidence: ANALYSIS_FAILED_CONFIDENCE,
                    reason: format!(
                        "Could not analyze PDF content ({e}). Proceeding with analysis for safety."
                    ),
                }
            }
        }
    }

    fn analyze_pdf(&self, buffer: &[u8]) -> Result<ContentVerdict, ClassifierError> {
        if buffer.is_empty() {
            return Err(ClassifierError::EmptyBuffer);
        }

        let evidence = scan_pdf(buffer, &self.policy);
        tracing::debug!(
            size_kb = evidence.size_kb,
            image_stream = evidence.has_image_stream,
            high_binary = evidence.has_high_binary,
            image_xobject = evidence.has_image_xobject,
            text_length = evidence.text_length,
            word_count = evidence.word_count,
            "Content classifier: PDF evidence"
        );

        Ok(decide(&evidence, &self.policy))
    }
}

/// Classify with the default policy.
pub fn classify(buffer: &[u8], media_type: &str) -> ContentVerdict {
    ContentClassifier::default().classify(buffer, media_type)
}

/// Ordered cascade, first match wins. Later rules rest on weaker evidence.
fn decide(e: &PdfEvidence, p: &ClassifierPolicy) -> ContentVerdict {
    let kb = e.size_kb;

    if e.text_length > p.strong_text_min_length && !e.has_image_markers() && kb < p.strong_text_max_kb {
        return ContentVerdict::text_only(
            STRONG_TEXT_CONFIDENCE,
            format!(
                "Text-only PDF ({kb:.0}KB, {} words, no image markers). This is a text document, not a chest X-ray.",
                e.word_count
            ),
            e,
        );
    }

    if kb > p.strong_image_min_kb && (e.has_image_markers() || e.has_high_binary) {
        return ContentVerdict::with_images(
            STRONG_IMAGE_CONFIDENCE,
            "Large PDF with embedded images or binary content, likely a scanned X-ray.",
            e,
        );
    }

    if e.text_length > p.moderate_text_min_length && e.word_count > p.moderate_text_min_words {
        return ContentVerdict::text_only(
            MODERATE_TEXT_CONFIDENCE,
            format!(
                "PDF is mostly text ({} bytes extracted) with no clear imaging content.",
                e.text_length
            ),
            e,
        );
    }

    if kb < p.mild_text_max_kb && e.text_length > p.mild_text_min_length && !e.has_image_stream {
        return ContentVerdict::text_only(
            MILD_TEXT_CONFIDENCE,
            format!("Small PDF ({kb:.0}KB) with moderate text and no image streams."),
            e,
        );
    }

    if e.text_length < p.sparse_text_max_length && kb > p.sparse_text_min_kb {
        return ContentVerdict::with_images(
            SPARSE_TEXT_IMAGE_CONFIDENCE,
            "Large PDF with almost no extractable text, likely image-based.",
            e,
        );
    }

    if e.has_image_xobject || (e.has_image_stream && kb > p.marker_image_min_kb) {
        return ContentVerdict::with_images(
            MARKER_IMAGE_CONFIDENCE,
            "Image markers found in PDF.",
            e,
        );
    }

    if kb < p.small_file_max_kb {
        return ContentVerdict::text_only(
            SMALL_FILE_CONFIDENCE,
            format!("Small PDF ({kb:.0}KB) most likely holds text, not imaging."),
            e,
        );
    }

    ContentVerdict::text_only(
        UNCERTAIN_CONFIDENCE,
        "PDF content uncertain, rejecting for safety: treated as a non-medical document.",
        e,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &str = "application/pdf";

    /// Plain report text wrapped in text operators, no image markers.
    fn text_pdf(words: usize) -> Vec<u8> {
        let mut buf = b"%PDF-1.4\n".to_vec();
        for i in 0..words {
            if i % 12 == 0 {
                buf.extend_from_slice(b"\nBT /F1 11 Tf (");
            }
            buf.extend_from_slice(b"consolidation ");
            if i % 12 == 11 {
                buf.extend_from_slice(b") Tj ET");
            }
        }
        buf.extend_from_slice(b"\n%%EOF\n");
        buf
    }

    /// Bytes that are neither printable nor control characters.
    fn opaque(len: usize) -> Vec<u8> {
        (0..len).map(|i| 0x80 + (i % 0x7F) as u8).collect()
    }

    fn pdf_with(marker: &[u8], body_len: usize) -> Vec<u8> {
        let mut buf = b"%PDF-1.4\n".to_vec();
        buf.extend_from_slice(marker);
        buf.extend(opaque(body_len));
        buf
    }

    #[test]
    fn non_pdf_is_always_eligible() {
        for media in ["image/jpeg", "image/png", "text/plain", ""] {
            let verdict = classify(b"anything at all", media);
            assert!(verdict.has_images, "{media}");
            assert!(!verdict.is_text_only, "{media}");
        }
    }

    #[test]
    fn plain_report_pdf_is_text_only() {
        let buf = text_pdf(3000);
        let kb = buf.len() as f64 / 1024.0;
        assert!(kb > 30.0 && kb < 60.0, "fixture is {kb:.0}KB");

        let verdict = classify(&buf, PDF);
        assert!(verdict.is_text_only);
        assert!(!verdict.has_images);
        assert!(verdict.has_text);
        assert!(verdict.confidence >= 0.95);
        assert!(!verdict.is_eligible());
    }

    #[test]
    fn large_pdf_with_image_xobject_has_images() {
        let mut buf = b"%PDF-1.4\n4 0 obj << /Resources << /XObject << /Im1 7 0 R >> >> >>\n".to_vec();
        buf.extend((0..1_200_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8));
        let verdict = classify(&buf, PDF);
        assert!(verdict.has_images);
        assert!(!verdict.is_text_only);
        assert!((verdict.confidence - STRONG_IMAGE_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn text_heavy_pdf_with_compressed_streams_is_text_only() {
        // Markers block the strong rule; the volume of text still wins
        let mut buf = text_pdf(800);
        buf.extend_from_slice(b"\n<< /Filter /FlateDecode >>\n");
        let verdict = classify(&buf, PDF);
        assert!(verdict.is_text_only);
        assert!((verdict.confidence - MODERATE_TEXT_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn small_pdf_with_some_text_is_text_only() {
        let mut buf = b"%PDF-1.4\n".to_vec();
        buf.extend(std::iter::repeat(b'x').take(700));
        let verdict = classify(&buf, PDF);
        assert!(verdict.is_text_only);
        assert!((verdict.confidence - MILD_TEXT_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn large_pdf_without_text_has_images() {
        let verdict = classify(&pdf_with(b"", 400 * 1024), PDF);
        assert!(verdict.has_images);
        assert!((verdict.confidence - SPARSE_TEXT_IMAGE_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn image_xobject_marker_in_small_pdf_has_images() {
        let verdict = classify(&pdf_with(b"/XObject << /Im0 5 0 R >>\n", 100 * 1024), PDF);
        assert!(verdict.has_images);
        assert!((verdict.confidence - MARKER_IMAGE_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn tiny_pdf_defaults_to_text_only() {
        let verdict = classify(&pdf_with(b"", 10 * 1024), PDF);
        assert!(verdict.is_text_only);
        assert!((verdict.confidence - SMALL_FILE_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn uncertain_pdf_is_rejected_for_safety() {
        let verdict = classify(&pdf_with(b"/FlateDecode\n", 200 * 1024), PDF);
        assert!(verdict.is_text_only);
        assert!((verdict.confidence - UNCERTAIN_CONFIDENCE).abs() < f32::EPSILON);
        assert!(verdict.reason.contains("uncertain"));
    }

    #[test]
    fn unreadable_pdf_is_allowed_through() {
        let verdict = classify(b"", PDF);
        assert!(verdict.has_images);
        assert!(!verdict.is_text_only);
        assert!((verdict.confidence - ANALYSIS_FAILED_CONFIDENCE).abs() < f32::EPSILON);
        assert!(verdict.reason.contains("Proceeding"));
    }

    #[test]
    fn flags_are_never_both_set() {
        let fixtures = [
            text_pdf(50),
            text_pdf(3000),
            pdf_with(b"", 10),
            pdf_with(b"/Image", 350 * 1024),
            pdf_with(b"/XObject /Im3", 1100 * 1024),
            Vec::new(),
        ];
        for buf in &fixtures {
            let verdict = classify(buf, PDF);
            assert!(!(verdict.is_text_only && verdict.has_images));
            assert!((0.0..=1.0).contains(&verdict.confidence));
        }
    }

    #[test]
    fn custom_policy_moves_thresholds() {
        let policy = ClassifierPolicy {
            small_file_max_kb: 1.0,
            ..ClassifierPolicy::default()
        };
        let buf = pdf_with(b"", 10 * 1024);
        let default_verdict = classify(&buf, PDF);
        let strict = ContentClassifier::new(policy).classify(&buf, PDF);
        assert!(default_verdict.is_text_only);
        assert!((strict.confidence - UNCERTAIN_CONFIDENCE).abs() < f32::EPSILON);
    }
}
