//! Byte-level PDF scanning: image markers and approximate text content.
//!
//! Works on the raw buffer without a PDF parser. Every scan is bounded by a
//! window from [`ClassifierPolicy`] so large uploads cost the same as small ones.

use std::sync::LazyLock;

use regex::bytes::Regex as BytesRegex;
use regex::Regex;

use super::types::{ClassifierPolicy, PdfEvidence};

/// Embedded image, file or compressed stream markers, or a stream whose
/// first bytes are binary.
static IMAGE_STREAM: LazyLock<BytesRegex> = LazyLock::new(|| {
    BytesRegex::new(
        r"(?s-u)/XObject|/Image|/EmbeddedFile|/JPEG|/FlateDecode|stream.{1,10}[\x00-\x08\x0B\x0C\x0E-\x1F]",
    )
    .unwrap()
});

static IMAGE_XOBJECT: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"(?-u)/XObject[^\r\n]*?/Im").unwrap());

/// PDF text objects: `BT` (begin text) through the nearest `ET`.
static TEXT_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)BT.*?ET").unwrap());

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Gather every signal the decision cascade needs.
pub fn scan_pdf(buffer: &[u8], policy: &ClassifierPolicy) -> PdfEvidence {
    let marker_window = &buffer[..buffer.len().min(policy.marker_window_bytes)];
    let sniff = &marker_window[..marker_window.len().min(policy.binary_sniff_bytes)];

    let text = extract_text(buffer, policy.text_window_bytes);

    PdfEvidence {
        size_kb: buffer.len() as f64 / 1024.0,
        has_image_stream: IMAGE_STREAM.is_match(marker_window),
        has_high_binary: sniff.iter().copied().any(is_binary_control),
        has_image_xobject: IMAGE_XOBJECT.is_match(marker_window),
        text_length: text.len(),
        word_count: text.split_whitespace().count(),
    }
}

/// Approximate the document text from the first `window` bytes.
///
/// Keeps printable ASCII plus CR/LF, then puts the contents of all `BT…ET`
/// text objects in front so text operators weigh in twice, strips NULs and
/// collapses runs of blank lines.
pub fn extract_text(buffer: &[u8], window: usize) -> String {
    let printable: String = buffer[..buffer.len().min(window)]
        .iter()
        .copied()
        .filter(|&b| (0x20..=0x7E).contains(&b) || b == b'\n' || b == b'\r')
        .map(char::from)
        .collect();

    let text_objects: Vec<&str> = TEXT_OBJECT
        .find_iter(&printable)
        .map(|m| m.as_str())
        .collect();

    let combined = if text_objects.is_empty() {
        printable
    } else {
        format!("{}\n{}", text_objects.join("\n"), printable)
    };

    let without_nul = combined.replace('\0', "");
    BLANK_RUNS
        .replace_all(&without_nul, "\n\n")
        .trim()
        .to_string()
}

/// Control bytes other than TAB, LF and CR.
fn is_binary_control(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F)
}
