//! Pattern-based extraction used when the LLM path is unavailable or fails.
//!
//! Keeps every line that carries an obligation marker in German or English,
//! matched case-insensitively as a whole word.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::info;
use uuid::Uuid;

use crate::error::{CriteriaError, Result};
use crate::types::extraction::Extraction;

/// Confidence assigned to every fallback extraction.
pub const FALLBACK_CONFIDENCE: f32 = 0.6;

/// Section locator of fallback extractions.
pub const FALLBACK_SECTION: &str = "Fallback extraction";

/// Lines shorter than this (in characters, after trimming) are skipped.
pub const MIN_LINE_LEN: usize = 15;

pub const GERMAN_MARKERS: &[&str] = &[
    "muss",
    "soll",
    "sollte",
    "Anforderung",
    "Spezifikation",
    "Kriterium",
    "Voraussetzung",
    "erforderlich",
    "obligatorisch",
    "zwingend",
];

pub const ENGLISH_MARKERS: &[&str] = &[
    "must",
    "shall",
    "should",
    "requirement",
    "required",
    "mandatory",
    "specification",
    "criteria",
    "criterion",
    "standard",
    "compliance",
    "minimum",
    "maximum",
    "threshold",
];

static MARKERS: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    let alternation = GERMAN_MARKERS
        .iter()
        .chain(ENGLISH_MARKERS)
        .map(|m| regex::escape(m))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .build()
});

/// Whether a line contains an obligation marker.
pub fn has_obligation_marker(line: &str) -> Result<bool> {
    let markers = MARKERS
        .as_ref()
        .map_err(|e| CriteriaError::ExtractionFailed(format!("obligation markers unusable: {e}")))?;
    Ok(markers.is_match(line))
}

/// Scan `text` line by line and keep obligation lines, up to `max_criteria`.
pub fn fallback_extract(
    document_id: Uuid,
    text: &str,
    max_criteria: usize,
) -> Result<Vec<Extraction>> {
    let mut extractions = Vec::new();

    for line in text.lines().map(str::trim) {
        if extractions.len() >= max_criteria {
            break;
        }
        if line.chars().count() < MIN_LINE_LEN || !has_obligation_marker(line)? {
            continue;
        }
        extractions.push(
            Extraction::new(document_id, line)
                .with_confidence(FALLBACK_CONFIDENCE)
                .with_section(FALLBACK_SECTION),
        );
    }

    info!(
        document_id = %document_id,
        found = extractions.len(),
        "Fallback extraction finished"
    );
    Ok(extractions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_line_extracted() {
        let doc = Uuid::now_v7();
        let text = "Introduction\n\nThe system must support 99.9% uptime.\nThanks.";
        let extractions = fallback_extract(doc, text, 1000).unwrap();

        assert_eq!(extractions.len(), 1);
        let e = &extractions[0];
        assert_eq!(e.raw_text, "The system must support 99.9% uptime.");
        assert_eq!(e.confidence, 0.6);
        assert_eq!(e.section.as_deref(), Some("Fallback extraction"));
        assert_eq!(e.document_id, doc);
    }

    #[test]
    fn test_whole_word_only() {
        // "mustard" and "standardized" must not match "must" / "standard"
        assert!(!has_obligation_marker("Pass the mustard to the left please").unwrap());
        assert!(!has_obligation_marker("Fully standardized packaging is fine").unwrap());
        assert!(has_obligation_marker("Bidders MUST register before the deadline").unwrap());
    }

    #[test]
    fn test_german_markers() {
        let text = "Der Anbieter muss ein ISO-Zertifikat vorlegen.\nDas Angebot ist zwingend einzureichen.";
        let extractions = fallback_extract(Uuid::now_v7(), text, 10).unwrap();
        assert_eq!(extractions.len(), 2);
    }

    #[test]
    fn test_short_lines_skipped() {
        // 14 characters
        let extractions = fallback_extract(Uuid::now_v7(), "You must pay!!", 10).unwrap();
        assert!(extractions.is_empty());
    }

    #[test]
    fn test_stops_at_max() {
        let text = "Vendors shall provide item one.\n".repeat(20);
        assert_eq!(fallback_extract(Uuid::now_v7(), &text, 5).unwrap().len(), 5);
        assert!(fallback_extract(Uuid::now_v7(), &text, 0).unwrap().is_empty());
    }
}
