//! Raw extractions: candidate requirement statements pulled from a document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw candidate requirement statement, before structuring.
///
/// Immutable once created. Many extractions belong to one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub id: Uuid,

    /// Owning document
    pub document_id: Uuid,

    /// Text exactly as the extractor returned it
    pub raw_text: String,

    /// Trimmed text
    pub text: String,

    pub page_number: Option<u32>,

    /// Where in the document this came from (e.g. `Chunk 2`)
    pub section: Option<String>,

    /// Identifier the document itself uses for this criterion (e.g. `4.2.1`)
    pub criteria_id: Option<String>,

    /// Extractor confidence, always within [0, 1]
    pub confidence: f32,

    pub created_at: DateTime<Utc>,
}

impl Extraction {
    /// Create an extraction with full confidence and no locator.
    pub fn new(document_id: Uuid, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        Self {
            id: Uuid::now_v7(),
            document_id,
            text: raw_text.trim().to_string(),
            raw_text,
            page_number: None,
            section: None,
            criteria_id: None,
            confidence: 1.0,
            created_at: Utc::now(),
        }
    }

    /// Set the confidence, clamped to [0, 1]. NaN becomes 0.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page_number = Some(page);
        self
    }

    /// Attach the document-internal identifier, ignoring blanks.
    pub fn with_criteria_id(mut self, criteria_id: Option<String>) -> Self {
        self.criteria_id = criteria_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_trimmed_raw_kept() {
        let e = Extraction::new(Uuid::now_v7(), "  The system must log.  ");
        assert_eq!(e.raw_text, "  The system must log.  ");
        assert_eq!(e.text, "The system must log.");
    }

    #[test]
    fn test_confidence_clamped() {
        let doc = Uuid::now_v7();
        assert_eq!(Extraction::new(doc, "x").with_confidence(1.7).confidence, 1.0);
        assert_eq!(Extraction::new(doc, "x").with_confidence(-0.2).confidence, 0.0);
        assert_eq!(Extraction::new(doc, "x").with_confidence(f32::NAN).confidence, 0.0);
        assert_eq!(Extraction::new(doc, "x").with_confidence(0.6).confidence, 0.6);
    }

    #[test]
    fn test_blank_criteria_id_dropped() {
        let doc = Uuid::now_v7();
        let e = Extraction::new(doc, "x").with_criteria_id(Some("  ".into()));
        assert!(e.criteria_id.is_none());

        let e = Extraction::new(doc, "x").with_criteria_id(Some(" 4.2.1 ".into()));
        assert_eq!(e.criteria_id.as_deref(), Some("4.2.1"));
    }
}
