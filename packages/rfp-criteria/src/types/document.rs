//! Document metadata and classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of procurement document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[serde(rename = "rfp")]
    RequestForProposal,
    TechnicalRequirements,
    ScopeOfWork,
    StatementOfWork,
    VendorRequirements,
    SystemRequirements,
    FunctionalRequirements,
    TechnicalSpecifications,
    ProcurementRequirements,
    BidRequirements,
    ProjectRequirements,
    RfpAddendum,
    Amendment,
    /// Set by upload handling for spreadsheets, never by the classifier
    Spreadsheet,
    Other,
}

impl DocumentType {
    /// The labels a classifier may answer with, in prompt order.
    pub const CLASSIFIABLE: [DocumentType; 13] = [
        Self::RequestForProposal,
        Self::TechnicalRequirements,
        Self::ScopeOfWork,
        Self::StatementOfWork,
        Self::VendorRequirements,
        Self::SystemRequirements,
        Self::FunctionalRequirements,
        Self::TechnicalSpecifications,
        Self::ProcurementRequirements,
        Self::BidRequirements,
        Self::ProjectRequirements,
        Self::RfpAddendum,
        Self::Amendment,
    ];

    /// Human label, as used in classification prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::RequestForProposal => "Request for Proposal",
            Self::TechnicalRequirements => "Technical Requirements",
            Self::ScopeOfWork => "Scope of Work",
            Self::StatementOfWork => "Statement of Work",
            Self::VendorRequirements => "Vendor Requirements",
            Self::SystemRequirements => "System Requirements",
            Self::FunctionalRequirements => "Functional Requirements",
            Self::TechnicalSpecifications => "Technical Specifications",
            Self::ProcurementRequirements => "Procurement Requirements",
            Self::BidRequirements => "Bid Requirements",
            Self::ProjectRequirements => "Project Requirements",
            Self::RfpAddendum => "RFP Addendum",
            Self::Amendment => "Amendment",
            Self::Spreadsheet => "Spreadsheet",
            Self::Other => "Other",
        }
    }

    /// Stored snake_case value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestForProposal => "rfp",
            Self::TechnicalRequirements => "technical_requirements",
            Self::ScopeOfWork => "scope_of_work",
            Self::StatementOfWork => "statement_of_work",
            Self::VendorRequirements => "vendor_requirements",
            Self::SystemRequirements => "system_requirements",
            Self::FunctionalRequirements => "functional_requirements",
            Self::TechnicalSpecifications => "technical_specifications",
            Self::ProcurementRequirements => "procurement_requirements",
            Self::BidRequirements => "bid_requirements",
            Self::ProjectRequirements => "project_requirements",
            Self::RfpAddendum => "rfp_addendum",
            Self::Amendment => "amendment",
            Self::Spreadsheet => "spreadsheet",
            Self::Other => "other",
        }
    }

    /// Map classifier output to a type.
    ///
    /// Accepts the human label or the snake_case value, case-insensitively.
    /// Anything else is `Other`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::CLASSIFIABLE
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(label) || t.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(Self::Other)
    }

    /// Types that carry requirements regardless of the contains-criteria flag.
    pub fn is_requirements_bearing(self) -> bool {
        matches!(
            self,
            Self::RequestForProposal
                | Self::TechnicalRequirements
                | Self::VendorRequirements
                | Self::SystemRequirements
                | Self::FunctionalRequirements
                | Self::TechnicalSpecifications
                | Self::ProcurementRequirements
                | Self::BidRequirements
                | Self::ProjectRequirements
        )
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Uploaded,
    Processing,
    Completed,
    Failed,
}

/// What the document source knows about a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: Uuid,
    pub filename: String,
    pub document_type: Option<DocumentType>,
    pub status: DocumentStatus,
    pub classification_confidence: Option<f32>,
    pub contains_criteria: bool,
}

impl DocumentMetadata {
    pub fn new(id: Uuid, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            document_type: None,
            status: DocumentStatus::default(),
            classification_confidence: None,
            contains_criteria: false,
        }
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    /// Record a classification result on this document.
    pub fn with_classification(mut self, classification: &DocumentClassification) -> Self {
        self.document_type = Some(classification.document_type);
        self.classification_confidence = Some(classification.confidence);
        self.contains_criteria = classification.contains_criteria;
        self
    }

    /// Extraction gate: requirements-bearing type, or flagged as containing criteria.
    pub fn is_extraction_eligible(&self) -> bool {
        self.contains_criteria
            || self
                .document_type
                .is_some_and(DocumentType::is_requirements_bearing)
    }
}

/// Classifier result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentClassification {
    pub document_type: DocumentType,
    /// Always within [0, 1]
    pub confidence: f32,
    pub contains_criteria: bool,
    pub reasoning: String,
}

impl DocumentClassification {
    /// Fixed result when no classifier is configured.
    pub fn unavailable() -> Self {
        Self {
            document_type: DocumentType::Other,
            confidence: 0.0,
            contains_criteria: false,
            reasoning: "LLM classification service not available".to_string(),
        }
    }

    pub fn is_extraction_eligible(&self) -> bool {
        self.contains_criteria || self.document_type.is_requirements_bearing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_accepts_labels_and_values() {
        assert_eq!(
            DocumentType::from_label("Request for Proposal"),
            DocumentType::RequestForProposal
        );
        assert_eq!(DocumentType::from_label("rfp"), DocumentType::RequestForProposal);
        assert_eq!(
            DocumentType::from_label("technical_specifications"),
            DocumentType::TechnicalSpecifications
        );
        assert_eq!(DocumentType::from_label(" rfp addendum "), DocumentType::RfpAddendum);
        assert_eq!(DocumentType::from_label("Invoice"), DocumentType::Other);
        // Never produced by the classifier
        assert_eq!(DocumentType::from_label("spreadsheet"), DocumentType::Other);
    }

    #[test]
    fn test_extraction_gate() {
        let mut c = DocumentClassification {
            document_type: DocumentType::ScopeOfWork,
            confidence: 0.9,
            contains_criteria: false,
            reasoning: String::new(),
        };
        assert!(!c.is_extraction_eligible());

        c.contains_criteria = true;
        assert!(c.is_extraction_eligible());

        c.contains_criteria = false;
        c.document_type = DocumentType::BidRequirements;
        assert!(c.is_extraction_eligible());

        assert!(!DocumentClassification::unavailable().is_extraction_eligible());
    }

    #[test]
    fn test_serde_values() {
        let json = serde_json::to_string(&DocumentType::RequestForProposal).unwrap();
        assert_eq!(json, "\"rfp\"");
        let json = serde_json::to_string(&DocumentType::RfpAddendum).unwrap();
        assert_eq!(json, "\"rfp_addendum\"");
    }
}
