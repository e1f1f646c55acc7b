//! Document classification and the extraction gate.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::pipeline::bounded;
use crate::traits::ai::AI;
use crate::types::{
    config::PipelineConfig,
    document::{DocumentClassification, DocumentType},
};

/// Classifies a document from its first pages.
pub struct Classifier {
    ai: Option<Arc<dyn AI>>,
    config: PipelineConfig,
}

impl Classifier {
    pub fn new(ai: Option<Arc<dyn AI>>, config: PipelineConfig) -> Self {
        Self { ai, config }
    }

    /// Classify `text` using its first `classification_prefix` characters.
    ///
    /// Without an AI backend this returns
    /// [`DocumentClassification::unavailable`]; AI failures propagate.
    pub async fn classify(&self, text: &str) -> Result<DocumentClassification> {
        let Some(ai) = &self.ai else {
            warn!("Classification AI not configured");
            return Ok(DocumentClassification::unavailable());
        };

        let prefix: String = text.chars().take(self.config.classification_prefix).collect();
        let response = bounded(
            "document classification",
            self.config.timeouts.llm,
            ai.classify_document(&prefix),
        )
        .await?;

        let document_type = DocumentType::from_label(&response.document_type);
        if document_type == DocumentType::Other {
            warn!(label = %response.document_type, "Unrecognized document type label");
        }

        let confidence = if response.confidence.is_nan() {
            0.0
        } else {
            response.confidence.clamp(0.0, 1.0)
        };

        let classification = DocumentClassification {
            document_type,
            confidence,
            contains_criteria: response.contains_criteria,
            reasoning: response.reasoning,
        };
        info!(
            document_type = %classification.document_type.as_str(),
            confidence = classification.confidence,
            contains_criteria = classification.contains_criteria,
            "Document classified"
        );
        Ok(classification)
    }
}
