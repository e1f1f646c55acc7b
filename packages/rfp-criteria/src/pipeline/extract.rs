//! Extraction engine: chunks → AI extraction, with whole-document fallback.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::{bounded, chunk::split_semantic, fallback::fallback_extract};
use crate::traits::ai::AI;
use crate::types::{config::PipelineConfig, extraction::Extraction};

/// Turns document text into raw extractions.
///
/// With an AI backend, chunks are sent one at a time in source order. If
/// any chunk fails or times out, the whole document goes through the
/// pattern-based fallback instead, so results are never a mix of the two.
pub struct ExtractionEngine {
    ai: Option<Arc<dyn AI>>,
    config: PipelineConfig,
}

impl ExtractionEngine {
    pub fn new(ai: Option<Arc<dyn AI>>, config: PipelineConfig) -> Self {
        Self { ai, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether the AI path is configured.
    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Extract up to `max_criteria` (default from config) extractions.
    ///
    /// Only fails when the fallback itself cannot run.
    pub async fn extract(
        &self,
        document_id: Uuid,
        text: &str,
        max_criteria: Option<usize>,
    ) -> Result<Vec<Extraction>> {
        let max_criteria = max_criteria.unwrap_or(self.config.max_criteria);

        let Some(ai) = &self.ai else {
            warn!(document_id = %document_id, "Criteria extraction AI not configured, using fallback");
            return fallback_extract(document_id, text, max_criteria);
        };

        match self
            .extract_with_ai(ai.as_ref(), document_id, text, max_criteria)
            .await
        {
            Ok(extractions) => Ok(extractions),
            Err(e) => {
                warn!(
                    document_id = %document_id,
                    error = %e,
                    "AI extraction failed, using fallback for the whole document"
                );
                fallback_extract(document_id, text, max_criteria)
            }
        }
    }

    async fn extract_with_ai(
        &self,
        ai: &dyn AI,
        document_id: Uuid,
        text: &str,
        max_criteria: usize,
    ) -> Result<Vec<Extraction>> {
        let chunks = split_semantic(text, self.config.chunk_size);
        let total = chunks.len();
        info!(
            document_id = %document_id,
            chars = text.chars().count(),
            chunks = total,
            "Extracting criteria"
        );

        let mut extractions = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let chunk_number = index + 1;
            let result = bounded(
                "criteria extraction",
                self.config.timeouts.llm,
                ai.extract_criteria(chunk, chunk_number, total),
            )
            .await?;

            let section = format!("Chunk {chunk_number}");
            let before = extractions.len();
            for statement in result.statements {
                if statement.text.trim().is_empty() {
                    continue;
                }
                extractions.push(
                    Extraction::new(document_id, statement.text)
                        .with_section(section.clone())
                        .with_confidence(result.confidence)
                        .with_criteria_id(statement.criteria_id),
                );
            }
            debug!(
                chunk = chunk_number,
                found = extractions.len() - before,
                "Chunk extracted"
            );

            if extractions.len() >= max_criteria {
                extractions.truncate(max_criteria);
                break;
            }
        }

        info!(
            document_id = %document_id,
            found = extractions.len(),
            "AI extraction finished"
        );
        Ok(extractions)
    }
}
