//! Map-then-reduce document summarization.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{CriteriaError, Result};
use crate::pipeline::{bounded, chunk::split_semantic};
use crate::traits::ai::AI;
use crate::types::config::PipelineConfig;

/// Returned when no chunk could be summarized.
pub const NO_SUMMARY: &str = "Could not generate a summary.";

/// Returned when chunk summaries exist but could not be merged.
pub const CONSOLIDATION_FAILED_SUMMARY: &str = "Failed to consolidate summary.";

/// Summarizes documents chunk by chunk, then merges the chunk summaries.
pub struct Summarizer {
    ai: Option<Arc<dyn AI>>,
    config: PipelineConfig,
}

impl Summarizer {
    pub fn new(ai: Option<Arc<dyn AI>>, config: PipelineConfig) -> Self {
        Self { ai, config }
    }

    /// Summarize `text`.
    ///
    /// Failed chunks are skipped. Only a missing AI backend is an error.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let ai = self
            .ai
            .as_ref()
            .ok_or_else(|| CriteriaError::unavailable("summarization", "AI not configured"))?;

        let chunks = split_semantic(text, self.config.chunk_size);
        let limit = self.config.timeouts.llm;

        let mut summaries = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            match bounded("chunk summarization", limit, ai.summarize_chunk(chunk)).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!(chunk = index + 1, error = %e, "Chunk summarization failed, skipping"),
            }
        }
        debug!(
            chunks = chunks.len(),
            summarized = summaries.len(),
            "Chunk summaries ready"
        );

        match summaries.len() {
            0 => Ok(NO_SUMMARY.to_string()),
            1 => Ok(summaries.remove(0)),
            count => {
                match bounded("summary synthesis", limit, ai.synthesize_summaries(&summaries)).await {
                    Ok(summary) => {
                        info!(chunks = count, "Summary synthesized");
                        Ok(summary)
                    }
                    Err(e) => {
                        warn!(error = %e, "Summary synthesis failed");
                        Ok(CONSOLIDATION_FAILED_SUMMARY.to_string())
                    }
                }
            }
        }
    }
}
