//! Research-backed validation of criteria against a product.
//!
//! One validation is one research thread: the criterion, its product and a
//! summary of the source document go in as a single message, the agent's
//! conversation comes back out, and an LLM reduces it to a verdict that is
//! written onto the criterion.

pub mod agents;
pub mod conversation;

pub use agents::AgentRegistry;
pub use conversation::{
    AssistantOnly, ConversationExtractor, ConversationStrategy, RoleTranscript, ShapeTolerant,
    NO_RESPONSE_CONTENT,
};

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{CriteriaError, Result};
use crate::lifecycle::CriteriaManager;
use crate::pipeline::{bounded, prompts::format_validation_message, summarize::Summarizer};
use crate::traits::{
    ai::AI, document::DocumentSource, research::ResearchBackend, store::CriteriaStore,
};
use crate::types::{
    config::{AgentConfig, PipelineConfig, Timeouts},
    criterion::Criterion,
    validation::{ResearchMode, ValidationReference, ValidationVerdict},
};

/// Drives validation conversations and records their verdicts.
pub struct ValidationOrchestrator {
    ai: Option<Arc<dyn AI>>,
    agents: Option<AgentRegistry>,
    summarizer: Summarizer,
    conversation: ConversationExtractor,
    timeouts: Timeouts,
}

impl ValidationOrchestrator {
    pub fn new(ai: Option<Arc<dyn AI>>, config: PipelineConfig) -> Self {
        Self {
            summarizer: Summarizer::new(ai.clone(), config.clone()),
            ai,
            agents: None,
            conversation: ConversationExtractor::new(),
            timeouts: config.timeouts,
        }
    }

    /// Enable validation through a research backend.
    pub fn with_research(mut self, backend: Arc<dyn ResearchBackend>, config: AgentConfig) -> Self {
        self.agents = Some(AgentRegistry::new(backend, config, self.timeouts.agent_setup));
        self
    }

    pub fn with_conversation_extractor(mut self, extractor: ConversationExtractor) -> Self {
        self.conversation = extractor;
        self
    }

    pub fn agents(&self) -> Option<&AgentRegistry> {
        self.agents.as_ref()
    }

    /// Delete research agents created so far.
    pub async fn cleanup(&mut self) {
        if let Some(agents) = self.agents.as_mut() {
            agents.cleanup().await;
        }
    }

    /// Validate one criterion against `product` and record the verdict.
    ///
    /// Missing document context and unreadable threads degrade to placeholder
    /// text. Agent setup, run and verdict failures propagate and leave the
    /// criterion untouched.
    pub async fn validate<S: CriteriaStore>(
        &self,
        manager: &CriteriaManager<S>,
        documents: &dyn DocumentSource,
        criterion_id: Uuid,
        product: &str,
        mode: ResearchMode,
    ) -> Result<Criterion> {
        let ai = self
            .ai
            .as_ref()
            .ok_or_else(|| CriteriaError::unavailable("validation", "AI not configured"))?;
        let agents = self
            .agents
            .as_ref()
            .ok_or_else(|| CriteriaError::unavailable("validation", "research backend not configured"))?;

        let criterion = manager.get(criterion_id).await?;
        let extraction = manager.get_extraction(criterion.extraction_id).await?;
        let summary = self
            .document_context(documents, extraction.document_id, &criterion.text)
            .await;

        let agent_id = agents.agent_id(mode).await?;
        let backend = agents.backend();

        let thread_id = bounded(
            "thread creation",
            self.timeouts.agent_setup,
            backend.create_thread(),
        )
        .await?;
        let message = format_validation_message(product, &summary, &criterion.text);
        bounded(
            "message posting",
            self.timeouts.agent_setup,
            backend.post_user_message(&thread_id, &message),
        )
        .await?;

        let outcome = bounded("research run", self.timeouts.run, backend.run(&thread_id, &agent_id)).await?;
        if !outcome.is_completed() {
            warn!(
                criterion_id = %criterion_id,
                thread_id = %thread_id,
                status = %outcome.status,
                error = outcome.error.as_deref().unwrap_or("Unknown error"),
                "Research run did not complete"
            );
        }

        let conversation = self.conversation_text(backend, &thread_id).await;

        let verdict = bounded(
            "verdict reduction",
            self.timeouts.llm,
            ai.reduce_conversation(&conversation),
        )
        .await?;
        let verdict = keep_web_references(verdict);

        info!(
            criterion_id = %criterion_id,
            mode = %mode,
            is_met = verdict.is_met,
            references = verdict.references.len(),
            "Criterion validated"
        );
        manager.record_verdict(criterion_id, verdict).await
    }

    /// Conversation text of a thread. Listing is retried once, then the
    /// failure becomes the placeholder text.
    async fn conversation_text(&self, backend: &dyn ResearchBackend, thread_id: &str) -> String {
        let mut last_error = None;
        for attempt in 1..=2 {
            match bounded(
                "message listing",
                self.timeouts.messages,
                backend.list_messages(thread_id),
            )
            .await
            {
                Ok(messages) => return self.conversation.extract(&messages),
                Err(e) => {
                    warn!(thread_id = %thread_id, attempt, error = %e, "Failed to list thread messages");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => format!("Error extracting response: {e}"),
            None => NO_RESPONSE_CONTENT.to_string(),
        }
    }

    /// Document summary for the research message, degraded when unavailable.
    ///
    /// The summarizer only fails without an AI backend, which `validate`
    /// rejects up front.
    async fn document_context(
        &self,
        documents: &dyn DocumentSource,
        document_id: Uuid,
        criterion_text: &str,
    ) -> String {
        let content = match documents.get_content(document_id).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                warn!(document_id = %document_id, "No document content for validation context");
                return format!("Limited context available. Evaluating criterion: {criterion_text}");
            }
            Err(e) => {
                warn!(document_id = %document_id, error = %e, "Failed to load document content");
                return format!("Limited context available. Evaluating criterion: {criterion_text}");
            }
        };

        match self.summarizer.summarize(&content).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(document_id = %document_id, error = %e, "Document summary failed");
                format!("Document summary unavailable. Evaluating criterion: {criterion_text}")
            }
        }
    }
}

/// Drop references whose URL is not an absolute http(s) URL.
fn keep_web_references(mut verdict: ValidationVerdict) -> ValidationVerdict {
    verdict.references.retain(|reference| {
        let keep = is_web_url(reference);
        if !keep {
            warn!(url = %reference.url, title = %reference.title, "Dropping reference without a web URL");
        }
        keep
    });
    verdict
}

fn is_web_url(reference: &ValidationReference) -> bool {
    Url::parse(reference.url.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryDocuments;
    use crate::types::document::DocumentMetadata;

    #[test]
    fn test_keep_web_references() {
        let verdict = ValidationVerdict {
            is_met: true,
            summary: "ok".to_string(),
            references: vec![
                ValidationReference::new("Docs", "https://example.com/docs/page?x=1"),
                ValidationReference::new("Relative", "/docs/page"),
                ValidationReference::new("Mail", "mailto:sales@example.com"),
                ValidationReference::new("Plain", "http://example.org"),
                ValidationReference::new("Junk", "see vendor site"),
            ],
        };

        let kept = keep_web_references(verdict);
        let titles: Vec<_> = kept.references.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Docs", "Plain"]);
    }

    #[tokio::test]
    async fn test_summary_failure_degrades_context() {
        let document_id = Uuid::now_v7();
        let documents = MemoryDocuments::new();
        documents
            .insert(
                DocumentMetadata::new(document_id, "rfp.md"),
                Some("The vendor shall provide SSO.".to_string()),
            )
            .unwrap();

        let orchestrator = ValidationOrchestrator::new(None, PipelineConfig::default());
        let context = orchestrator
            .document_context(&documents, document_id, "Supports SSO")
            .await;

        assert_eq!(
            context,
            "Document summary unavailable. Evaluating criterion: Supports SSO"
        );
    }
}
