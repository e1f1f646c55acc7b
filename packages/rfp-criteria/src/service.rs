//! The criteria service: one entry point over the whole pipeline.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CriteriaError, Result};
use crate::lifecycle::CriteriaManager;
use crate::pipeline::{
    categorize::Categorizer, classify::Classifier, extract::ExtractionEngine,
    summarize::Summarizer,
};
use crate::traits::{
    ai::AI, document::DocumentSource, research::ResearchBackend, store::CriteriaStore,
};
use crate::types::{
    config::{AgentConfig, PipelineConfig},
    criterion::{Category, Criterion},
    document::DocumentClassification,
    extraction::Extraction,
    validation::ResearchMode,
};
use crate::validate::ValidationOrchestrator;

/// Extraction, review and validation of criteria over a store and a
/// document source.
///
/// # Example
///
/// ```rust,ignore
/// let service = CriteriaService::new(MemoryStore::new(), documents, Some(ai), PipelineConfig::default());
///
/// let extractions = service.extract_document(document_id, None).await?;
/// let ids: Vec<_> = extractions.iter().map(|e| e.id).collect();
/// let criteria = service.process_extractions(&ids).await?;
/// ```
pub struct CriteriaService<S: CriteriaStore, D: DocumentSource> {
    manager: CriteriaManager<S>,
    documents: D,
    extraction: ExtractionEngine,
    classifier: Classifier,
    categorizer: Categorizer,
    summarizer: Summarizer,
    validation: ValidationOrchestrator,
}

impl<S: CriteriaStore, D: DocumentSource> CriteriaService<S, D> {
    /// Create a service. Without `ai`, extraction uses the pattern fallback
    /// and AI-only operations report `Unavailable`.
    pub fn new(store: S, documents: D, ai: Option<Arc<dyn AI>>, config: PipelineConfig) -> Self {
        Self {
            manager: CriteriaManager::new(store),
            documents,
            extraction: ExtractionEngine::new(ai.clone(), config.clone()),
            classifier: Classifier::new(ai.clone(), config.clone()),
            categorizer: Categorizer::new(ai.clone(), config.timeouts.llm),
            summarizer: Summarizer::new(ai.clone(), config.clone()),
            validation: ValidationOrchestrator::new(ai, config),
        }
    }

    /// Enable criterion validation through a research backend.
    pub fn with_research(mut self, backend: Arc<dyn ResearchBackend>, config: AgentConfig) -> Self {
        self.validation = self.validation.with_research(backend, config);
        self
    }

    /// Lifecycle operations: query, update, approve, reject, statistics.
    pub fn manager(&self) -> &CriteriaManager<S> {
        &self.manager
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn validation(&self) -> &ValidationOrchestrator {
        &self.validation
    }

    /// Extract and record raw extractions for a stored document.
    ///
    /// Documents that fail the extraction gate yield no extractions.
    pub async fn extract_document(
        &self,
        document_id: Uuid,
        max_criteria: Option<usize>,
    ) -> Result<Vec<Extraction>> {
        let document = self
            .documents
            .get_document(document_id)
            .await?
            .ok_or_else(|| CriteriaError::not_found("document", document_id))?;

        if !document.is_extraction_eligible() {
            info!(
                document_id = %document_id,
                document_type = ?document.document_type,
                "Not a requirements document, skipping criteria extraction"
            );
            return Ok(Vec::new());
        }

        let content = self
            .documents
            .get_content(document_id)
            .await?
            .ok_or(CriteriaError::NoContent { document_id })?;

        let extractions = self
            .extraction
            .extract(document_id, &content, max_criteria)
            .await?;
        self.manager.record_extractions(&extractions).await?;

        info!(
            document_id = %document_id,
            filename = %document.filename,
            count = extractions.len(),
            "Extracted criteria from requirements document"
        );
        Ok(extractions)
    }

    /// Convert recorded extractions into stored criteria.
    ///
    /// Unknown extraction ids are skipped.
    pub async fn process_extractions(&self, extraction_ids: &[Uuid]) -> Result<Vec<Criterion>> {
        let mut extractions = Vec::with_capacity(extraction_ids.len());
        for &id in extraction_ids {
            match self.manager.store().get_extraction(id).await? {
                Some(extraction) => extractions.push(extraction),
                None => warn!(extraction_id = %id, "Unknown extraction, skipping"),
            }
        }

        if extractions.is_empty() {
            return Ok(Vec::new());
        }
        self.manager.create_from_extractions(&extractions).await
    }

    /// Recategorize existing criteria with the AI categorizer.
    ///
    /// Unknown criterion ids are skipped. Returns the new category per id.
    pub async fn auto_categorize(&self, criterion_ids: &[Uuid]) -> Result<IndexMap<Uuid, Category>> {
        let mut ids = Vec::with_capacity(criterion_ids.len());
        let mut texts = Vec::with_capacity(criterion_ids.len());
        for &id in criterion_ids {
            match self.manager.store().get_criterion(id).await? {
                Some(criterion) => {
                    ids.push(id);
                    texts.push(criterion.text);
                }
                None => warn!(criterion_id = %id, "Unknown criterion, skipping"),
            }
        }

        let labels = self.categorizer.assign(&texts).await?;

        let mut results = IndexMap::with_capacity(ids.len());
        for (id, label) in ids.into_iter().zip(labels) {
            let criterion = self.manager.set_category(id, label.category()).await?;
            results.insert(id, criterion.category);
        }
        info!(count = results.len(), "Auto-categorized criteria");
        Ok(results)
    }

    pub async fn classify_document(&self, text: &str) -> Result<DocumentClassification> {
        self.classifier.classify(text).await
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        self.summarizer.summarize(text).await
    }

    /// Summarize a stored document.
    pub async fn summarize_document(&self, document_id: Uuid) -> Result<String> {
        let content = self
            .documents
            .get_content(document_id)
            .await?
            .ok_or(CriteriaError::NoContent { document_id })?;
        self.summarizer.summarize(&content).await
    }

    /// Validate a criterion against a product and record the verdict.
    pub async fn validate_criterion(
        &self,
        criterion_id: Uuid,
        product: &str,
        mode: ResearchMode,
    ) -> Result<Criterion> {
        self.validation
            .validate(&self.manager, &self.documents, criterion_id, product, mode)
            .await
    }

    /// Delete research agents created by this service.
    pub async fn cleanup(&mut self) {
        self.validation.cleanup().await;
    }
}
