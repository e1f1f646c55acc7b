//! OpenAI implementation of the AI trait.
//!
//! Every operation is one structured-output call with a strict JSON schema
//! derived from the response types below.
//!
//! # Example
//!
//! ```rust,ignore
//! use rfp_criteria::ai::OpenAI;
//!
//! let ai = OpenAI::from_env()?.with_model("gpt-4o");
//! let service = CriteriaService::new(store, documents, Some(Arc::new(ai)), config);
//! ```

use async_trait::async_trait;
use openai_client::{OpenAIClient, OpenAIError};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::{CriteriaError, Result};
use crate::pipeline::categorize::CategoryLabel;
use crate::pipeline::prompts::{
    format_categorize_prompt, format_classify_prompt, format_extract_prompt,
    format_summarize_chunk_prompt, format_synthesize_prompt, format_verdict_prompt,
    CATEGORIZE_SYSTEM, CLASSIFY_SYSTEM, EXTRACT_SYSTEM, SUMMARIZE_SYSTEM, SYNTHESIZE_SYSTEM,
    VERDICT_SYSTEM,
};
use crate::traits::ai::{
    ChunkExtraction, ClassificationResponse, ExtractedStatement, LabelAssignment, AI,
};
use crate::types::validation::ValidationVerdict;

impl From<OpenAIError> for CriteriaError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Config(reason) => CriteriaError::unavailable("openai", reason),
            other => CriteriaError::upstream(other),
        }
    }
}

/// OpenAI-based AI implementation.
#[derive(Clone)]
pub struct OpenAI {
    client: OpenAIClient,
    model: String,
}

impl OpenAI {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            model: "gpt-4o".to_string(),
        }
    }

    /// Create from `OPENAI_API_KEY` (and optional `OPENAI_BASE_URL`).
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(OpenAIClient::from_env()?))
    }

    /// Set the chat model or Azure deployment (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn client(&self) -> &OpenAIClient {
        &self.client
    }
}

#[async_trait]
impl AI for OpenAI {
    async fn extract_criteria(
        &self,
        chunk: &str,
        chunk_number: usize,
        total_chunks: usize,
    ) -> Result<ChunkExtraction> {
        let response: CriteriaExtractionJson = self
            .client
            .extract(
                &self.model,
                EXTRACT_SYSTEM,
                format_extract_prompt(chunk, chunk_number, total_chunks),
            )
            .await?;

        Ok(ChunkExtraction {
            statements: response
                .criteria
                .into_iter()
                .map(|c| ExtractedStatement {
                    text: c.text,
                    criteria_id: c.criteria_id,
                })
                .collect(),
            confidence: response.confidence,
        })
    }

    async fn classify_document(&self, prefix: &str) -> Result<ClassificationResponse> {
        let response: ClassificationJson = self
            .client
            .extract(&self.model, CLASSIFY_SYSTEM, format_classify_prompt(prefix))
            .await?;

        Ok(ClassificationResponse {
            document_type: response.document_type,
            confidence: response.confidence,
            contains_criteria: response.contains_criteria,
            reasoning: response.reasoning,
        })
    }

    async fn categorize(&self, texts: &[String]) -> Result<Vec<LabelAssignment>> {
        let response: CategorizationJson = self
            .client
            .extract(&self.model, CATEGORIZE_SYSTEM, format_categorize_prompt(texts))
            .await?;
        Ok(response.into_assignments())
    }

    async fn summarize_chunk(&self, chunk: &str) -> Result<String> {
        let response: SummaryJson = self
            .client
            .extract(&self.model, SUMMARIZE_SYSTEM, format_summarize_chunk_prompt(chunk))
            .await?;
        Ok(response.summary)
    }

    async fn synthesize_summaries(&self, summaries: &[String]) -> Result<String> {
        let response: SummaryJson = self
            .client
            .extract(&self.model, SYNTHESIZE_SYSTEM, format_synthesize_prompt(summaries))
            .await?;
        Ok(response.summary)
    }

    async fn reduce_conversation(&self, conversation: &str) -> Result<ValidationVerdict> {
        Ok(self
            .client
            .extract(&self.model, VERDICT_SYSTEM, format_verdict_prompt(conversation))
            .await?)
    }
}

// Response types

/// All requirements found in a chunk.
#[derive(Debug, Deserialize, JsonSchema)]
struct CriteriaExtractionJson {
    criteria: Vec<ExtractedCriterionJson>,
    /// Confidence in the extraction of this chunk, 0.0 to 1.0
    confidence: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractedCriterionJson {
    /// The document's own identifier of the criterion, if it has one
    criteria_id: Option<String>,
    /// Exact text of the requirement as found in the document
    text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ClassificationJson {
    /// One of the listed document type labels
    document_type: String,
    /// 0.0 to 1.0
    confidence: f32,
    contains_criteria: bool,
    reasoning: String,
}

/// Criterion numbers (1-based) per category.
#[derive(Debug, Deserialize, JsonSchema)]
struct CategorizationJson {
    technical_requirements: Vec<u32>,
    security_compliance: Vec<u32>,
    performance_scalability: Vec<u32>,
    integration_compatibility: Vec<u32>,
    support_maintenance: Vec<u32>,
    commercial_legal: Vec<u32>,
}

impl CategorizationJson {
    fn into_assignments(self) -> Vec<LabelAssignment> {
        let assignment = |label: CategoryLabel, numbers: Vec<u32>| {
            LabelAssignment::new(
                label.label(),
                numbers.into_iter().map(|n| n as usize).collect(),
            )
        };

        vec![
            assignment(CategoryLabel::TechnicalRequirements, self.technical_requirements),
            assignment(CategoryLabel::SecurityCompliance, self.security_compliance),
            assignment(CategoryLabel::PerformanceScalability, self.performance_scalability),
            assignment(CategoryLabel::IntegrationCompatibility, self.integration_compatibility),
            assignment(CategoryLabel::SupportMaintenance, self.support_maintenance),
            assignment(CategoryLabel::CommercialLegal, self.commercial_legal),
        ]
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SummaryJson {
    summary: String,
}
