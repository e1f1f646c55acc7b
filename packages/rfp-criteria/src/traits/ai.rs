//! AI trait for structured-output LLM operations.
//!
//! The AI trait abstracts the LLM calls the pipeline makes:
//! - Verbatim criteria extraction per chunk
//! - Document type classification
//! - Six-way categorization of criteria
//! - Map-then-reduce summarization
//! - Reducing a research conversation to a verdict
//!
//! Implementations own prompting and response parsing. A call that returns
//! malformed output is an error, never a partial result.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::validation::ValidationVerdict;

/// AI trait for LLM operations.
#[async_trait]
pub trait AI: Send + Sync {
    /// Extract every requirement statement in a chunk, verbatim.
    ///
    /// `chunk_number` is 1-based.
    async fn extract_criteria(
        &self,
        chunk: &str,
        chunk_number: usize,
        total_chunks: usize,
    ) -> Result<ChunkExtraction>;

    /// Classify a document from a prefix of its text.
    async fn classify_document(&self, prefix: &str) -> Result<ClassificationResponse>;

    /// Assign each text to one of the six category labels.
    ///
    /// Answers with 1-based indices into `texts`.
    async fn categorize(&self, texts: &[String]) -> Result<Vec<LabelAssignment>>;

    /// Summarize key information, requirements, and objectives of a chunk.
    async fn summarize_chunk(&self, chunk: &str) -> Result<String>;

    /// Synthesize several chunk summaries into one.
    async fn synthesize_summaries(&self, summaries: &[String]) -> Result<String>;

    /// Reduce a research conversation to a verdict, keeping full source URLs.
    async fn reduce_conversation(&self, conversation: &str) -> Result<ValidationVerdict>;
}

/// Statements extracted from one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkExtraction {
    pub statements: Vec<ExtractedStatement>,

    /// Confidence for the whole chunk (0.0 to 1.0)
    pub confidence: f32,
}

impl ChunkExtraction {
    pub fn new(confidence: f32) -> Self {
        Self {
            statements: Vec::new(),
            confidence,
        }
    }

    pub fn with_statement(mut self, text: impl Into<String>) -> Self {
        self.statements.push(ExtractedStatement::new(text));
        self
    }

    pub fn with_statements(mut self, texts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.statements
            .extend(texts.into_iter().map(ExtractedStatement::new));
        self
    }
}

/// One requirement statement, verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedStatement {
    pub text: String,

    /// The document's own identifier for it, when it has one
    pub criteria_id: Option<String>,
}

impl ExtractedStatement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            criteria_id: None,
        }
    }

    pub fn with_criteria_id(mut self, id: impl Into<String>) -> Self {
        self.criteria_id = Some(id.into());
        self
    }
}

/// Raw classifier answer, before label mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResponse {
    /// Label as the model wrote it
    pub document_type: String,

    /// Confidence in the classification (0.0 to 1.0)
    pub confidence: f32,

    pub contains_criteria: bool,

    pub reasoning: String,
}

/// Texts assigned to one category label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAssignment {
    pub label: String,

    /// 1-based indices into the categorized texts
    pub indices: Vec<usize>,
}

impl LabelAssignment {
    pub fn new(label: impl Into<String>, indices: Vec<usize>) -> Self {
        Self {
            label: label.into(),
            indices,
        }
    }
}
