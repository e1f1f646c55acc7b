//! Criteria Extraction and Validation Library
//!
//! Turns procurement documents (RFPs, RFQs, tenders) into structured,
//! reviewable evaluation criteria, and validates criteria against a product
//! through a web-grounded research agent.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rfp_criteria::{CriteriaService, MemoryDocuments, MemoryStore, PipelineConfig};
//! use rfp_criteria::testing::MockAI;
//!
//! let documents = MemoryDocuments::new();
//! let document_id = documents.insert(metadata, text);
//!
//! let service = CriteriaService::new(
//!     MemoryStore::new(),
//!     documents,
//!     Some(Arc::new(MockAI::new())),
//!     PipelineConfig::default(),
//! );
//!
//! let extractions = service.extract_document(document_id, None).await?;
//! let ids: Vec<_> = extractions.iter().map(|e| e.id).collect();
//! let criteria = service.process_extractions(&ids).await?;
//! ```
//!
//! Without an AI backend, extraction falls back to obligation-marker
//! patterns and every AI-only operation reports `Unavailable`.
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (AI, ResearchBackend, stores, documents)
//! - [`types`] - Criteria, extractions, documents, verdicts and configuration
//! - [`pipeline`] - Chunking, extraction, conversion, classification, categorization, summarization
//! - [`lifecycle`] - Review lifecycle of stored criteria
//! - [`validate`] - Research-backed validation
//! - [`stores`] - In-memory storage
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod lifecycle;
pub mod pipeline;
pub mod service;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validate;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{CriteriaError, Result};
pub use lifecycle::CriteriaManager;
pub use service::CriteriaService;
pub use traits::{
    ai::{ChunkExtraction, ClassificationResponse, ExtractedStatement, LabelAssignment, AI},
    document::DocumentSource,
    research::ResearchBackend,
    store::{CriteriaStore, CriterionStore, ExtractionStore},
};
pub use types::{
    config::{AgentConfig, PipelineConfig, Timeouts},
    criterion::{
        Category, CriteriaQuery, CriteriaStatistics, Criterion, CriterionUpdate, Page, Priority,
        Status,
    },
    document::{DocumentClassification, DocumentMetadata, DocumentStatus, DocumentType},
    extraction::Extraction,
    validation::{
        AgentSpec, ResearchMode, ResearchTool, RunOutcome, ThreadMessage, ValidationReference,
        ValidationVerdict,
    },
};

// Re-export pipeline components
pub use pipeline::{
    convert_extractions, fallback_extract, split_semantic, to_criterion, CategoryLabel,
    Categorizer, Classifier, ExtractionEngine, Summarizer, CONSOLIDATION_FAILED_SUMMARY,
    DEFAULT_CHUNK_SIZE, NO_SUMMARY,
};

pub use validate::{AgentRegistry, ConversationExtractor, ValidationOrchestrator};

// Re-export stores
pub use stores::{MemoryDocuments, MemoryStore};

// Re-export testing utilities
pub use testing::{MockAI, MockResearch};
