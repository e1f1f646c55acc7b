//! Storage traits for extractions and criteria.
//!
//! The storage layer is split into focused traits:
//! - `ExtractionStore`: Raw extractions, immutable once stored
//! - `CriterionStore`: Criteria, last write wins per id
//! - `CriteriaStore`: Composite trait combining both

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    criterion::{CriteriaQuery, Criterion},
    extraction::Extraction,
};

/// Store for raw extractions.
#[async_trait]
pub trait ExtractionStore: Send + Sync {
    async fn store_extraction(&self, extraction: &Extraction) -> Result<()>;

    async fn store_extractions(&self, extractions: &[Extraction]) -> Result<()> {
        for extraction in extractions {
            self.store_extraction(extraction).await?;
        }
        Ok(())
    }

    async fn get_extraction(&self, id: Uuid) -> Result<Option<Extraction>>;

    /// All extractions of a document, in creation order.
    async fn get_extractions_for_document(&self, document_id: Uuid) -> Result<Vec<Extraction>>;
}

/// Store for criteria.
#[async_trait]
pub trait CriterionStore: Send + Sync {
    /// Insert or replace a criterion.
    async fn store_criterion(&self, criterion: &Criterion) -> Result<()>;

    async fn get_criterion(&self, id: Uuid) -> Result<Option<Criterion>>;

    /// Criteria matching the query, newest first, windowed by offset/limit.
    async fn query_criteria(&self, query: &CriteriaQuery) -> Result<Vec<Criterion>>;

    /// Every criterion, optionally for one document. Not windowed.
    async fn all_criteria(&self, document_id: Option<Uuid>) -> Result<Vec<Criterion>>;

    /// Delete a criterion. Returns whether it existed.
    async fn delete_criterion(&self, id: Uuid) -> Result<bool>;
}

/// Composite storage trait combining both stores.
///
/// This is the trait the lifecycle manager works against.
pub trait CriteriaStore: ExtractionStore + CriterionStore {}

// Blanket implementation: anything implementing both traits is a CriteriaStore
impl<T: ExtractionStore + CriterionStore> CriteriaStore for T {}
