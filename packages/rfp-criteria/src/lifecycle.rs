//! Criterion lifecycle: persistence, review state and queries.
//!
//! Status changes are not restricted: any explicit update moves a criterion
//! straight to the requested state, including out of approved or rejected.

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CriteriaError, Result};
use crate::pipeline::convert::convert_extractions;
use crate::traits::store::CriteriaStore;
use crate::types::{
    criterion::{
        Category, CriteriaQuery, CriteriaStatistics, Criterion, CriterionUpdate, Page, Status,
    },
    extraction::Extraction,
    validation::ValidationVerdict,
};

/// Review note written by [`CriteriaManager::approve`].
pub const APPROVED_NOTE: &str = "Approved";

/// Owns the criterion state machine over a store.
pub struct CriteriaManager<S: CriteriaStore> {
    store: S,
}

impl<S: CriteriaStore> CriteriaManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist raw extractions as-is.
    pub async fn record_extractions(&self, extractions: &[Extraction]) -> Result<()> {
        self.store.store_extractions(extractions).await?;
        debug!(count = extractions.len(), "Recorded extractions");
        Ok(())
    }

    pub async fn get_extraction(&self, id: Uuid) -> Result<Extraction> {
        self.store
            .get_extraction(id)
            .await?
            .ok_or_else(|| CriteriaError::not_found("extraction", id))
    }

    /// Convert extractions into criteria and store them.
    ///
    /// Extractions too short to be criteria are skipped.
    pub async fn create_from_extractions(&self, extractions: &[Extraction]) -> Result<Vec<Criterion>> {
        let criteria = convert_extractions(extractions);
        for criterion in &criteria {
            self.store.store_criterion(criterion).await?;
        }
        info!(
            extractions = extractions.len(),
            created = criteria.len(),
            "Created criteria from extractions"
        );
        Ok(criteria)
    }

    /// One page of matching criteria, newest first.
    pub async fn query(&self, query: &CriteriaQuery) -> Result<Page<Criterion>> {
        let overfetch = query.clone().with_limit(query.limit.saturating_add(1));
        let items = self.store.query_criteria(&overfetch).await?;
        Ok(Page::from_overfetch(items, query.offset, query.limit))
    }

    pub async fn get(&self, id: Uuid) -> Result<Criterion> {
        self.store
            .get_criterion(id)
            .await?
            .ok_or_else(|| CriteriaError::not_found("criterion", id))
    }

    /// Merge a partial update into a criterion.
    pub async fn update(
        &self,
        id: Uuid,
        update: CriterionUpdate,
        reviewer: Option<&str>,
    ) -> Result<Criterion> {
        let mut criterion = self.get(id).await?;
        criterion.apply(update, reviewer)?;
        self.store.store_criterion(&criterion).await?;
        debug!(criterion_id = %id, status = %criterion.status.as_str(), "Criterion updated");
        Ok(criterion)
    }

    /// Apply the same update to each id in order.
    ///
    /// Failures are isolated per id: the result maps every id to whether its
    /// update succeeded.
    pub async fn bulk_update(
        &self,
        ids: &[Uuid],
        update: &CriterionUpdate,
        reviewer: Option<&str>,
    ) -> IndexMap<Uuid, bool> {
        let mut results = IndexMap::with_capacity(ids.len());
        for &id in ids {
            let ok = match self.update(id, update.clone(), reviewer).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(criterion_id = %id, error = %e, "Bulk update failed for criterion");
                    false
                }
            };
            results.insert(id, ok);
        }
        results
    }

    pub async fn approve(&self, id: Uuid, reviewer: Option<&str>) -> Result<Criterion> {
        let update = CriterionUpdate::new()
            .with_status(Status::Approved)
            .with_review_notes(APPROVED_NOTE);
        self.update(id, update, reviewer).await
    }

    /// Reject with note `Rejected: <reason>`.
    pub async fn reject(&self, id: Uuid, reason: &str, reviewer: Option<&str>) -> Result<Criterion> {
        let update = CriterionUpdate::new()
            .with_status(Status::Rejected)
            .with_review_notes(format!("Rejected: {reason}"));
        self.update(id, update, reviewer).await
    }

    /// Counts over all criteria, or those of one document.
    pub async fn statistics(&self, document_id: Option<Uuid>) -> Result<CriteriaStatistics> {
        let criteria = self.store.all_criteria(document_id).await?;
        Ok(CriteriaStatistics::from_criteria(&criteria))
    }

    /// Overwrite the category, leaving the reviewer untouched.
    pub async fn set_category(&self, id: Uuid, category: Category) -> Result<Criterion> {
        self.update(id, CriterionUpdate::new().with_category(category), None)
            .await
    }

    /// Write a research verdict back onto a criterion.
    pub async fn record_verdict(&self, id: Uuid, verdict: ValidationVerdict) -> Result<Criterion> {
        let mut criterion = self.get(id).await?;
        criterion.apply_verdict(verdict);
        self.store.store_criterion(&criterion).await?;
        info!(
            criterion_id = %id,
            is_met = criterion.validation.as_ref().map(|v| v.is_met),
            "Recorded validation verdict"
        );
        Ok(criterion)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if self.store.delete_criterion(id).await? {
            Ok(())
        } else {
            Err(CriteriaError::not_found("criterion", id))
        }
    }
}
