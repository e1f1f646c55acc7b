//! In-memory storage implementations for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{CriteriaError, Result};
use crate::traits::{
    document::DocumentSource,
    store::{CriterionStore, ExtractionStore},
};
use crate::types::{
    criterion::{newest_first, CriteriaQuery, Criterion},
    document::DocumentMetadata,
    extraction::Extraction,
};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| CriteriaError::Storage("memory store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| CriteriaError::Storage("memory store lock poisoned".into()))
}

/// In-memory storage for extractions and criteria.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryStore {
    extractions: RwLock<HashMap<Uuid, Extraction>>,
    criteria: RwLock<HashMap<Uuid, Criterion>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            extractions: RwLock::new(HashMap::new()),
            criteria: RwLock::new(HashMap::new()),
        }
    }

    /// Clear all stored data.
    pub fn clear(&self) -> Result<()> {
        write(&self.extractions)?.clear();
        write(&self.criteria)?.clear();
        Ok(())
    }

    /// Get the number of stored extractions.
    pub fn extraction_count(&self) -> Result<usize> {
        Ok(read(&self.extractions)?.len())
    }

    /// Get the number of stored criteria.
    pub fn criterion_count(&self) -> Result<usize> {
        Ok(read(&self.criteria)?.len())
    }
}

#[async_trait]
impl ExtractionStore for MemoryStore {
    async fn store_extraction(&self, extraction: &Extraction) -> Result<()> {
        write(&self.extractions)?.insert(extraction.id, extraction.clone());
        Ok(())
    }

    async fn get_extraction(&self, id: Uuid) -> Result<Option<Extraction>> {
        Ok(read(&self.extractions)?.get(&id).cloned())
    }

    async fn get_extractions_for_document(&self, document_id: Uuid) -> Result<Vec<Extraction>> {
        let mut extractions: Vec<Extraction> = read(&self.extractions)?
            .values()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect();
        extractions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(extractions)
    }
}

#[async_trait]
impl CriterionStore for MemoryStore {
    async fn store_criterion(&self, criterion: &Criterion) -> Result<()> {
        write(&self.criteria)?.insert(criterion.id, criterion.clone());
        Ok(())
    }

    async fn get_criterion(&self, id: Uuid) -> Result<Option<Criterion>> {
        Ok(read(&self.criteria)?.get(&id).cloned())
    }

    async fn query_criteria(&self, query: &CriteriaQuery) -> Result<Vec<Criterion>> {
        let mut matching: Vec<Criterion> = read(&self.criteria)?
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        matching.sort_by(newest_first);

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn all_criteria(&self, document_id: Option<Uuid>) -> Result<Vec<Criterion>> {
        let mut criteria: Vec<Criterion> = read(&self.criteria)?
            .values()
            .filter(|c| document_id.map_or(true, |d| d == c.document_id))
            .cloned()
            .collect();
        criteria.sort_by(newest_first);
        Ok(criteria)
    }

    async fn delete_criterion(&self, id: Uuid) -> Result<bool> {
        Ok(write(&self.criteria)?.remove(&id).is_some())
    }
}

/// In-memory document source.
///
/// Holds metadata and extracted text registered up front.
#[derive(Default)]
pub struct MemoryDocuments {
    documents: RwLock<HashMap<Uuid, (DocumentMetadata, Option<String>)>>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a document and its text.
    pub fn insert(&self, metadata: DocumentMetadata, content: Option<String>) -> Result<()> {
        write(&self.documents)?.insert(metadata.id, (metadata, content));
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for fixtures.
    pub fn with_document(self, metadata: DocumentMetadata, content: impl Into<String>) -> Result<Self> {
        self.insert(metadata, Some(content.into()))?;
        Ok(self)
    }
}

#[async_trait]
impl DocumentSource for MemoryDocuments {
    async fn get_document(&self, document_id: Uuid) -> Result<Option<DocumentMetadata>> {
        Ok(read(&self.documents)?
            .get(&document_id)
            .map(|(metadata, _)| metadata.clone()))
    }

    async fn get_content(&self, document_id: Uuid) -> Result<Option<String>> {
        Ok(read(&self.documents)?
            .get(&document_id)
            .and_then(|(_, content)| content.clone())
            .filter(|c| !c.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::criterion::{Category, Status};

    fn criterion_for(document_id: Uuid, text: &str) -> Criterion {
        let extraction = Extraction::new(document_id, text);
        Criterion::new(&extraction, text).unwrap()
    }

    #[tokio::test]
    async fn test_store_and_get_extraction() {
        let store = MemoryStore::new();
        let e = Extraction::new(Uuid::now_v7(), "The vendor shall provide support.");

        store.store_extraction(&e).await.unwrap();

        assert_eq!(store.get_extraction(e.id).await.unwrap(), Some(e.clone()));
        assert_eq!(
            store
                .get_extractions_for_document(e.document_id)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.extraction_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_newest_first_with_window() {
        let store = MemoryStore::new();
        let doc = Uuid::now_v7();

        let mut ids = Vec::new();
        for i in 0..5 {
            let c = criterion_for(doc, &format!("Requirement number {i} text"));
            ids.push(c.id);
            store.store_criterion(&c).await.unwrap();
        }

        let all = store
            .query_criteria(&CriteriaQuery::for_document(doc))
            .await
            .unwrap();
        let got: Vec<Uuid> = all.iter().map(|c| c.id).collect();
        let expected: Vec<Uuid> = ids.iter().rev().copied().collect();
        assert_eq!(got, expected);

        let window = store
            .query_criteria(&CriteriaQuery::for_document(doc).with_offset(1).with_limit(2))
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].id, ids[3]);
        assert_eq!(window[1].id, ids[2]);
    }

    #[tokio::test]
    async fn test_query_filters() {
        let store = MemoryStore::new();
        let doc = Uuid::now_v7();

        let security = criterion_for(doc, "Encrypt all data at rest").with_category(Category::Security);
        let mut approved = criterion_for(doc, "Provide a yearly price list");
        approved.status = Status::Approved;
        let elsewhere = criterion_for(Uuid::now_v7(), "Encrypt backups nightly too");

        for c in [&security, &approved, &elsewhere] {
            store.store_criterion(c).await.unwrap();
        }

        let q = CriteriaQuery::for_document(doc).with_search("ENCRYPT");
        let found = store.query_criteria(&q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, security.id);

        let q = CriteriaQuery::new().with_status(Status::Approved);
        assert_eq!(store.query_criteria(&q).await.unwrap()[0].id, approved.id);

        assert_eq!(store.all_criteria(Some(doc)).await.unwrap().len(), 2);
        assert_eq!(store.all_criteria(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_criterion() {
        let store = MemoryStore::new();
        let c = criterion_for(Uuid::now_v7(), "Some requirement text");
        store.store_criterion(&c).await.unwrap();

        assert!(store.delete_criterion(c.id).await.unwrap());
        assert!(!store.delete_criterion(c.id).await.unwrap());
        assert!(store.get_criterion(c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_documents_blank_content_is_none() {
        let id = Uuid::now_v7();
        let docs = MemoryDocuments::new();
        docs.insert(DocumentMetadata::new(id, "empty.md"), Some("   ".into()))
            .unwrap();

        assert!(docs.get_document(id).await.unwrap().is_some());
        assert!(docs.get_content(id).await.unwrap().is_none());
        assert!(docs.get_document(Uuid::now_v7()).await.unwrap().is_none());
    }
}
