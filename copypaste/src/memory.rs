//! Exhaustive in-memory store.
//!
//! This module provides [`MemoryCopypasteStore`], a store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. Every search compares the
//! query with every stored document, which makes it the reference for other
//! stores and a good fit for small corpora and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::SimilarityThresholds;
use crate::document::{Document, PartialShingledDocument, ShingledDocument, SimilarDocument};
use crate::error::Result;
use crate::similarity::{rank, score_candidate};
use crate::store::{CopypasteStore, SimilarStream, ensure_limit, ranked_stream};

/// A [`CopypasteStore`] keeping every document in memory.
///
/// # Example
///
/// ```rust,ignore
/// use copypaste::{CopypasteDetector, MemoryCopypasteStore};
///
/// let detector = CopypasteDetector::builder()
///     .store(Arc::new(MemoryCopypasteStore::new()))
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryCopypasteStore {
    documents: RwLock<HashMap<String, ShingledDocument>>,
}

impl MemoryCopypasteStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Score every stored document against the query.
    async fn search(
        &self,
        doc: PartialShingledDocument,
        thresholds: SimilarityThresholds,
        limit: usize,
    ) -> Result<Vec<SimilarDocument>> {
        ensure_limit(limit)?;
        let documents = self.documents.read().await;

        let accepted: Vec<_> = documents
            .values()
            .filter(|candidate| doc.id.as_deref() != Some(candidate.id.as_str()))
            .filter_map(|candidate| {
                score_candidate(&candidate.id, &doc.shingles, &candidate.shingles, &thresholds)
            })
            .collect();

        debug!(scanned = documents.len(), accepted = accepted.len(), "scored in-memory documents");
        Ok(rank(accepted, limit))
    }
}

#[async_trait]
impl CopypasteStore for MemoryCopypasteStore {
    async fn store_document(&self, doc: &ShingledDocument) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.remove(id);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents.get(id).map(ShingledDocument::to_document))
    }

    fn find_similar(
        &self,
        doc: PartialShingledDocument,
        thresholds: SimilarityThresholds,
        limit: usize,
    ) -> SimilarStream<'_> {
        ranked_stream(self.search(doc, thresholds, limit))
    }
}
