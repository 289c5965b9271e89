//! Store trait for persisting documents and searching for similar ones.

use std::future::Future;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::config::SimilarityThresholds;
use crate::document::{Document, PartialShingledDocument, ShingledDocument, SimilarDocument};
use crate::error::{CopypasteError, Result};

/// A lazily produced sequence of similar documents.
///
/// Dropping the stream before it is exhausted releases whatever the store
/// holds to produce it.
pub type SimilarStream<'a> = BoxStream<'a, Result<SimilarDocument>>;

/// A storage backend for shingled documents with similarity search.
///
/// Implementations persist documents keyed by id and find stored documents
/// whose shingle sets overlap with a query.
///
/// # Example
///
/// ```rust,ignore
/// use copypaste::{CopypasteStore, MemoryCopypasteStore};
///
/// let store = MemoryCopypasteStore::new();
/// store.store_document(&shingled).await?;
/// let mut similar = store.find_similar(query, SimilarityThresholds::default(), 5);
/// while let Some(doc) = similar.try_next().await? { /* ... */ }
/// ```
#[async_trait]
pub trait CopypasteStore: Send + Sync {
    /// Insert the document or replace the one with the same id, shingles included.
    async fn store_document(&self, doc: &ShingledDocument) -> Result<()>;

    /// Remove the document with the given id. No-op if it is absent.
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Fetch the stored content of a document, without its shingles.
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Find stored documents similar to `doc`.
    ///
    /// A stored document with the same id as `doc` is never returned. Every
    /// result strictly exceeds at least one enabled threshold; results come
    /// in order of decreasing relative similarity, at most `limit` of them.
    /// `limit` must be positive.
    fn find_similar(
        &self,
        doc: PartialShingledDocument,
        thresholds: SimilarityThresholds,
        limit: usize,
    ) -> SimilarStream<'_>;
}

/// Reject a zero result limit.
pub(crate) fn ensure_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(CopypasteError::InvalidArgument("limit must be a positive integer".to_string()));
    }
    Ok(())
}

/// Turn a future computing the final ranking into a stream.
///
/// The future is not polled until the first item is requested.
pub(crate) fn ranked_stream<'a, F>(ranking: F) -> SimilarStream<'a>
where
    F: Future<Output = Result<Vec<SimilarDocument>>> + Send + 'a,
{
    stream::once(ranking)
        .map_ok(|ranked| stream::iter(ranked.into_iter().map(Ok::<_, CopypasteError>)))
        .try_flatten()
        .boxed()
}
