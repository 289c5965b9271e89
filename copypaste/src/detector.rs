//! Copypaste detector orchestrator.
//!
//! The [`CopypasteDetector`] runs every incoming document through a
//! [`Preprocessor`] to obtain its shingle set and delegates persistence and
//! similarity search to a [`CopypasteStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use copypaste::{
//!     CopypasteConfig, CopypasteDetector, Document, MemoryCopypasteStore, PartialDocument,
//! };
//!
//! let detector = CopypasteDetector::builder()
//!     .config(CopypasteConfig::default())
//!     .store(Arc::new(MemoryCopypasteStore::new()))
//!     .build()?;
//!
//! detector.remember_document(Document::new("1", vec![text.into()])).await?;
//! let mut similar = detector.check_document(PartialDocument::new(vec![other.into()]), 5).await?;
//! while let Some(doc) = similar.try_next().await? {
//!     println!("{} {:.2}", doc.id, doc.rel_similarity);
//! }
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use tracing::{error, info, warn};

use crate::config::{CopypasteConfig, SimilarityThresholds};
use crate::document::{
    Document, Meta, PartialDocument, PartialShingledDocument, ShingledDocument,
};
use crate::error::{CopypasteError, Result};
use crate::preprocess::Preprocessor;
use crate::store::{CopypasteStore, SimilarStream};

/// The copypaste detector.
///
/// Holds no state besides its configuration: documents live in the store.
/// Construct one via [`CopypasteDetector::builder()`].
pub struct CopypasteDetector {
    store: Arc<dyn CopypasteStore>,
    thresholds: SimilarityThresholds,
    preprocessor: Arc<dyn Preprocessor>,
    default_similar_limit: usize,
}

impl CopypasteDetector {
    /// Create a new [`CopypasteDetectorBuilder`].
    pub fn builder() -> CopypasteDetectorBuilder {
        CopypasteDetectorBuilder::default()
    }

    /// Return the thresholds applied to every check.
    pub fn thresholds(&self) -> &SimilarityThresholds {
        &self.thresholds
    }

    /// Return a reference to the store.
    pub fn store(&self) -> &Arc<dyn CopypasteStore> {
        &self.store
    }

    /// Run the preprocessor and reject texts without shingles.
    async fn shingle(&self, text_parts: &[String], meta: &Meta) -> Result<BTreeSet<String>> {
        let shingles: BTreeSet<String> =
            self.preprocessor.process(text_parts.to_vec(), meta).await?.into_iter().collect();
        if shingles.is_empty() {
            return Err(CopypasteError::TextTooShort);
        }
        Ok(shingles)
    }

    /// Add a document to the store, replacing any document with the same id.
    ///
    /// # Errors
    ///
    /// - [`CopypasteError::InvalidArgument`] if the id is empty
    /// - [`CopypasteError::TextTooShort`] if the text yields no shingles;
    ///   nothing is stored in that case
    /// - any store error, unchanged
    pub async fn remember_document(&self, doc: Document) -> Result<()> {
        ensure_id(&doc.id)?;

        let shingles = self.shingle(&doc.text_parts, &doc.meta).await.inspect_err(|e| {
            warn!(document.id = %doc.id, error = %e, "rejected document");
        })?;
        let shingle_count = shingles.len();
        let shingled =
            ShingledDocument { id: doc.id, meta: doc.meta, text_parts: doc.text_parts, shingles };

        self.store.store_document(&shingled).await.inspect_err(|e| {
            error!(document.id = %shingled.id, error = %e, "failed to store document");
        })?;

        info!(document.id = %shingled.id, shingle_count, "remembered document");
        Ok(())
    }

    /// Remove the document with the given id. Unknown ids are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CopypasteError::InvalidArgument`] if the id is empty, or the
    /// store error unchanged.
    pub async fn forget_document(&self, id: &str) -> Result<()> {
        ensure_id(id)?;
        self.store.delete_document(id).await.inspect_err(|e| {
            error!(document.id = id, error = %e, "failed to delete document");
        })?;
        info!(document.id = id, "forgot document");
        Ok(())
    }

    /// Get the stored content of a document.
    ///
    /// # Errors
    ///
    /// Returns [`CopypasteError::DocumentNotFound`] if no document has this id.
    pub async fn fetch_document(&self, id: &str) -> Result<Document> {
        ensure_id(id)?;
        self.store
            .get_document(id)
            .await
            .inspect_err(|e| {
                error!(document.id = id, error = %e, "failed to fetch document");
            })?
            .ok_or_else(|| CopypasteError::DocumentNotFound { id: id.to_string() })
    }

    /// Search for stored documents similar to `doc`.
    ///
    /// Returns at most `similar_limit` documents, most similar first, exactly
    /// in the order the store produces them. Nothing is stored.
    ///
    /// # Errors
    ///
    /// - [`CopypasteError::InvalidArgument`] if `similar_limit == 0`
    /// - [`CopypasteError::TextTooShort`] if the text yields no shingles
    ///
    /// Store errors are yielded by the stream.
    pub async fn check_document(
        &self,
        doc: PartialDocument,
        similar_limit: usize,
    ) -> Result<SimilarStream<'_>> {
        if similar_limit == 0 {
            return Err(CopypasteError::InvalidArgument(
                "similar limit must be a positive integer".to_string(),
            ));
        }

        let shingles = self.shingle(&doc.text_parts, &doc.meta).await.inspect_err(|e| {
            warn!(error = %e, "rejected document check");
        })?;
        let shingled =
            PartialShingledDocument { id: doc.id, meta: doc.meta, text_parts: doc.text_parts, shingles };

        Ok(self
            .store
            .find_similar(shingled, self.thresholds, similar_limit)
            .inspect_err(|e| error!(error = %e, "similarity search failed"))
            .boxed())
    }

    /// [`check_document`](Self::check_document) with the configured default limit.
    pub async fn check(&self, doc: PartialDocument) -> Result<SimilarStream<'_>> {
        self.check_document(doc, self.default_similar_limit).await
    }
}

fn ensure_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(CopypasteError::InvalidArgument("document id is missing".to_string()));
    }
    Ok(())
}

/// Builder for constructing a [`CopypasteDetector`].
///
/// Only the store is required. Without a config, [`CopypasteConfig::default()`]
/// is used; without an explicit preprocessor, the config's English pipeline is.
///
/// # Example
///
/// ```rust,ignore
/// let detector = CopypasteDetector::builder()
///     .config(config)
///     .store(Arc::new(store))
///     .preprocessor(Arc::new(custom))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct CopypasteDetectorBuilder {
    config: Option<CopypasteConfig>,
    store: Option<Arc<dyn CopypasteStore>>,
    preprocessor: Option<Arc<dyn Preprocessor>>,
}

impl CopypasteDetectorBuilder {
    /// Set the detector configuration.
    pub fn config(mut self, config: CopypasteConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the store backend.
    pub fn store(mut self, store: Arc<dyn CopypasteStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the pipeline derived from the configuration.
    pub fn preprocessor(mut self, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    /// Build the [`CopypasteDetector`].
    ///
    /// # Errors
    ///
    /// Returns [`CopypasteError::InvalidConfiguration`] if the store is
    /// missing or the configuration is invalid, in particular when both
    /// similarity thresholds are disabled.
    pub fn build(self) -> Result<CopypasteDetector> {
        let store = self
            .store
            .ok_or_else(|| CopypasteError::InvalidConfiguration("store is required".to_string()))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let preprocessor = match self.preprocessor {
            Some(preprocessor) => preprocessor,
            None => config.preprocessor()?,
        };

        Ok(CopypasteDetector {
            store,
            thresholds: config.thresholds,
            preprocessor,
            default_similar_limit: config.default_similar_limit,
        })
    }
}
