//! Indexed SQLite store backend.
//!
//! Provides [`SqliteCopypasteStore`] which implements [`CopypasteStore`] using
//! [sqlx](https://docs.rs/sqlx) and an [FTS5](https://sqlite.org/fts5.html)
//! full-text index over document shingles.
//!
//! Similarity search runs in two phases. The full-text index first retrieves
//! at most `candidate_limit` documents sharing shingles with the query, best
//! BM25 rank first. Each candidate is then re-scored with the exact Jaccard
//! index, filtered by the thresholds, ranked and truncated.
//!
//! # Known limitation
//!
//! Candidate retrieval is a ranked index query, not a scan. When more than
//! `candidate_limit` documents share terms with the query, a true match with
//! sparse overlap can rank below the cap and be missed. Accepted results are
//! always scored exactly; the store may under-report but never over-reports.
//!
//! # Example
//!
//! ```rust,ignore
//! use copypaste::sqlite::{SqliteCopypasteStore, SqliteStoreConfig};
//!
//! let config = SqliteStoreConfig::default();
//! let store = SqliteCopypasteStore::connect("sqlite://copypaste.db", config).await?;
//! store.store_document(&shingled).await?;
//! let similar = store.find_similar(query, thresholds, 5);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;
use std::str::FromStr;

use async_trait::async_trait;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::SimilarityThresholds;
use crate::document::{Document, PartialShingledDocument, ShingledDocument, SimilarDocument};
use crate::error::{CopypasteError, Result};
use crate::similarity::{rank, score_candidate};
use crate::store::{CopypasteStore, SimilarStream, ensure_limit, ranked_stream};

const BACKEND: &str = "sqlite";

/// Configuration of a [`SqliteCopypasteStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SqliteStoreConfig {
    /// Prefix of the table names, so several stores can share a database.
    pub collection_prefix: String,
    /// Maximum number of candidates retrieved from the full-text index per search.
    pub candidate_limit: usize,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self { collection_prefix: "copypaste".to_string(), candidate_limit: 1000 }
    }
}

impl SqliteStoreConfig {
    /// Create a new builder for constructing a [`SqliteStoreConfig`].
    pub fn builder() -> SqliteStoreConfigBuilder {
        SqliteStoreConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`SqliteStoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct SqliteStoreConfigBuilder {
    config: SqliteStoreConfig,
}

impl SqliteStoreConfigBuilder {
    /// Set the table name prefix.
    pub fn collection_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.collection_prefix = prefix.into();
        self
    }

    /// Set the maximum number of candidates retrieved per search.
    pub fn candidate_limit(mut self, limit: usize) -> Self {
        self.config.candidate_limit = limit;
        self
    }

    /// Build the [`SqliteStoreConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`CopypasteError::InvalidConfiguration`] if `candidate_limit == 0`
    /// or the prefix has no usable characters.
    pub fn build(self) -> Result<SqliteStoreConfig> {
        if self.config.candidate_limit == 0 {
            return Err(CopypasteError::InvalidConfiguration(
                "candidate_limit must be greater than zero".to_string(),
            ));
        }
        sanitize_prefix(&self.config.collection_prefix)?;
        Ok(self.config)
    }
}

/// Restrict a prefix to alphanumeric characters and underscores.
fn sanitize_prefix(prefix: &str) -> Result<String> {
    let sanitized: String =
        prefix.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect();
    if sanitized.is_empty() {
        return Err(CopypasteError::InvalidConfiguration(
            "collection prefix is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Whether `url` names an in-memory database that is not shared between
/// connections.
fn is_private_memory_url(url: &str) -> bool {
    (url.contains(":memory:") || url.contains("mode=memory")) && !url.contains("cache=shared")
}

/// Encode a shingle as a single FTS5 term.
///
/// Shingles are arbitrary strings and the tokenizer would split or drop
/// punctuation, so the index holds `s` followed by the lowercase hex of the
/// UTF-8 bytes instead.
fn index_term(shingle: &str) -> String {
    let mut term = String::with_capacity(1 + shingle.len() * 2);
    term.push('s');
    for byte in shingle.bytes() {
        let _ = write!(term, "{byte:02x}");
    }
    term
}

/// Build an FTS5 query matching any of the given shingles.
fn match_any(shingles: &BTreeSet<String>) -> String {
    shingles
        .iter()
        .map(|shingle| format!("\"{}\"", index_term(shingle)))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// A [`CopypasteStore`] backed by SQLite with an FTS5 shingle index.
///
/// Each store owns two tables:
/// `{prefix}_documents` (`id`, `meta`, `text_parts`, `shingles` as JSON) and
/// the FTS5 table `{prefix}_shingles` (`id`, space-separated hex-encoded `shingles`).
/// The tables are created on first use.
pub struct SqliteCopypasteStore {
    pool: SqlitePool,
    documents_table: String,
    shingles_table: String,
    candidate_limit: usize,
    initialized: OnceCell<()>,
}

impl SqliteCopypasteStore {
    /// Create a store on top of an existing connection pool.
    pub fn new(pool: SqlitePool, config: SqliteStoreConfig) -> Result<Self> {
        if config.candidate_limit == 0 {
            return Err(CopypasteError::InvalidConfiguration(
                "candidate_limit must be greater than zero".to_string(),
            ));
        }
        let prefix = sanitize_prefix(&config.collection_prefix)?;
        Ok(Self {
            pool,
            documents_table: format!("{prefix}_documents"),
            shingles_table: format!("{prefix}_shingles"),
            candidate_limit: config.candidate_limit,
            initialized: OnceCell::new(),
        })
    }

    /// Connect to the database at `url`, creating the file if missing.
    ///
    /// Private in-memory URLs are rejected: every pooled connection would
    /// open its own empty database. Use [`in_memory`](Self::in_memory).
    pub async fn connect(url: &str, config: SqliteStoreConfig) -> Result<Self> {
        if is_private_memory_url(url) {
            return Err(CopypasteError::InvalidConfiguration(format!(
                "{url} is a per-connection in-memory database, use SqliteCopypasteStore::in_memory"
            )));
        }
        let options = SqliteConnectOptions::from_str(url)
            .map_err(Self::map_err)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(Self::map_err)?;
        Self::new(pool, config)
    }

    /// Create a store in a private in-memory database.
    ///
    /// The pool keeps a single connection alive for the lifetime of the
    /// store, since an in-memory database disappears with its connection.
    pub async fn in_memory(config: SqliteStoreConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(Self::map_err)?;
        Self::new(pool, config)
    }

    fn map_err(e: sqlx::Error) -> CopypasteError {
        CopypasteError::Store { backend: BACKEND.to_string(), message: e.to_string() }
    }

    fn map_json_err(e: serde_json::Error) -> CopypasteError {
        CopypasteError::Store {
            backend: BACKEND.to_string(),
            message: format!("JSON error: {e}"),
        }
    }

    /// Create the tables once. Concurrent callers wait for the same creation.
    pub async fn init(&self) -> Result<()> {
        self.initialized.get_or_try_init(|| self.create_collection()).await?;
        Ok(())
    }

    async fn create_collection(&self) -> Result<()> {
        let documents_table = &self.documents_table;
        let shingles_table = &self.shingles_table;

        let create_documents = format!(
            "CREATE TABLE IF NOT EXISTS {documents_table} (\
                id TEXT PRIMARY KEY NOT NULL, \
                meta TEXT NOT NULL, \
                text_parts TEXT NOT NULL, \
                shingles TEXT NOT NULL\
            )"
        );
        let create_shingles = format!(
            r#"CREATE VIRTUAL TABLE IF NOT EXISTS {shingles_table} USING fts5(
                id UNINDEXED,
                shingles,
                tokenize = "unicode61 remove_diacritics 0"
            )"#
        );

        sqlx::query(&create_documents).execute(&self.pool).await.map_err(Self::map_err)?;
        sqlx::query(&create_shingles).execute(&self.pool).await.map_err(Self::map_err)?;

        debug!(documents = %documents_table, shingles = %shingles_table, "created sqlite collection");
        Ok(())
    }

    /// Two-phase search: index candidates, then exact scoring and ranking.
    async fn search(
        &self,
        doc: PartialShingledDocument,
        thresholds: SimilarityThresholds,
        limit: usize,
    ) -> Result<Vec<SimilarDocument>> {
        ensure_limit(limit)?;
        self.init().await?;
        let accepted = self.score_candidates(&doc, &thresholds).await?;
        Ok(rank(accepted, limit))
    }

    /// Retrieve index candidates and score them exactly.
    async fn score_candidates(
        &self,
        doc: &PartialShingledDocument,
        thresholds: &SimilarityThresholds,
    ) -> Result<Vec<SimilarDocument>> {
        if doc.shingles.is_empty() {
            return Ok(Vec::new());
        }

        let search_sql = format!(
            "SELECT d.id, d.shingles FROM (\
                SELECT id, rank FROM {shingles} \
                WHERE {shingles} MATCH ?1 AND id IS NOT ?2 \
                ORDER BY rank LIMIT ?3\
             ) AS c \
             JOIN {documents} AS d ON d.id = c.id",
            shingles = self.shingles_table,
            documents = self.documents_table,
        );
        let query = match_any(&doc.shingles);

        // The cursor lives in this scope and is closed on every return path.
        let mut rows = sqlx::query(&search_sql)
            .bind(query)
            .bind(doc.id.as_deref())
            .bind(self.candidate_limit as i64)
            .fetch(&self.pool);

        let mut candidates = 0usize;
        let mut accepted = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(Self::map_err)? {
            candidates += 1;
            let id: String = row.try_get("id").map_err(Self::map_err)?;
            let shingles_json: String = row.try_get("shingles").map_err(Self::map_err)?;
            let shingles: BTreeSet<String> =
                serde_json::from_str(&shingles_json).map_err(Self::map_json_err)?;
            if let Some(similar) = score_candidate(&id, &doc.shingles, &shingles, thresholds) {
                accepted.push(similar);
            }
        }

        debug!(
            collection = %self.documents_table,
            candidates,
            accepted = accepted.len(),
            "scored sqlite candidates"
        );
        Ok(accepted)
    }
}

#[async_trait]
impl CopypasteStore for SqliteCopypasteStore {
    async fn store_document(&self, doc: &ShingledDocument) -> Result<()> {
        self.init().await?;

        let meta = serde_json::to_string(&doc.meta).map_err(Self::map_json_err)?;
        let text_parts = serde_json::to_string(&doc.text_parts).map_err(Self::map_json_err)?;
        let shingles = serde_json::to_string(&doc.shingles).map_err(Self::map_json_err)?;
        let indexed = doc.shingles.iter().map(|s| index_term(s)).collect::<Vec<_>>().join(" ");

        let upsert_sql = format!(
            "INSERT INTO {} (id, meta, text_parts, shingles) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (id) DO UPDATE SET \
                meta = excluded.meta, \
                text_parts = excluded.text_parts, \
                shingles = excluded.shingles",
            self.documents_table
        );
        let unindex_sql = format!("DELETE FROM {} WHERE id = ?1", self.shingles_table);
        let index_sql = format!("INSERT INTO {} (id, shingles) VALUES (?1, ?2)", self.shingles_table);

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        sqlx::query(&upsert_sql)
            .bind(&doc.id)
            .bind(&meta)
            .bind(&text_parts)
            .bind(&shingles)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        sqlx::query(&unindex_sql).bind(&doc.id).execute(&mut *tx).await.map_err(Self::map_err)?;
        sqlx::query(&index_sql)
            .bind(&doc.id)
            .bind(&indexed)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        tx.commit().await.map_err(Self::map_err)?;

        debug!(
            document.id = %doc.id,
            shingle_count = doc.shingles.len(),
            "upserted document to sqlite"
        );
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.init().await?;

        let delete_document_sql = format!("DELETE FROM {} WHERE id = ?1", self.documents_table);
        let unindex_sql = format!("DELETE FROM {} WHERE id = ?1", self.shingles_table);

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        sqlx::query(&delete_document_sql).bind(id).execute(&mut *tx).await.map_err(Self::map_err)?;
        sqlx::query(&unindex_sql).bind(id).execute(&mut *tx).await.map_err(Self::map_err)?;
        tx.commit().await.map_err(Self::map_err)?;

        debug!(document.id = id, "deleted document from sqlite");
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        self.init().await?;

        let select_sql =
            format!("SELECT id, meta, text_parts FROM {} WHERE id = ?1", self.documents_table);
        let row = sqlx::query(&select_sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let meta_json: String = row.try_get("meta").map_err(Self::map_err)?;
        let text_parts_json: String = row.try_get("text_parts").map_err(Self::map_err)?;
        let meta: HashMap<String, String> =
            serde_json::from_str(&meta_json).map_err(Self::map_json_err)?;
        let text_parts: Vec<String> =
            serde_json::from_str(&text_parts_json).map_err(Self::map_json_err)?;

        Ok(Some(Document { id: row.try_get("id").map_err(Self::map_err)?, meta, text_parts }))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_prefix() {
        assert_eq!(sanitize_prefix("copy-paste.v2").unwrap(), "copy_paste_v2");
        assert!(sanitize_prefix("").is_err());
    }

    #[test]
    fn index_terms_are_alphanumeric() {
        assert_eq!(index_term("a_b"), "s615f62");
        assert_eq!(index_term("!!!"), "s212121");
        assert_eq!(index_term(""), "s");
        assert!(index_term("été \"x\"").chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn detects_private_memory_urls() {
        assert!(is_private_memory_url("sqlite::memory:"));
        assert!(is_private_memory_url("sqlite://copypaste.db?mode=memory"));
        assert!(!is_private_memory_url("sqlite://file:docs?mode=memory&cache=shared"));
        assert!(!is_private_memory_url("sqlite://copypaste.db"));
    }

    #[test]
    fn matches_any_encoded_shingle() {
        let shingles: BTreeSet<String> = ["!!!", "a_b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(match_any(&shingles), r#""s212121" OR "s615f62""#);
    }

    #[test]
    fn config_builder_rejects_zero_candidates() {
        assert!(SqliteStoreConfig::builder().candidate_limit(0).build().is_err());
        let config = SqliteStoreConfig::builder().collection_prefix("docs").build().unwrap();
        assert_eq!(config.collection_prefix, "docs");
        assert_eq!(config.candidate_limit, 1000);
    }
}
