//! Near-duplicate ("copypasted") text detection.
//!
//! This crate provides:
//! - A text preprocessing pipeline turning documents into shingle sets
//! - [`CopypasteDetector`], remembering documents and checking new ones against them
//! - The [`CopypasteStore`] abstraction with an exhaustive in-memory store and,
//!   behind the `sqlite` feature, an indexed SQLite FTS5 store
//!
//! Similarity is the Jaccard index of shingle sets. A stored document is
//! reported when it strictly exceeds at least one enabled threshold.

pub mod config;
pub mod detector;
pub mod document;
pub mod error;
pub mod language;
pub mod memory;
pub mod preprocess;
pub mod shingles;
pub mod similarity;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod stopwords;
pub mod store;

pub use config::{CopypasteConfig, CopypasteConfigBuilder, SimilarityThresholds};
pub use detector::{CopypasteDetector, CopypasteDetectorBuilder};
pub use document::{
    Document, Meta, PartialDocument, PartialShingledDocument, ShingledDocument, SimilarDocument,
};
pub use error::{CopypasteError, Result};
pub use language::{RemoveStopWords, Stem, Tokenize, tokenize_text};
pub use memory::MemoryCopypasteStore;
pub use preprocess::{Chain, Identity, Preprocessor, compose};
pub use shingles::{CreateShingles, DEFAULT_SHINGLE_SIZES, SHINGLE_SEPARATOR};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteCopypasteStore, SqliteStoreConfig, SqliteStoreConfigBuilder};
pub use stopwords::ENGLISH_STOP_WORDS;
pub use store::{CopypasteStore, SimilarStream};

pub use rust_stemmers::Algorithm;
