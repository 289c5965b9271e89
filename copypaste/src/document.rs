//! Data types for documents, their fingerprints, and similarity results.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Caller metadata attached to a document. Never interpreted by the detector.
pub type Meta = HashMap<String, String>;

/// A remembered text document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Caller-assigned unique identifier.
    pub id: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub meta: Meta,
    /// The raw text, possibly split into several parts (e.g. paragraphs).
    pub text_parts: Vec<String>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(id: impl Into<String>, text_parts: Vec<String>) -> Self {
        Self { id: id.into(), meta: Meta::new(), text_parts }
    }

    /// Attach metadata to the document.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }
}

/// A document submitted for checking.
///
/// The id is optional; when present, a stored document with the same id is
/// excluded from the results so a remembered document never matches itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PartialDocument {
    /// Optional id of the document being checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub meta: Meta,
    /// The raw text parts.
    pub text_parts: Vec<String>,
}

impl PartialDocument {
    /// Create an anonymous document with empty metadata.
    pub fn new(text_parts: Vec<String>) -> Self {
        Self { id: None, meta: Meta::new(), text_parts }
    }

    /// Set the id used for self-exclusion.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<Document> for PartialDocument {
    fn from(doc: Document) -> Self {
        Self { id: Some(doc.id), meta: doc.meta, text_parts: doc.text_parts }
    }
}

/// A [`Document`] together with its shingle fingerprint.
///
/// Only the detector builds these; stores persist the shingles but never
/// hand them back through [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShingledDocument {
    /// Caller-assigned unique identifier.
    pub id: String,
    /// Key-value metadata associated with the document.
    pub meta: Meta,
    /// The raw text parts.
    pub text_parts: Vec<String>,
    /// The deduplicated shingle set.
    pub shingles: BTreeSet<String>,
}

impl ShingledDocument {
    /// Strip the fingerprint, leaving the public document shape.
    pub fn to_document(&self) -> Document {
        Document {
            id: self.id.clone(),
            meta: self.meta.clone(),
            text_parts: self.text_parts.clone(),
        }
    }
}

/// A [`PartialDocument`] together with its shingle fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartialShingledDocument {
    /// Optional id used for self-exclusion.
    pub id: Option<String>,
    /// Key-value metadata associated with the document.
    pub meta: Meta,
    /// The raw text parts.
    pub text_parts: Vec<String>,
    /// The deduplicated shingle set.
    pub shingles: BTreeSet<String>,
}

impl From<ShingledDocument> for PartialShingledDocument {
    fn from(doc: ShingledDocument) -> Self {
        Self {
            id: Some(doc.id),
            meta: doc.meta,
            text_parts: doc.text_parts,
            shingles: doc.shingles,
        }
    }
}

/// A stored document found to overlap with a checked one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarDocument {
    /// Id of the stored document.
    pub id: String,
    /// Number of shingles shared with the checked document.
    pub abs_similarity: usize,
    /// Jaccard index of the two shingle sets, in `[0, 1]`.
    pub rel_similarity: f64,
}
