//! Preprocessor trait and composition of preprocessing stages.

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::Meta;
use crate::error::Result;

/// A stage of the text preprocessing pipeline.
///
/// Every stage maps a sequence of strings to a new sequence of strings. The
/// first stage receives the raw text parts of a document, the last one is
/// expected to emit shingles. Stages are async so they can wait on external
/// language resources.
///
/// # Example
///
/// ```rust,ignore
/// use copypaste::{compose, CreateShingles, Preprocessor, Tokenize};
///
/// let pipeline = compose(vec![Arc::new(Tokenize::new()), Arc::new(CreateShingles::default())]);
/// let shingles = pipeline.process(vec!["some text here".into()], &Meta::new()).await?;
/// ```
#[async_trait]
pub trait Preprocessor: Send + Sync {
    /// Transform `parts`. `meta` is the metadata of the document being processed.
    async fn process(&self, parts: Vec<String>, meta: &Meta) -> Result<Vec<String>>;
}

/// A preprocessor that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

#[async_trait]
impl Preprocessor for Identity {
    async fn process(&self, parts: Vec<String>, _meta: &Meta) -> Result<Vec<String>> {
        Ok(parts)
    }
}

/// Stages executed strictly in order, each feeding the next.
pub struct Chain {
    stages: Vec<Arc<dyn Preprocessor>>,
}

#[async_trait]
impl Preprocessor for Chain {
    async fn process(&self, parts: Vec<String>, meta: &Meta) -> Result<Vec<String>> {
        let mut current = parts;
        for stage in &self.stages {
            current = stage.process(current, meta).await?;
        }
        Ok(current)
    }
}

/// Compose stages into a single preprocessor.
///
/// No stages yield [`Identity`]; a single stage is returned as is.
pub fn compose(mut stages: Vec<Arc<dyn Preprocessor>>) -> Arc<dyn Preprocessor> {
    match stages.len() {
        0 => Arc::new(Identity),
        1 => stages.remove(0),
        _ => Arc::new(Chain { stages }),
    }
}
