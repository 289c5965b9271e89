//! Shingle generation: overlapping n-grams tagged with their size.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::document::Meta;
use crate::error::{CopypasteError, Result};
use crate::preprocess::Preprocessor;

/// Window sizes used when none are configured.
pub const DEFAULT_SHINGLE_SIZES: [usize; 2] = [3, 5];

/// Joins the tokens of one window.
pub const SHINGLE_SEPARATOR: &str = "_";

/// Build the shingles of `tokens` for every window size.
///
/// A shingle is the window's tokens joined with [`SHINGLE_SEPARATOR`] and
/// suffixed with `_s{size}`, so shingles of different sizes never collide.
/// Duplicates are dropped, keeping first-occurrence order. Sequences shorter
/// than a size produce no shingles for it.
pub fn shingles(tokens: &[String], sizes: &[usize]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for &size in sizes {
        if size == 0 {
            continue;
        }
        for window in tokens.windows(size) {
            let shingle = format!("{}{SHINGLE_SEPARATOR}s{size}", window.join(SHINGLE_SEPARATOR));
            if seen.insert(shingle.clone()) {
                out.push(shingle);
            }
        }
    }

    out
}

/// Final pipeline stage turning tokens into shingles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateShingles {
    sizes: Vec<usize>,
}

impl Default for CreateShingles {
    fn default() -> Self {
        Self { sizes: DEFAULT_SHINGLE_SIZES.to_vec() }
    }
}

impl CreateShingles {
    /// Create a stage producing shingles of every size in `sizes`.
    ///
    /// # Errors
    ///
    /// Returns [`CopypasteError::InvalidConfiguration`] if `sizes` is empty
    /// or contains a zero.
    pub fn new(sizes: Vec<usize>) -> Result<Self> {
        if sizes.is_empty() {
            return Err(CopypasteError::InvalidConfiguration(
                "shingle sizes must not be empty".to_string(),
            ));
        }
        if sizes.contains(&0) {
            return Err(CopypasteError::InvalidConfiguration(format!(
                "shingle sizes must be positive, got {sizes:?}"
            )));
        }
        Ok(Self { sizes })
    }

    /// The configured window sizes.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }
}

#[async_trait]
impl Preprocessor for CreateShingles {
    async fn process(&self, parts: Vec<String>, _meta: &Meta) -> Result<Vec<String>> {
        Ok(shingles(&parts, &self.sizes))
    }
}
