//! Configuration for the copypaste detector.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CopypasteError, Result};
use crate::language::{RemoveStopWords, Stem, Tokenize};
use crate::preprocess::{Preprocessor, compose};
use crate::shingles::{CreateShingles, DEFAULT_SHINGLE_SIZES};

/// Minimal similarity a stored document must exceed to be reported.
///
/// A threshold is disabled when it is not positive. A document is accepted
/// when it strictly exceeds at least one enabled threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimilarityThresholds {
    /// Minimal number of shared shingles; `-1` disables it.
    pub abs_similarity: i64,
    /// Minimal Jaccard index; `0.0` disables it.
    pub rel_similarity: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self { abs_similarity: -1, rel_similarity: 0.5 }
    }
}

impl SimilarityThresholds {
    /// Create thresholds, failing if neither of them is enabled.
    pub fn new(abs_similarity: i64, rel_similarity: f64) -> Result<Self> {
        let thresholds = Self { abs_similarity, rel_similarity };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Only a relative threshold.
    pub fn relative(rel_similarity: f64) -> Result<Self> {
        Self::new(-1, rel_similarity)
    }

    /// Only an absolute threshold.
    pub fn absolute(abs_similarity: i64) -> Result<Self> {
        Self::new(abs_similarity, 0.0)
    }

    /// Check that at least one threshold is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`CopypasteError::InvalidConfiguration`] when `abs_similarity <= 0`
    /// and `rel_similarity` is outside `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        let abs_enabled = self.abs_similarity > 0;
        let rel_enabled = self.rel_similarity > 0.0 && self.rel_similarity < 1.0;
        if abs_enabled || rel_enabled {
            Ok(())
        } else {
            Err(CopypasteError::InvalidConfiguration(format!(
                "at least one similarity threshold must be enabled \
                 (abs_similarity = {}, rel_similarity = {})",
                self.abs_similarity, self.rel_similarity
            )))
        }
    }

    /// Whether a candidate with the given scores passes.
    ///
    /// Comparisons are strict: a score equal to its threshold is rejected.
    pub fn accepts(&self, abs_similarity: usize, rel_similarity: f64) -> bool {
        if self.rel_similarity > 0.0 && rel_similarity > self.rel_similarity {
            return true;
        }
        // Saturate so huge intersections never wrap negative.
        let abs = i64::try_from(abs_similarity).unwrap_or(i64::MAX);
        self.abs_similarity > 0 && abs > self.abs_similarity
    }
}

/// Configuration of the detector and of its default English pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CopypasteConfig {
    /// Thresholds applied to every check.
    pub thresholds: SimilarityThresholds,
    /// Window sizes of the generated shingles.
    pub shingle_sizes: Vec<usize>,
    /// Replaces the bundled English stop word list when set.
    pub stop_words: Option<Vec<String>>,
    /// Added to the stop word list in use.
    pub extra_stop_words: Vec<String>,
    /// Whether tokens are stemmed before shingling.
    pub stemming: bool,
    /// Number of results returned by [`CopypasteDetector::check`](crate::CopypasteDetector::check).
    pub default_similar_limit: usize,
}

impl Default for CopypasteConfig {
    fn default() -> Self {
        Self {
            thresholds: SimilarityThresholds::default(),
            shingle_sizes: DEFAULT_SHINGLE_SIZES.to_vec(),
            stop_words: None,
            extra_stop_words: Vec::new(),
            stemming: true,
            default_similar_limit: 1,
        }
    }
}

impl CopypasteConfig {
    /// Create a new builder for constructing a [`CopypasteConfig`].
    pub fn builder() -> CopypasteConfigBuilder {
        CopypasteConfigBuilder::default()
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns [`CopypasteError::InvalidConfiguration`] if:
    /// - both thresholds are disabled
    /// - `shingle_sizes` is empty or contains a zero
    /// - `default_similar_limit == 0`
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        CreateShingles::new(self.shingle_sizes.clone())?;
        if self.default_similar_limit == 0 {
            return Err(CopypasteError::InvalidConfiguration(
                "default_similar_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the English pipeline described by this configuration:
    /// tokenize, remove stop words, stem (if enabled), create shingles.
    pub fn preprocessor(&self) -> Result<Arc<dyn Preprocessor>> {
        let mut stop_words = match &self.stop_words {
            Some(words) => RemoveStopWords::with_stop_words(words.iter().cloned()),
            None => RemoveStopWords::new(),
        };
        stop_words = stop_words.add_stop_words(self.extra_stop_words.iter().cloned());

        let mut stages: Vec<Arc<dyn Preprocessor>> =
            vec![Arc::new(Tokenize::new()), Arc::new(stop_words)];
        if self.stemming {
            stages.push(Arc::new(Stem::english()));
        }
        stages.push(Arc::new(CreateShingles::new(self.shingle_sizes.clone())?));
        Ok(compose(stages))
    }
}

/// Builder for constructing a validated [`CopypasteConfig`].
#[derive(Debug, Clone, Default)]
pub struct CopypasteConfigBuilder {
    config: CopypasteConfig,
}

impl CopypasteConfigBuilder {
    /// Set the similarity thresholds.
    pub fn thresholds(mut self, thresholds: SimilarityThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Set the shingle window sizes.
    pub fn shingle_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.config.shingle_sizes = sizes;
        self
    }

    /// Replace the bundled stop word list.
    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stop_words = Some(words.into_iter().map(Into::into).collect());
        self
    }

    /// Add words to the stop word list.
    pub fn extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extra_stop_words.extend(words.into_iter().map(Into::into));
        self
    }

    /// Enable or disable stemming.
    pub fn stemming(mut self, enabled: bool) -> Self {
        self.config.stemming = enabled;
        self
    }

    /// Set the number of results returned when no explicit limit is given.
    pub fn default_similar_limit(mut self, limit: usize) -> Self {
        self.config.default_similar_limit = limit;
        self
    }

    /// Build the [`CopypasteConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`CopypasteConfig::validate`].
    pub fn build(self) -> Result<CopypasteConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_valid() {
        assert!(SimilarityThresholds::default().validate().is_ok());
    }

    #[test]
    fn rejects_both_thresholds_disabled() {
        assert!(matches!(
            SimilarityThresholds::new(-1, 0.0),
            Err(CopypasteError::InvalidConfiguration(_))
        ));
        assert!(SimilarityThresholds::new(0, 1.0).is_err());
        assert!(SimilarityThresholds::new(3, 0.0).is_ok());
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let thresholds = SimilarityThresholds::new(4, 0.5).unwrap();
        assert!(!thresholds.accepts(4, 0.5));
        assert!(thresholds.accepts(5, 0.1));
        assert!(thresholds.accepts(1, 0.51));
    }

    #[test]
    fn disabled_threshold_never_accepts() {
        let thresholds = SimilarityThresholds::relative(0.5).unwrap();
        assert!(!thresholds.accepts(1_000, 0.2));
    }

    #[test]
    fn builder_validates_sizes_and_limit() {
        assert!(CopypasteConfig::builder().shingle_sizes(vec![]).build().is_err());
        assert!(CopypasteConfig::builder().shingle_sizes(vec![2, 0]).build().is_err());
        assert!(CopypasteConfig::builder().default_similar_limit(0).build().is_err());
        let config = CopypasteConfig::builder()
            .shingle_sizes(vec![2])
            .extra_stop_words(["lorem"])
            .build()
            .unwrap();
        assert_eq!(config.shingle_sizes, vec![2]);
        assert_eq!(config.extra_stop_words, vec!["lorem".to_string()]);
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let config: CopypasteConfig =
            serde_json::from_str(r#"{"thresholds": {"abs_similarity": 10, "rel_similarity": 0.0}}"#)
                .unwrap();
        assert_eq!(config.thresholds.abs_similarity, 10);
        assert_eq!(config.shingle_sizes, vec![3, 5]);
        assert!(config.validate().is_ok());
    }
}
