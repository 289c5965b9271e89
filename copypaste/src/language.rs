//! English language stages: tokenization, stop word removal and stemming.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer};

use crate::document::Meta;
use crate::error::Result;
use crate::preprocess::Preprocessor;
use crate::stopwords::ENGLISH_STOP_WORDS;

/// Split text into lowercase word tokens.
///
/// Tokens are maximal runs of alphanumeric characters. Apostrophes inside a
/// word are dropped without splitting it, so `"jest's"` becomes `"jests"`.
pub fn tokenize_text(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if (c == '\'' || c == '\u{2019}') && !current.is_empty() {
            continue;
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Splits every text part into word tokens and flattens them into one sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenize;

impl Tokenize {
    /// Create a new tokenizer stage.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Preprocessor for Tokenize {
    async fn process(&self, parts: Vec<String>, _meta: &Meta) -> Result<Vec<String>> {
        Ok(parts.iter().flat_map(|part| tokenize_text(part)).collect())
    }
}

/// Removes tokens found in a stop word set, preserving the order of the rest.
///
/// Uses [`ENGLISH_STOP_WORDS`] unless replaced with
/// [`with_stop_words`](RemoveStopWords::with_stop_words).
#[derive(Debug, Clone)]
pub struct RemoveStopWords {
    words: HashSet<String>,
}

impl Default for RemoveStopWords {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoveStopWords {
    /// Filter with the bundled English list.
    pub fn new() -> Self {
        Self::with_stop_words(ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Filter with the given list instead of the bundled one.
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect() }
    }

    /// Extend the current list.
    pub fn add_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    /// Whether `token` is filtered out.
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

#[async_trait]
impl Preprocessor for RemoveStopWords {
    async fn process(&self, parts: Vec<String>, _meta: &Meta) -> Result<Vec<String>> {
        Ok(parts.into_iter().filter(|token| !self.is_stop_word(token)).collect())
    }
}

/// Reduces every token to its Snowball stem.
pub struct Stem {
    stemmer: Stemmer,
}

impl Stem {
    /// Stem with the given Snowball algorithm.
    pub fn new(algorithm: Algorithm) -> Self {
        Self { stemmer: Stemmer::create(algorithm) }
    }

    /// Stem with the English (Porter2) algorithm.
    pub fn english() -> Self {
        Self::new(Algorithm::English)
    }
}

impl Default for Stem {
    fn default() -> Self {
        Self::english()
    }
}

#[async_trait]
impl Preprocessor for Stem {
    async fn process(&self, parts: Vec<String>, _meta: &Meta) -> Result<Vec<String>> {
        Ok(parts.iter().map(|token| self.stemmer.stem(token).into_owned()).collect())
    }
}
