//! Error types for the `copypaste` crate.

use thiserror::Error;

/// Errors that can occur while remembering or checking documents.
#[derive(Debug, Error)]
pub enum CopypasteError {
    /// The detector or one of its components was configured inconsistently.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A request argument was rejected before any work was done.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Preprocessing produced no shingles for the given text.
    #[error("Text is too short")]
    TextTooShort,

    /// No document with the requested id is stored.
    #[error("Document \"{id}\" not found")]
    DocumentNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A preprocessing stage failed.
    #[error("Preprocessing error ({stage}): {message}")]
    Preprocessing {
        /// The stage that produced the error.
        stage: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the store backend.
    #[error("Store error ({backend}): {message}")]
    Store {
        /// The store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for copypaste operations.
pub type Result<T> = std::result::Result<T, CopypasteError>;
