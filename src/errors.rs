/*!
 * Error types for the docfilter engine.
 *
 * This module contains custom error types for the different failure
 * classes of the engine, using the thiserror crate for ergonomic error
 * definitions. The taxonomy follows the engine's propagation policy:
 * input and configuration errors are fatal, reference-integrity errors
 * are recovered locally by the merge stage, and encoding-capability
 * gaps are never errors at all.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Fatal errors raised while reading a source document.
///
/// These abort the current document; event production stops immediately
/// and no partial event is emitted.
#[derive(Error, Debug)]
pub enum InputError {
    /// The source bytes could not be parsed into a document tree
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// A required structural attribute is missing
    #[error("Missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element the attribute was expected on
        element: String,
        /// Name of the missing attribute
        attribute: String,
    },

    /// One block carries more inline codes than the coded text can
    /// address with marker index characters
    #[error("Too many inline codes in one block")]
    TooManyInlineCodes,

    /// A structural reference could not be resolved while reading
    #[error("Unresolvable reference target '{target}' in item '{item_id}'")]
    BadReferenceTarget {
        /// Generated id of the item being read
        item_id: String,
        /// The reference target that failed to resolve
        target: String,
    },
}

/// Merge-time reference-integrity errors.
///
/// These are recovered in place: the offending substitution is skipped
/// and logged, the rest of the document completes, and the condition is
/// surfaced through the writer statistics.
#[derive(Error, Debug)]
pub enum ReferenceError {
    /// A stored back-reference key has no snapshot or referent unit at
    /// merge time
    #[error("No snapshot or referent for reference key '{key}'")]
    MissingReferent {
        /// The reference key that could not be resolved
        key: String,
    },
}

/// Errors detected at configuration time, before traversal starts
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The quote policy selector has an unknown value
    #[error("Unknown quote policy: {0}")]
    UnknownQuotePolicy(String),

    /// The output line-break string is not set
    #[error("Output line break is not set")]
    MissingLineBreak,

    /// The declared output encoding is not a known charset label
    #[error("Unknown output encoding: {0}")]
    UnknownEncoding(String),

    /// A locale tag does not look like a BCP-47 tag
    #[error("Invalid locale tag: {0}")]
    InvalidLocale(String),

    /// Any other bad option value
    #[error("Invalid value for '{option}': {message}")]
    InvalidValue {
        /// Name of the offending option
        option: String,
        /// What was wrong with it
        message: String,
    },
}

/// Main error type that wraps all engine failure classes
#[derive(Error, Debug)]
pub enum FilterError {
    /// Fatal error reading the source document
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Merge-time reference-integrity error
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility conversion for callers working with anyhow at the boundary
impl From<anyhow::Error> for FilterError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
