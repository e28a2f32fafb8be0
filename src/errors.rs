/*!
 * Error types for the sapsplit application.
 *
 * Fatal conditions are variants of `SplitError`. Recoverable anomalies
 * (a contributor missing from the table, an existing destination directory)
 * are logged as warnings by the module that detects them and never reach here.
 */

use thiserror::Error;

/// Errors that abort a split, arrange or diff run
#[derive(Error, Debug)]
pub enum SplitError {
    /// A required field is absent from an input record
    #[error("Missing field '{field}' in {record}")]
    MissingField {
        /// Record (file or contributor) that lacks the field
        record: String,
        /// Name of the missing field
        field: String,
    },

    /// The authoritative table places one contributor in conflicting subsets
    #[error("Contributor {contributor} is assigned to lists {lists:?} spanning more than one subset")]
    AmbiguousAssignment {
        /// Contributor identifier as written in the table
        contributor: String,
        /// All list numbers recorded for the contributor
        lists: Vec<u32>,
    },

    /// A list number has no subset in the configured list table
    #[error("List {0} is not mapped to any subset")]
    UnknownList(u32),

    /// An expected single-match glob matched zero or several files
    #[error("Expected exactly one file matching '{pattern}', found {matches}")]
    GlobPattern {
        /// Pattern that was searched
        pattern: String,
        /// Number of files that matched
        matches: usize,
    },

    /// The contributor table could not be interpreted
    #[error("Invalid contributor table: {0}")]
    InvalidTable(String),

    /// The configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error decoding or encoding JSON
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for SplitError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for SplitError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<csv::Error> for SplitError {
    fn from(error: csv::Error) -> Self {
        Self::InvalidTable(error.to_string())
    }
}
