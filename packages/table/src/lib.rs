#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns the partial tables of one admission list into a single CSV.
//!
//! - [`reconcile`] finds the candidate-name column of a region and repairs
//!   it when the header landed over the wrong column.
//! - [`ResultTableBuilder`] aligns every region with the schema of the first
//!   non-empty one and accumulates the rows.
//! - [`write_csv`] materializes the result.

pub mod accumulate;
pub mod output;
pub mod reconcile;

pub use accumulate::ResultTableBuilder;
pub use output::write_csv;
pub use reconcile::{NameColumnMatcher, Reconciled, reconcile_name_column};

/// Errors produced while normalizing or writing a table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// No header matches the institution's name-column pattern.
    #[error("no column matches name pattern /{pattern}/ (headers: {headers:?})")]
    NoNameColumn {
        /// The pattern that was searched for.
        pattern: String,
        /// Headers of the offending region.
        headers: Vec<String>,
    },

    /// A region cannot be aligned with the canonical schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch {
        /// What could not be aligned.
        message: String,
    },

    /// The name-column pattern is not a valid regex.
    #[error("invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Filesystem failure while writing the output.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being written.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// CSV serialization failure.
    #[error("CSV error on {path}: {source}")]
    Csv {
        /// File being written.
        path: String,
        /// Underlying error.
        source: csv::Error,
    },
}

impl TableError {
    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }
}
