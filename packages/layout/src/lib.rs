#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Admission list and Tabula region configuration loading.
//!
//! Two kinds of static JSON drive a conversion run:
//!
//! - the links file ([`links`]), mapping institution code to period code to
//!   the URL where that admission list is published;
//! - one Tabula export per admission list ([`regions`]), listing the page
//!   rectangles that hold the candidate table.
//!
//! Both are validated up front so that a broken configuration fails before
//! any download or extraction work starts.

pub mod links;
pub mod regions;

use std::path::Path;

pub use links::load_jobs;
pub use regions::{LayoutLoader, parse_regions};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The configuration file does not exist.
    #[error("configuration not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// The configuration exists but is not usable.
    #[error("malformed configuration {path}: {message}")]
    Malformed {
        /// Path of the offending file.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// The configuration exists but could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl LayoutError {
    pub(crate) fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

/// Reads a configuration file, mapping a missing file to
/// [`LayoutError::NotFound`].
pub(crate) fn read_config(path: &Path) -> Result<String, LayoutError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LayoutError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            LayoutError::Io {
                path: path.display().to_string(),
                source: e,
            }
        }
    })
}
