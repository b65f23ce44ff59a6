#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Admission list conversion.
//!
//! A job runs strictly downstream: its region layout is loaded first (so a
//! missing layout costs no network traffic), then the PDF is fetched into
//! the download cache, every region is extracted and normalized, and the
//! accumulated table is written to CSV once.
//!
//! [`Converter::run_all`] runs jobs one after another. A failed job is
//! recorded in the [`BatchReport`] and the batch moves on.

pub mod job;
pub mod progress;
pub mod report;

use std::path::PathBuf;

use chamadas_admission_models::{AdmissionListJob, Institution};
use chamadas_fetch::DownloadError;
use chamadas_layout::LayoutError;
use chamadas_pdf::PdfError;
use chamadas_table::TableError;

pub use job::{Converter, extract_table};
pub use report::{BatchReport, JobFailure, JobSummary};

/// Why a single job failed.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The PDF could not be downloaded.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The region layout is missing or unusable.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The PDF could not be read or has no recognizable name column.
    #[error("extraction failed: {0}")]
    Extraction(Box<dyn std::error::Error + Send + Sync>),

    /// A region could not be aligned with the rest of the table.
    #[error(transparent)]
    SchemaMismatch(TableError),

    /// The CSV could not be written.
    #[error("failed to write output: {0}")]
    Output(TableError),
}

impl JobError {
    /// Error category shown in reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Download(_) => "DownloadError",
            Self::Layout(LayoutError::NotFound { .. }) => "ConfigNotFoundError",
            Self::Layout(LayoutError::Malformed { .. } | LayoutError::Io { .. }) => {
                "ConfigMalformedError"
            }
            Self::Extraction(_) => "ExtractionError",
            Self::SchemaMismatch(_) => "SchemaMismatchError",
            Self::Output(_) => "OutputError",
        }
    }
}

impl From<PdfError> for JobError {
    fn from(e: PdfError) -> Self {
        Self::Extraction(Box::new(e))
    }
}

impl From<tokio::task::JoinError> for JobError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Extraction(Box::new(e))
    }
}

impl From<TableError> for JobError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::NoNameColumn { .. } | TableError::InvalidPattern(_) => {
                Self::Extraction(Box::new(e))
            }
            TableError::SchemaMismatch { .. } => Self::SchemaMismatch(e),
            TableError::Io { .. } | TableError::Csv { .. } => Self::Output(e),
        }
    }
}

/// Where job files are read from and written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    /// Holds the `tabula-{stem}.json` layouts.
    pub config_dir: PathBuf,
    /// Download cache for the PDFs.
    pub downloads_dir: PathBuf,
    /// Destination of the CSVs.
    pub output_dir: PathBuf,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            downloads_dir: PathBuf::from("downloads"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Keeps the jobs of the given institutions. An empty filter keeps every
/// job.
#[must_use]
pub fn filter_jobs(jobs: Vec<AdmissionListJob>, only: &[Institution]) -> Vec<AdmissionListJob> {
    if only.is_empty() {
        return jobs;
    }
    jobs.into_iter()
        .filter(|job| only.contains(&job.institution))
        .collect()
}
