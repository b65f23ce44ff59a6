//! Batch outcome.

use std::path::PathBuf;

use chamadas_admission_models::AdmissionListJob;
use chamadas_fetch::FetchStatus;

use crate::JobError;

/// A job that produced its CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub job: AdmissionListJob,
    /// Whether the PDF came from the cache.
    pub fetch: FetchStatus,
    /// Number of data rows written.
    pub rows: usize,
    pub csv_path: PathBuf,
}

/// A job that failed, with the reason.
#[derive(Debug)]
pub struct JobFailure {
    pub job: AdmissionListJob,
    pub error: JobError,
}

/// Outcome of [`crate::Converter::run_all`], in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<JobSummary>,
    pub failed: Vec<JobFailure>,
}

impl BatchReport {
    /// Returns `true` if no job failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of rows written across all successful jobs.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.succeeded.iter().map(|s| s.rows).sum()
    }

    /// Logs one line per job followed by a totals line.
    pub fn log_summary(&self) {
        for summary in &self.succeeded {
            log::info!(
                "  ok    {}: {} row(s) -> {}",
                summary.job,
                summary.rows,
                summary.csv_path.display()
            );
        }
        for failure in &self.failed {
            log::error!(
                "  FAIL  {}: {}: {}",
                failure.job,
                failure.error.kind(),
                failure.error
            );
        }
        log::info!(
            "{} succeeded, {} failed, {} row(s) written",
            self.succeeded.len(),
            self.failed.len(),
            self.total_rows()
        );
    }
}
