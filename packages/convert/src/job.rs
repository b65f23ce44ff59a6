//! Running one admission list job, and a batch of them.

use chamadas_admission_models::{AdmissionListJob, RegionSpec, ResultTable};
use chamadas_fetch::{Fetcher, PdfSource};
use chamadas_layout::LayoutLoader;
use chamadas_pdf::{PdfDocument, RegionExtractor};
use chamadas_table::{NameColumnMatcher, ResultTableBuilder, reconcile_name_column, write_csv};

use crate::progress::ProgressCallback;
use crate::{BatchReport, Directories, JobError, JobFailure, JobSummary};

/// Extracts every region in order and accumulates the normalized rows.
///
/// Regions without data rows are skipped before name-column
/// identification, so a blank page never fails the job.
///
/// # Errors
///
/// Returns [`JobError::Extraction`] if a region cannot be extracted or has
/// no name column, and [`JobError::SchemaMismatch`] if a region cannot be
/// aligned with the first non-empty one.
pub fn extract_table<E: RegionExtractor>(
    extractor: &mut E,
    regions: &[RegionSpec],
    matcher: &NameColumnMatcher,
) -> Result<ResultTable, JobError> {
    let mut builder = ResultTableBuilder::new();

    for (i, region) in regions.iter().enumerate() {
        let partial = extractor.extract_region(region)?;

        if partial.is_empty() {
            log::debug!("  region {i} (page {}): no rows", region.page);
            continue;
        }

        let reconciled = reconcile_name_column(partial, matcher)?;
        let added = builder.push(i, reconciled)?;
        log::debug!("  region {i} (page {}): {added} row(s)", region.page);
    }

    Ok(builder.finish())
}

/// Converts admission lists, sharing one download cache and one set of
/// directories.
#[derive(Debug)]
pub struct Converter<S> {
    fetcher: Fetcher<S>,
    layouts: LayoutLoader,
    dirs: Directories,
}

impl<S: PdfSource> Converter<S> {
    #[must_use]
    pub fn new(fetcher: Fetcher<S>, dirs: Directories) -> Self {
        Self {
            fetcher,
            layouts: LayoutLoader::new(dirs.config_dir.clone()),
            dirs,
        }
    }

    #[must_use]
    pub const fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    /// Runs one job: layout, download, extraction, CSV.
    ///
    /// # Errors
    ///
    /// Returns the first [`JobError`] encountered. A failed job writes no
    /// CSV.
    pub async fn run_job(&self, job: &AdmissionListJob) -> Result<JobSummary, JobError> {
        let regions = self.layouts.load(job)?;
        log::debug!("[{job}] {} region(s)", regions.len());

        let pdf_path = job.pdf_path(&self.dirs.downloads_dir);
        let fetch = self.fetcher.fetch(&job.url, &pdf_path).await?;

        let matcher = NameColumnMatcher::new(job.institution.name_column_pattern())?;
        let path = pdf_path.clone();
        let table = tokio::task::spawn_blocking(move || -> Result<ResultTable, JobError> {
            let mut document = PdfDocument::open(&path)?;
            extract_table(&mut document, &regions, &matcher)
        })
        .await??;

        if table.is_empty() {
            log::warn!("[{job}] no rows found in any region; writing an empty CSV");
        }

        let csv_path = job.csv_path(&self.dirs.output_dir);
        write_csv(&table, &csv_path)?;

        log::info!("[{job}] {} row(s) -> {}", table.len(), csv_path.display());

        Ok(JobSummary {
            job: job.clone(),
            fetch,
            rows: table.len(),
            csv_path,
        })
    }

    /// Runs every job in order. A failing job is logged and recorded; the
    /// remaining jobs still run.
    pub async fn run_all(
        &self,
        jobs: &[AdmissionListJob],
        progress: &dyn ProgressCallback,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        progress.set_total(jobs.len() as u64);

        for job in jobs {
            progress.set_message(job.to_string());

            match self.run_job(job).await {
                Ok(summary) => report.succeeded.push(summary),
                Err(error) => {
                    log::error!("[{job}] {}: {error}", error.kind());
                    report.failed.push(JobFailure {
                        job: job.clone(),
                        error,
                    });
                }
            }

            progress.inc(1);
        }

        progress.finish(format!(
            "{} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        ));

        report
    }
}
