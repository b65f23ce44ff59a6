//! Links file: which admission lists exist and where they are published.
//!
//! ```json
//! {
//!   "UFRJ": { "2023_1": "https://example.com/ufrj-2023-1.pdf" },
//!   "UFMG": { "2023_1": "https://example.com/ufmg-2023-1.pdf" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr as _;

use chamadas_admission_models::{AdmissionListJob, Institution};

use crate::{LayoutError, read_config};

/// Loads every configured admission list from the links file.
///
/// Jobs are returned sorted by institution, then period.
///
/// # Errors
///
/// Returns [`LayoutError::NotFound`] if the file does not exist and
/// [`LayoutError::Malformed`] if it is not a two-level string map, names an
/// unknown institution, uses an unusable period code or has an empty URL.
pub fn load_jobs(path: &Path) -> Result<Vec<AdmissionListJob>, LayoutError> {
    let text = read_config(path)?;
    parse_jobs(&text, path)
}

/// Parses the links file contents. `path` is only used in error messages.
///
/// # Errors
///
/// See [`load_jobs`].
pub fn parse_jobs(text: &str, path: &Path) -> Result<Vec<AdmissionListJob>, LayoutError> {
    let links: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(text)
        .map_err(|e| LayoutError::malformed(path, format!("invalid links file: {e}")))?;

    let mut jobs = Vec::new();

    for (code, periods) in &links {
        let institution = Institution::from_str(code).map_err(|_| {
            LayoutError::malformed(
                path,
                format!(
                    "unknown institution {code:?} (expected one of {})",
                    Institution::ALL
                        .iter()
                        .map(Institution::as_ref)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })?;

        for (period, url) in periods {
            if url.trim().is_empty() {
                return Err(LayoutError::malformed(
                    path,
                    format!("{code} {period}: empty URL"),
                ));
            }
            let job = AdmissionListJob::new(institution, period, url.trim())
                .map_err(|e| LayoutError::malformed(path, format!("{code}: {e}")))?;
            jobs.push(job);
        }
    }

    jobs.sort();

    log::debug!("Loaded {} admission list(s) from {}", jobs.len(), path.display());

    Ok(jobs)
}
