//! Tabula region exports.
//!
//! Tabula's "export selections" writes a JSON array with one object per
//! selected rectangle:
//!
//! ```json
//! [
//!   { "page": 1, "extraction_method": "stream",
//!     "x1": 36.7, "x2": 558.2, "y1": 180.4, "y2": 790.1,
//!     "width": 521.5, "height": 609.7 }
//! ]
//! ```
//!
//! `x1`/`y1` is the top-left corner and `x2`/`y2` the bottom-right corner,
//! in points from the top-left of the page. Only `page` and the four
//! corners are used.

use std::path::{Path, PathBuf};

use chamadas_admission_models::{AdmissionListJob, RegionSpec};
use serde::Deserialize;

use crate::{LayoutError, read_config};

/// One selection as written by Tabula.
#[derive(Debug, Deserialize)]
struct TabulaSelection {
    page: i64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Loads region layouts from a configuration directory.
#[derive(Debug, Clone)]
pub struct LayoutLoader {
    config_dir: PathBuf,
}

impl LayoutLoader {
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Loads the ordered regions for one admission list.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NotFound`] if the job has no Tabula export and
    /// [`LayoutError::Malformed`] if the export is invalid.
    pub fn load(&self, job: &AdmissionListJob) -> Result<Vec<RegionSpec>, LayoutError> {
        let path = job.layout_path(&self.config_dir);
        let text = read_config(&path)?;
        let regions = parse_regions(&text, &path)?;

        log::debug!(
            "[{job}] {} region(s) loaded from {}",
            regions.len(),
            path.display()
        );

        Ok(regions)
    }
}

/// Parses and validates a Tabula export. `path` is only used in error
/// messages.
///
/// # Errors
///
/// Returns [`LayoutError::Malformed`] if the document is not a non-empty
/// array of selections, a selection lacks a field or has one of the wrong
/// type, `page` is below 1, a coordinate is not finite, or a rectangle has
/// no area.
pub fn parse_regions(text: &str, path: &Path) -> Result<Vec<RegionSpec>, LayoutError> {
    let selections: Vec<serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| LayoutError::malformed(path, format!("expected a JSON array: {e}")))?;

    if selections.is_empty() {
        return Err(LayoutError::malformed(path, "no regions configured"));
    }

    selections
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let selection: TabulaSelection = serde_json::from_value(value)
                .map_err(|e| LayoutError::malformed(path, format!("selection {i}: {e}")))?;
            to_region(&selection)
                .map_err(|message| LayoutError::malformed(path, format!("selection {i}: {message}")))
        })
        .collect()
}

fn to_region(selection: &TabulaSelection) -> Result<RegionSpec, String> {
    let page = u32::try_from(selection.page)
        .ok()
        .filter(|&p| p >= 1)
        .ok_or_else(|| format!("page must be >= 1, got {}", selection.page))?;

    let region = RegionSpec {
        page,
        top: selection.y1,
        left: selection.x1,
        bottom: selection.y2,
        right: selection.x2,
    };

    if ![region.top, region.left, region.bottom, region.right]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err("coordinates must be finite".to_owned());
    }
    if region.right <= region.left {
        return Err(format!(
            "x2 ({}) must be greater than x1 ({})",
            region.right, region.left
        ));
    }
    if region.bottom <= region.top {
        return Err(format!(
            "y2 ({}) must be greater than y1 ({})",
            region.bottom, region.top
        ));
    }

    Ok(region)
}
