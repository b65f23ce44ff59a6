#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Admission list, region and table types for the chamadas toolchain.
//!
//! An admission list ("chamada") is one published round of accepted
//! candidates for an institution and academic period. Each list is
//! published as a PDF whose candidate table lives in a set of configured
//! page rectangles ([`RegionSpec`]). Extracting one rectangle yields a
//! [`PartialTable`]; concatenating all of them yields a [`ResultTable`].

use std::path::{Path, PathBuf};

use strum_macros::{AsRefStr, Display, EnumString};

/// Name-column pattern used when an institution has no specific one.
///
/// Matched as a case-sensitive substring against each column header.
pub const DEFAULT_NAME_COLUMN_PATTERN: &str = "NOME|CANDIDATO";

/// Header prefix given to columns whose header text was lost during
/// extraction.
pub const UNNAMED_COLUMN_PREFIX: &str = "Unnamed: ";

/// Institutions whose admission lists can be converted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Institution {
    /// Universidade Federal de Minas Gerais
    Ufmg,
    /// Universidade Federal do Rio de Janeiro
    Ufrj,
    /// Universidade Federal Fluminense
    Uff,
}

impl Institution {
    /// Every supported institution, in display order.
    pub const ALL: &[Self] = &[Self::Ufmg, Self::Ufrj, Self::Uff];

    /// Regex used to find the candidate-name column in this institution's
    /// tables.
    #[must_use]
    pub const fn name_column_pattern(self) -> &'static str {
        match self {
            Self::Ufmg | Self::Ufrj | Self::Uff => DEFAULT_NAME_COLUMN_PATTERN,
        }
    }
}

/// A rectangular table region on one PDF page.
///
/// Coordinates are in PDF points with the origin at the top-left corner of
/// the page, as exported by Tabula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpec {
    /// 1-based page number.
    pub page: u32,
    /// Distance from the top edge of the page to the top of the region.
    pub top: f64,
    /// Distance from the left edge of the page to the left of the region.
    pub left: f64,
    /// Distance from the top edge of the page to the bottom of the region.
    pub bottom: f64,
    /// Distance from the left edge of the page to the right of the region.
    pub right: f64,
}

impl RegionSpec {
    /// Returns `true` if the point lies inside the region (edges included).
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// Error returned when a period code cannot be used to build file names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid period {period:?}: must be non-empty and contain no path separators")]
pub struct InvalidPeriodError {
    /// The rejected period code.
    pub period: String,
}

/// Checks that a period code is safe to embed in a file name.
///
/// # Errors
///
/// Returns [`InvalidPeriodError`] if the period is blank, contains `/` or
/// `\`, or contains `..`.
pub fn validate_period(period: &str) -> Result<(), InvalidPeriodError> {
    if period.trim().is_empty()
        || period.contains('/')
        || period.contains('\\')
        || period.contains("..")
    {
        return Err(InvalidPeriodError {
            period: period.to_owned(),
        });
    }
    Ok(())
}

/// One admission list to download and convert.
///
/// Every file the job touches is derived from `{institution}_{period}`, so
/// two distinct jobs never share a path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdmissionListJob {
    /// Publishing institution.
    pub institution: Institution,
    /// Period code (e.g. `"2023_1"`).
    pub period: String,
    /// Where the PDF is published.
    pub url: String,
}

impl AdmissionListJob {
    /// Creates a job after validating the period code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPeriodError`] if the period cannot be used in a
    /// file name.
    pub fn new(
        institution: Institution,
        period: &str,
        url: &str,
    ) -> Result<Self, InvalidPeriodError> {
        validate_period(period)?;
        Ok(Self {
            institution,
            period: period.to_owned(),
            url: url.to_owned(),
        })
    }

    /// Returns the `{institution}_{period}` stem shared by all job files.
    #[must_use]
    pub fn stem(&self) -> String {
        format!("{}_{}", self.institution, self.period)
    }

    /// Path of the Tabula region export for this job.
    #[must_use]
    pub fn layout_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(format!("tabula-{}.json", self.stem()))
    }

    /// Path where the downloaded PDF is cached.
    #[must_use]
    pub fn pdf_path(&self, downloads_dir: &Path) -> PathBuf {
        downloads_dir.join(format!("{}.pdf", self.stem()))
    }

    /// Path of the CSV produced by this job.
    #[must_use]
    pub fn csv_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.csv", self.stem()))
    }
}

impl std::fmt::Display for AdmissionListJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.institution, self.period)
    }
}

/// Returns `true` for a missing cell value.
#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// The table extracted from a single region.
///
/// Rows are stored positionally: `rows[r][c]` is the value of column
/// `columns[c]`, and every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialTable {
    /// Column headers, left to right.
    pub columns: Vec<String>,
    /// Data rows, top to bottom.
    pub rows: Vec<Vec<String>>,
}

impl PartialTable {
    /// Creates a table, padding or truncating rows to the column count.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Iterates over the values of one column.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }

    /// Returns `true` if every value in the column is blank.
    #[must_use]
    pub fn is_column_blank(&self, index: usize) -> bool {
        self.column_values(index).all(is_blank)
    }

    /// Removes a column and its values.
    pub fn drop_column(&mut self, index: usize) {
        if index >= self.columns.len() {
            return;
        }
        self.columns.remove(index);
        for row in &mut self.rows {
            if index < row.len() {
                row.remove(index);
            }
        }
    }

    /// Returns `true` if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The concatenation of every region of one admission list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    /// Canonical column headers.
    pub columns: Vec<String>,
    /// Index of the canonical candidate-name column, if a schema exists.
    pub name_column: Option<usize>,
    /// Rows in canonical column order.
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// Header of the canonical name column.
    #[must_use]
    pub fn name_header(&self) -> Option<&str> {
        self.name_column
            .and_then(|i| self.columns.get(i))
            .map(String::as_str)
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
