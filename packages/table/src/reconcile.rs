//! Candidate-name column identification and repair.
//!
//! Extraction sometimes places the name header over an empty column while
//! the names themselves end up in a column with no header
//! (`Unnamed: {index}`). When the identified name column is entirely blank
//! and exactly one unnamed column holds values, the unnamed column takes
//! the name header.

use chamadas_admission_models::{PartialTable, UNNAMED_COLUMN_PREFIX, is_blank};
use regex::Regex;

use crate::TableError;

/// Finds the candidate-name column by header.
#[derive(Debug, Clone)]
pub struct NameColumnMatcher {
    pattern: Regex,
}

impl NameColumnMatcher {
    /// Compiles a name-column pattern. The pattern is matched as a
    /// case-sensitive substring of each header.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn new(pattern: &str) -> Result<Self, TableError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn is_match(&self, header: &str) -> bool {
        self.pattern.is_match(header)
    }

    /// Index of the first header matching the pattern.
    #[must_use]
    pub fn find(&self, table: &PartialTable) -> Option<usize> {
        table.columns.iter().position(|h| self.is_match(h))
    }
}

/// A region table together with the index of its name column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub table: PartialTable,
    pub name_column: usize,
}

/// Identifies the name column of `table` and repairs it if its values
/// landed in an unnamed column.
///
/// A name column with at least one value is left untouched. When it is
/// entirely blank:
///
/// * one unnamed column with values: the blank column is dropped and the
///   unnamed column is renamed to the name header, keeping its position;
/// * no such column: the table is kept as is and a warning is logged;
/// * several unnamed columns with values, or several entirely blank
///   name-like columns: the repair is ambiguous.
///
/// # Errors
///
/// Returns [`TableError::NoNameColumn`] if no header matches and
/// [`TableError::SchemaMismatch`] if the repair is ambiguous.
pub fn reconcile_name_column(
    mut table: PartialTable,
    matcher: &NameColumnMatcher,
) -> Result<Reconciled, TableError> {
    let Some(name_column) = matcher.find(&table) else {
        return Err(TableError::NoNameColumn {
            pattern: matcher.as_str().to_owned(),
            headers: table.columns,
        });
    };

    if !table.is_column_blank(name_column) {
        return Ok(Reconciled { table, name_column });
    }

    let name_header = table.columns[name_column].clone();

    let blank_name_like: Vec<&str> = table
        .columns
        .iter()
        .enumerate()
        .filter(|&(i, h)| matcher.is_match(h) && table.is_column_blank(i))
        .map(|(_, h)| h.as_str())
        .collect();

    if blank_name_like.len() > 1 {
        return Err(TableError::mismatch(format!(
            "several entirely blank name columns: {blank_name_like:?}"
        )));
    }

    let candidates: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|&(i, h)| h.starts_with(UNNAMED_COLUMN_PREFIX) && !table.is_column_blank(i))
        .map(|(i, _)| i)
        .collect();

    match candidates.as_slice() {
        [] => {
            log::warn!(
                "name column {name_header:?} is blank and no unnamed column holds values; \
                 keeping raw columns"
            );
            Ok(Reconciled { table, name_column })
        }
        &[fallback] => {
            log::debug!(
                "moving name header {name_header:?} onto {:?}",
                table.columns[fallback]
            );
            table.columns[fallback] = name_header;
            table.drop_column(name_column);
            let name_column = if fallback > name_column {
                fallback - 1
            } else {
                fallback
            };
            Ok(Reconciled { table, name_column })
        }
        several => {
            let headers: Vec<&str> = several
                .iter()
                .map(|&i| table.columns[i].as_str())
                .collect();
            Err(TableError::mismatch(format!(
                "name column {name_header:?} is blank and several unnamed columns hold values: \
                 {headers:?}"
            )))
        }
    }
}
