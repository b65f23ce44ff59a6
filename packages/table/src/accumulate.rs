//! Schema alignment and row accumulation across regions.

use chamadas_admission_models::{ResultTable, is_blank};

use crate::{Reconciled, TableError};

/// Accumulates reconciled region tables into one [`ResultTable`].
///
/// The first region with data rows defines the canonical columns. Each
/// later region maps its name column onto the canonical name column and
/// every other column onto the canonical column with the same header.
#[derive(Debug, Default)]
pub struct ResultTableBuilder {
    table: ResultTable,
}

impl ResultTableBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the rows of one region, in order. `index` is the region's
    /// position in the layout and only shows up in errors.
    ///
    /// A region without data rows is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::SchemaMismatch`] if a column holding values has
    /// no counterpart in the canonical schema.
    pub fn push(&mut self, index: usize, region: Reconciled) -> Result<usize, TableError> {
        let Reconciled { table, name_column } = region;

        if table.is_empty() {
            return Ok(0);
        }

        let Some(canonical_name) = self.table.name_column else {
            let added = table.rows.len();
            self.table = ResultTable {
                columns: table.columns,
                name_column: Some(name_column),
                rows: table.rows,
            };
            return Ok(added);
        };

        // Canonical position of every region column, `None` when it has no
        // counterpart.
        let mut taken = vec![false; self.table.columns.len()];
        let mut targets: Vec<Option<usize>> = Vec::with_capacity(table.columns.len());

        for (i, header) in table.columns.iter().enumerate() {
            let target = if i == name_column {
                Some(canonical_name)
            } else {
                self.table
                    .columns
                    .iter()
                    .position(|c| c == header)
                    .filter(|&t| t != canonical_name)
            };

            let target = target.filter(|&t| !taken[t]);
            if let Some(t) = target {
                taken[t] = true;
            }
            targets.push(target);
        }

        for (i, target) in targets.iter().enumerate() {
            if target.is_some() {
                continue;
            }
            if table.is_column_blank(i) {
                log::debug!("dropping blank column {:?}", table.columns[i]);
            } else {
                return Err(TableError::mismatch(format!(
                    "region {index}: column {:?} holds values but is not in the schema {:?}",
                    table.columns[i], self.table.columns
                )));
            }
        }

        let added = table.rows.len();
        let width = self.table.columns.len();

        for row in table.rows {
            let mut aligned = vec![String::new(); width];
            for (value, target) in row.into_iter().zip(&targets) {
                if let Some(t) = *target
                    && !is_blank(&value)
                {
                    aligned[t] = value;
                }
            }
            self.table.rows.push(aligned);
        }

        Ok(added)
    }

    /// Number of rows accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn finish(self) -> ResultTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use chamadas_admission_models::PartialTable;

    use super::*;

    fn region(columns: &[&str], name_column: usize, rows: &[&[&str]]) -> Reconciled {
        Reconciled {
            table: PartialTable::new(
                columns.iter().map(|&c| c.to_owned()).collect(),
                rows.iter()
                    .map(|r| r.iter().map(|&v| v.to_owned()).collect())
                    .collect(),
            ),
            name_column,
        }
    }

    #[test]
    fn regions_concatenate_in_push_order() {
        let mut builder = ResultTableBuilder::new();
        builder
            .push(0, region(&["NOME", "CURSO"], 0, &[&["A", "X"], &["B", "Y"]]))
            .unwrap();
        builder
            .push(1, region(&["NOME", "CURSO"], 0, &[&["C", "Z"]]))
            .unwrap();

        let table = builder.finish();
        let names: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(table.name_header(), Some("NOME"));
    }

    #[test]
    fn name_column_maps_onto_canonical_name() {
        let mut builder = ResultTableBuilder::new();
        builder
            .push(0, region(
                &["INSCRICAO", "NOME", "CURSO"],
                1,
                &[&["1001", "ANA SOUZA", "MEDICINA"]],
            ))
            .unwrap();
        let added = builder
            .push(1, region(
                &["INSCRICAO", "CANDIDATO", "CURSO"],
                1,
                &[&["1004", "DANIEL REIS", "QUIMICA"]],
            ))
            .unwrap();
        assert_eq!(added, 1);

        let table = builder.finish();
        assert_eq!(table.columns, vec!["INSCRICAO", "NOME", "CURSO"]);
        assert_eq!(table.rows[1], vec!["1004", "DANIEL REIS", "QUIMICA"]);
    }

    #[test]
    fn columns_are_matched_by_header_not_position() {
        let mut builder = ResultTableBuilder::new();
        builder
            .push(0, region(&["INSCRICAO", "NOME", "CURSO"], 1, &[&["1", "A", "X"]]))
            .unwrap();
        builder
            .push(1, region(&["CURSO", "NOME"], 1, &[&["Y", "B"]]))
            .unwrap();

        let table = builder.finish();
        assert_eq!(table.rows[1], vec!["", "B", "Y"]);
    }

    #[test]
    fn empty_regions_do_not_define_the_schema() {
        let mut builder = ResultTableBuilder::new();
        assert_eq!(builder.push(0, region(&["TITULO"], 0, &[])).unwrap(), 0);
        builder
            .push(1, region(&["NOME", "CURSO"], 0, &[&["A", "X"]]))
            .unwrap();

        let table = builder.finish();
        assert_eq!(table.columns, vec!["NOME", "CURSO"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unmatched_blank_columns_are_dropped() {
        let mut builder = ResultTableBuilder::new();
        builder.push(0, region(&["NOME"], 0, &[&["A"]])).unwrap();
        builder
            .push(1, region(&["NOME", "Unnamed: 1"], 0, &[&["B", " "]]))
            .unwrap();

        let table = builder.finish();
        assert_eq!(table.columns, vec!["NOME"]);
        assert_eq!(table.rows, vec![vec!["A"], vec!["B"]]);
    }

    #[test]
    fn unmatched_columns_with_values_are_a_mismatch() {
        let mut builder = ResultTableBuilder::new();
        builder.push(0, region(&["NOME"], 0, &[&["A"]])).unwrap();

        let err = builder
            .push(3, region(&["NOME", "NOTA"], 0, &[&["B", "9.5"]]))
            .unwrap_err();
        let TableError::SchemaMismatch { message } = err else {
            panic!("expected a schema mismatch, got {err:?}");
        };
        assert!(message.starts_with("region 3: "), "{message}");
        assert!(message.contains("\"NOTA\""), "{message}");
        assert_eq!(builder.len(), 1);
    }
}
