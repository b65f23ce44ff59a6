//! Table reconstruction from positioned text inside a region.
//!
//! Works the way stream-mode table extraction does on a text-based PDF:
//!
//! 1. keep the glyphs whose centre lies inside the region;
//! 2. group them into lines by vertical position;
//! 3. split each line into cell fragments at wide horizontal gaps;
//! 4. derive columns from the horizontal extents of all fragments, merging
//!    extents that overlap;
//! 5. read the first line as the header row and the rest as data rows.
//!
//! Everything is ordered by position with total float ordering, so the same
//! glyphs and region always produce the same table.

use std::collections::BTreeMap;

use chamadas_admission_models::{PartialTable, RegionSpec, UNNAMED_COLUMN_PREFIX};

use crate::glyphs::Glyph;

/// Glyphs whose vertical centres differ by at most this fraction of the
/// font size belong to the same line.
const LINE_TOLERANCE_EM: f64 = 0.5;

/// A horizontal gap wider than this many ems starts a new cell fragment.
const CELL_GAP_EM: f64 = 1.0;

/// A horizontal gap wider than this many ems (but not a cell gap) is a
/// word break.
const WORD_GAP_EM: f64 = 0.15;

/// A run of text on one line, between two cell gaps.
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    left: f64,
    right: f64,
    text: String,
}

/// Glyphs sharing a baseline, left to right.
#[derive(Debug)]
struct Line<'a> {
    center_y: f64,
    size: f64,
    glyphs: Vec<&'a Glyph>,
}

/// Builds the table found inside `region` from the glyphs of its page.
///
/// Returns an empty table (no columns, no rows) when the region holds no
/// text.
#[must_use]
pub fn extract(glyphs: &[Glyph], region: &RegionSpec) -> PartialTable {
    let lines = group_lines(glyphs, region);
    let fragments: Vec<Vec<Fragment>> = lines.iter().map(split_fragments).collect();
    let columns = column_extents(&fragments);

    let mut cells = fragments.iter().map(|line| assign_cells(line, &columns));

    let Some(header) = cells.next() else {
        return PartialTable::default();
    };

    PartialTable::new(header_names(&header), cells.collect())
}

fn group_lines<'a>(glyphs: &'a [Glyph], region: &RegionSpec) -> Vec<Line<'a>> {
    let mut inside: Vec<&Glyph> = glyphs
        .iter()
        .filter(|g| !g.text.trim().is_empty())
        .filter(|g| region.contains(g.center_x(), g.center_y()))
        .collect();

    inside.sort_by(|a, b| {
        a.center_y()
            .total_cmp(&b.center_y())
            .then(a.x.total_cmp(&b.x))
    });

    let mut lines: Vec<Line<'a>> = Vec::new();

    for glyph in inside {
        match lines.last_mut() {
            Some(line)
                if (glyph.center_y() - line.center_y).abs() <= line.size * LINE_TOLERANCE_EM =>
            {
                line.glyphs.push(glyph);
            }
            _ => lines.push(Line {
                center_y: glyph.center_y(),
                size: glyph.size.max(f64::EPSILON),
                glyphs: vec![glyph],
            }),
        }
    }

    for line in &mut lines {
        line.glyphs.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    lines
}

fn split_fragments(line: &Line<'_>) -> Vec<Fragment> {
    let mut fragments: Vec<Fragment> = Vec::new();

    for glyph in &line.glyphs {
        let em = glyph.size.max(f64::EPSILON);

        match fragments.last_mut() {
            Some(current) if glyph.x - current.right <= CELL_GAP_EM * em => {
                if glyph.x - current.right > WORD_GAP_EM * em {
                    current.text.push(' ');
                }
                current.text.push_str(&glyph.text);
                current.right = current.right.max(glyph.right());
            }
            _ => fragments.push(Fragment {
                left: glyph.x,
                right: glyph.right(),
                text: glyph.text.clone(),
            }),
        }
    }

    fragments
}

/// Merges the horizontal extents of every fragment into disjoint column
/// extents, left to right.
fn column_extents(lines: &[Vec<Fragment>]) -> Vec<(f64, f64)> {
    let mut extents: Vec<(f64, f64)> = lines
        .iter()
        .flatten()
        .map(|f| (f.left, f.right))
        .collect();
    extents.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut columns: Vec<(f64, f64)> = Vec::new();
    for (left, right) in extents {
        match columns.last_mut() {
            Some(column) if left <= column.1 => column.1 = column.1.max(right),
            _ => columns.push((left, right)),
        }
    }
    columns
}

fn assign_cells(fragments: &[Fragment], columns: &[(f64, f64)]) -> Vec<String> {
    let mut cells = vec![String::new(); columns.len()];

    for fragment in fragments {
        let index = columns
            .iter()
            .rposition(|&(left, _)| left <= fragment.left)
            .unwrap_or(0);

        if let Some(cell) = cells.get_mut(index) {
            if !cell.is_empty() {
                cell.push(' ');
            }
            cell.push_str(&fragment.text);
        }
    }

    cells
}

/// Turns header cells into unique column names: blank headers become
/// `Unnamed: {index}` and repeated headers get `.1`, `.2`, … suffixes.
fn header_names(header: &[String]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let base = if cell.trim().is_empty() {
                format!("{UNNAMED_COLUMN_PREFIX}{i}")
            } else {
                cell.trim().to_owned()
            };

            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}
