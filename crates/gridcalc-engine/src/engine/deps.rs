//! Reference extraction from formula text.
//!
//! Finds every cell a formula reads (e.g., `A1`, or each cell of `B2:C5`). The
//! result becomes the formula's outgoing edges in the sheet's dependency graph,
//! which drives cycle detection and cache invalidation.
//!
//! Handles:
//! - Simple cell references: `A1`, `B2`
//! - Ranges anywhere in the expression: `SUM(A1:B5)`
//! - Ignores references inside string literals and function names (`LOG10(x)`)

use std::collections::BTreeSet;

use super::Position;
use super::preprocess::scan_references;
use crate::error::CompileError;

/// Cells referenced by a formula.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct References {
    /// Sorted, deduplicated, in-bounds positions.
    pub cells: Vec<Position>,
    /// Cells read directly as operands (`A1`), sorted.
    pub operands: Vec<Position>,
    /// Cells read as members of a range (`A1:B5`), sorted.
    pub range_members: Vec<Position>,
    /// Whether any reference points outside the grid.
    pub out_of_bounds: bool,
}

impl References {
    pub fn is_operand(&self, pos: Position) -> bool {
        self.operands.binary_search(&pos).is_ok()
    }

    pub fn is_range_member(&self, pos: Position) -> bool {
        self.range_members.binary_search(&pos).is_ok()
    }
}

/// Every cell covered by the range `first:last`, in row-major order.
///
/// Returns `Ok(None)` when either end is malformed or outside the grid.
pub(crate) fn range_cells(
    first: &str,
    last: &str,
    max_range_cells: usize,
) -> Result<Option<Vec<Position>>, CompileError> {
    let (Some(start), Some(end)) = (Position::from_a1(first), Position::from_a1(last)) else {
        return Ok(None);
    };
    if !start.is_valid() || !end.is_valid() {
        return Ok(None);
    }

    let min_row = start.row.min(end.row);
    let max_row = start.row.max(end.row);
    let min_col = start.col.min(end.col);
    let max_col = start.col.max(end.col);

    let cell_count = (max_row - min_row + 1).saturating_mul(max_col - min_col + 1);
    if cell_count > max_range_cells {
        return Err(CompileError::RangeTooLarge {
            range: format!("{}:{}", first, last),
            cells: cell_count,
            limit: max_range_cells,
        });
    }

    let mut cells = Vec::with_capacity(cell_count);
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            cells.push(Position::new(row, col));
        }
    }
    Ok(Some(cells))
}

/// Extract all cell references from canonical formula text.
pub fn extract_references(
    canonical: &str,
    max_range_cells: usize,
) -> Result<References, CompileError> {
    let mut operands = BTreeSet::new();
    let mut range_members = BTreeSet::new();
    let mut out_of_bounds = false;

    for span in scan_references(canonical) {
        match span.last {
            Some(last) => match range_cells(span.first, last, max_range_cells)? {
                Some(range) => range_members.extend(range),
                None => out_of_bounds = true,
            },
            None => match Position::from_a1(span.first) {
                Some(pos) if pos.is_valid() => {
                    operands.insert(pos);
                }
                _ => out_of_bounds = true,
            },
        }
    }

    let cells: BTreeSet<Position> = operands.union(&range_members).copied().collect();
    Ok(References {
        cells: cells.into_iter().collect(),
        operands: operands.into_iter().collect(),
        range_members: range_members.into_iter().collect(),
        out_of_bounds,
    })
}
