//! Edits: the Set/Clear protocol.
//!
//! `set_cell` validates everything before it changes anything:
//!
//! 1. classify the input and compile a formula,
//! 2. reject the edit if the proposed references would close a cycle,
//! 3. rewire edges and install the new content,
//! 4. invalidate every cache downstream of the edited cell.
//!
//! A failure in steps 1-2 returns an error with the sheet untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use gridcalc_engine::engine::{FormulaCompiler, Position};

use super::cell::{Content, ESCAPE_SIGN, FORMULA_SIGN};
use super::cycle::detect_cycle;
use super::invalidate::invalidate_dependents;
use super::{Sheet, check_position};
use crate::error::{Result, SheetError};

impl<C: FormulaCompiler> Sheet<C> {
    /// Classify raw input and compile it if it is a formula.
    ///
    /// - `""` -> empty
    /// - `'...` -> the rest as literal text, never evaluated
    /// - `=...` (with at least one more character) -> formula
    /// - anything else -> literal text
    fn parse_content(&self, text: &str) -> Result<Content<C::Formula>> {
        if text.is_empty() {
            return Ok(Content::Empty);
        }
        if let Some(rest) = text.strip_prefix(ESCAPE_SIGN) {
            return Ok(Content::Text {
                text: rest.to_string(),
                escaped: true,
            });
        }
        if let Some(source) = text.strip_prefix(FORMULA_SIGN) {
            if !source.is_empty() {
                let formula = self.compiler.compile(source)?;
                return Ok(Content::Formula(Arc::new(formula)));
            }
        }
        Ok(Content::Text {
            text: text.to_string(),
            escaped: false,
        })
    }

    /// Set the content of the cell at `pos` from raw input text.
    ///
    /// Fails with [`SheetError::InvalidPosition`], [`SheetError::Compile`] or
    /// [`SheetError::CircularDependency`]; in every failure case no cell,
    /// edge, or cache has changed.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        check_position(pos)?;

        let content = self.parse_content(text)?;
        let referenced: BTreeSet<Position> = content.referenced_cells().iter().copied().collect();
        if let Some(&bad) = referenced.iter().find(|p| !p.is_valid()) {
            return Err(SheetError::InvalidPosition(bad));
        }

        if let Some(path) = detect_cycle(&self.grid, pos, &referenced) {
            log::debug!("rejected formula at {}: circular dependency", pos);
            return Err(SheetError::CircularDependency { cell: pos, path });
        }

        let previous = self.grid.referenced(pos);
        let reference_count = referenced.len();
        let reclaimed = self.grid.rewire(pos, &previous, &referenced);
        self.grid.install(pos, content, referenced);

        let reset = invalidate_dependents(&self.grid, pos);
        log::debug!(
            "set {}: {} reference(s), {} cached value(s) invalidated, {} placeholder(s) reclaimed",
            pos,
            reference_count,
            reset,
            reclaimed
        );
        Ok(())
    }

    /// Clear the cell at `pos`.
    ///
    /// Same as setting it to `""`, after which the slot is deallocated. If
    /// another cell's formula still references it, the slot stays as a
    /// placeholder and goes away with its last referrer.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        check_position(pos)?;
        if !self.grid.contains(pos) {
            return Ok(());
        }

        self.set_cell(pos, "")?;
        if self.grid.release(pos) {
            log::trace!("released slot {}", pos);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::sheet::{CacheState, Sheet};
    use crate::SheetError;
    use gridcalc_engine::CompileError;
    use gridcalc_engine::engine::{CellValue, FormulaError, MAX_ROWS, Position};

    fn pos(name: &str) -> Position {
        Position::from_a1(name).unwrap()
    }

    #[test]
    fn test_classification() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "hello").unwrap();
        sheet.set_cell(pos("A2"), "'=1+2").unwrap();
        sheet.set_cell(pos("A3"), "=").unwrap();
        sheet.set_cell(pos("A4"), "=1+2").unwrap();
        sheet.set_cell(pos("A5"), "").unwrap();

        assert_eq!(sheet.text(pos("A1")).unwrap(), "hello");
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Text("hello".into()));

        assert_eq!(sheet.text(pos("A2")).unwrap(), "'=1+2");
        assert_eq!(sheet.value(pos("A2")).unwrap(), CellValue::Text("=1+2".into()));

        assert_eq!(sheet.text(pos("A3")).unwrap(), "=");
        assert_eq!(sheet.value(pos("A3")).unwrap(), CellValue::Text("=".into()));

        assert_eq!(sheet.text(pos("A4")).unwrap(), "=1+2");
        assert_eq!(sheet.value(pos("A4")).unwrap(), CellValue::Number(3.0));

        let a5 = sheet.cell(pos("A5")).unwrap().unwrap();
        assert!(a5.is_empty());
        assert_eq!(a5.text(), "");
        assert_eq!(a5.value(), CellValue::empty());
    }

    #[test]
    fn test_invalid_position_is_rejected_before_anything_changes() {
        let mut sheet = Sheet::new();
        let outside = Position::new(MAX_ROWS, 0);
        assert!(matches!(
            sheet.set_cell(outside, "1"),
            Err(SheetError::InvalidPosition(p)) if p == outside
        ));
        assert!(matches!(sheet.cell(outside), Err(SheetError::InvalidPosition(_))));
        assert!(matches!(sheet.clear_cell(outside), Err(SheetError::InvalidPosition(_))));
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let mut sheet = Sheet::new();
        let err = sheet.set_cell(pos("A1"), "=A1").unwrap_err();
        assert!(matches!(err, SheetError::CircularDependency { cell, .. } if cell == pos("A1")));
        assert!(sheet.cell(pos("A1")).unwrap().is_none());
    }

    #[test]
    fn test_rejected_cycle_keeps_previous_state() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.set_cell(pos("B1"), "3").unwrap();
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(3.0));

        let err = sheet.set_cell(pos("B1"), "=A1+1").unwrap_err();
        assert_eq!(err.to_string(), "Circular dependency: B1 -> A1 -> B1");

        let b1 = sheet.cell(pos("B1")).unwrap().unwrap();
        assert_eq!(b1.text(), "3");
        assert!(b1.referenced_cells().is_empty());
        assert_eq!(b1.referring_cells(), vec![pos("A1")]);
        let a1 = sheet.cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.text(), "=B1");
        assert_eq!(a1.cache_state(), CacheState::Cached(3.0));
    }

    #[test]
    fn test_compile_error_keeps_previous_state() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1*2").unwrap();
        sheet.set_cell(pos("B1"), "4").unwrap();
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(8.0));

        let err = sheet.set_cell(pos("A1"), "=C1+").unwrap_err();
        assert!(matches!(err, SheetError::Compile(CompileError::Syntax(_))));

        let a1 = sheet.cell(pos("A1")).unwrap().unwrap();
        assert_eq!(a1.text(), "=B1*2");
        assert_eq!(a1.referenced_cells(), vec![pos("B1")]);
        assert_eq!(a1.cache_state(), CacheState::Cached(8.0));
        assert!(sheet.cell(pos("C1")).unwrap().is_none());
    }

    #[test]
    fn test_rewiring_moves_back_edges() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1+C1").unwrap();
        sheet.set_cell(pos("A1"), "=C1+D1").unwrap();

        let referring = |name: &str| sheet.cell(pos(name)).unwrap().unwrap().referring_cells();
        assert!(referring("B1").is_empty());
        assert_eq!(referring("C1"), vec![pos("A1")]);
        assert_eq!(referring("D1"), vec![pos("A1")]);
    }

    #[test]
    fn test_overwriting_formula_with_text_drops_edges() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.set_cell(pos("A1"), "plain").unwrap();

        assert!(sheet.cell(pos("B1")).unwrap().unwrap().referring_cells().is_empty());
        assert!(sheet.cell(pos("A1")).unwrap().unwrap().referenced_cells().is_empty());
    }

    #[test]
    fn test_clear_releases_unreferenced_slot() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("C3"), "x").unwrap();
        sheet.clear_cell(pos("C3")).unwrap();
        assert!(sheet.cell(pos("C3")).unwrap().is_none());
        // Clearing a missing cell is a no-op.
        sheet.clear_cell(pos("D4")).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_clear_keeps_referenced_slot() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.set_cell(pos("B1"), "5").unwrap();
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(5.0));

        sheet.clear_cell(pos("B1")).unwrap();
        let b1 = sheet.cell(pos("B1")).unwrap().unwrap();
        assert!(b1.is_empty());
        assert_eq!(b1.referring_cells(), vec![pos("A1")]);
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(0.0));

        // B1 was cleared, so it leaves with its last referrer.
        sheet.clear_cell(pos("A1")).unwrap();
        assert!(sheet.cell(pos("A1")).unwrap().is_none());
        assert!(sheet.cell(pos("B1")).unwrap().is_none());
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_dropped_reference_reclaims_placeholder() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        assert!(sheet.cell(pos("B1")).unwrap().is_some());

        sheet.set_cell(pos("A1"), "1").unwrap();
        assert!(sheet.cell(pos("B1")).unwrap().is_none());
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_dropped_range_reclaims_every_placeholder() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=SUM(B1:B1000)").unwrap();
        assert_eq!(sheet.len(), 1001);

        sheet.set_cell(pos("A1"), "1").unwrap();
        assert_eq!(sheet.len(), 1);
        assert!(sheet.cell(pos("B500")).unwrap().is_none());

        sheet.clear_cell(pos("A1")).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_written_empty_cell_outlives_its_referrers() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B1"), "").unwrap();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.set_cell(pos("A1"), "2").unwrap();

        let b1 = sheet.cell(pos("B1")).unwrap().unwrap();
        assert!(b1.is_empty());
        assert!(b1.referring_cells().is_empty());
    }

    #[test]
    fn test_writing_a_placeholder_keeps_it() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.set_cell(pos("B1"), "4").unwrap();
        sheet.set_cell(pos("A1"), "").unwrap();
        assert_eq!(sheet.text(pos("B1")).unwrap(), "4");
    }

    #[test]
    fn test_edit_invalidates_downstream_caches() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1+1").unwrap();
        sheet.set_cell(pos("C1"), "=B1*10").unwrap();
        assert_eq!(sheet.value(pos("C1")).unwrap(), CellValue::Number(20.0));

        sheet.set_cell(pos("A1"), "2").unwrap();
        let c1 = sheet.cell(pos("C1")).unwrap().unwrap();
        assert_eq!(c1.cache_state(), CacheState::Uncomputed);
        assert_eq!(c1.value(), CellValue::Number(30.0));
    }

    #[test]
    fn test_error_is_cached_and_invalidated() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "0").unwrap();
        sheet.set_cell(pos("B1"), "=1/A1").unwrap();
        assert_eq!(
            sheet.value(pos("B1")).unwrap(),
            CellValue::Error(FormulaError::Arithmetic)
        );
        assert_eq!(
            sheet.cell(pos("B1")).unwrap().unwrap().cache_state(),
            CacheState::CachedError(FormulaError::Arithmetic)
        );

        sheet.set_cell(pos("A1"), "4").unwrap();
        assert_eq!(sheet.value(pos("B1")).unwrap(), CellValue::Number(0.25));
    }
}
