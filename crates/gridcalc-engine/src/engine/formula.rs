//! The seam between the sheet and a formula language.
//!
//! A sheet never parses formula text itself. It hands the source (without the
//! leading `=`) to a [`FormulaCompiler`] and keeps the resulting [`Formula`],
//! which reports the cells it reads and evaluates itself against a lookup
//! callback.

use super::{CellValue, FormulaError, Position};
use crate::error::CompileError;

/// A compiled, evaluable formula.
pub trait Formula {
    /// Evaluate the formula. `lookup` returns the current value of another
    /// cell; it is only called for positions in [`Formula::referenced_cells`].
    ///
    /// Failures of any kind are reported as a [`FormulaError`] value.
    fn evaluate(&self, lookup: &mut dyn FnMut(Position) -> CellValue) -> Result<f64, FormulaError>;

    /// Cells the formula reads: sorted, deduplicated, and inside the grid.
    fn referenced_cells(&self) -> &[Position];

    /// Canonical source text, without the leading `=`.
    fn expression(&self) -> String;
}

/// Turns formula source text into a [`Formula`].
pub trait FormulaCompiler {
    type Formula: Formula;

    fn compile(&self, source: &str) -> Result<Self::Formula, CompileError>;
}
