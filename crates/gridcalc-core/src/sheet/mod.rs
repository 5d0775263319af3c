//! The sheet: a sparse grid of cells joined by a reference graph.
//!
//! - [`Sheet`] - Owns the grid and the formula compiler; the only entry point
//!   for edits ([`Sheet::set_cell`], [`Sheet::clear_cell`])
//! - [`CellView`] - Read access to one cell's value, text and edges
//! - [`CacheState`] - Memoization state of a formula cell

mod cell;
mod cycle;
mod eval;
mod grid;
mod invalidate;
mod ops;

pub use cell::{CacheState, CellView, ESCAPE_SIGN, FORMULA_SIGN};

use gridcalc_engine::engine::{CellValue, EngineConfig, FormulaCompiler, Position, RhaiCompiler, Size};

use crate::error::{Result, SheetError};
use grid::Grid;

/// A single sheet of cells.
///
/// Edits take `&mut self` and are all-or-nothing. Reads take `&self`; reading
/// a formula may fill in its cache (and those of the cells it reads).
pub struct Sheet<C: FormulaCompiler = RhaiCompiler> {
    compiler: C,
    pub(crate) grid: Grid<C::Formula>,
}

impl Sheet<RhaiCompiler> {
    /// Create an empty sheet using the default Rhai formula compiler.
    pub fn new() -> Self {
        Self::with_compiler(RhaiCompiler::new())
    }

    /// Create an empty sheet whose Rhai compiler uses `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_compiler(RhaiCompiler::with_config(config))
    }
}

impl Default for Sheet<RhaiCompiler> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn check_position(pos: Position) -> Result<()> {
    if pos.is_valid() {
        Ok(())
    } else {
        Err(SheetError::InvalidPosition(pos))
    }
}

impl<C: FormulaCompiler> Sheet<C> {
    /// Create an empty sheet around any formula compiler.
    pub fn with_compiler(compiler: C) -> Self {
        Sheet {
            compiler,
            grid: Grid::new(),
        }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// The cell at `pos`, or `None` if no slot exists there.
    ///
    /// A slot exists once the position has been written, or while another
    /// cell's formula references it.
    pub fn cell(&self, pos: Position) -> Result<Option<CellView<'_, C::Formula>>> {
        check_position(pos)?;
        Ok(self
            .grid
            .contains(pos)
            .then(|| CellView::new(&self.grid, pos)))
    }

    /// Value of the cell at `pos`; positions without a slot read as empty text.
    pub fn value(&self, pos: Position) -> Result<CellValue> {
        check_position(pos)?;
        Ok(self.grid.value(pos))
    }

    /// Text of the cell at `pos`; positions without a slot read as `""`.
    pub fn text(&self, pos: Position) -> Result<String> {
        Ok(self.cell(pos)?.map(|cell| cell.text()).unwrap_or_default())
    }

    /// Smallest rectangle anchored at A1 covering every cell with text.
    pub fn printable_size(&self) -> Size {
        self.grid.printable_size()
    }

    /// Positions of every slot (including referenced placeholders), row-major.
    pub fn positions(&self) -> Vec<Position> {
        self.grid.positions()
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.len() == 0
    }
}

impl<C: FormulaCompiler + std::fmt::Debug> std::fmt::Debug for Sheet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sheet")
            .field("compiler", &self.compiler)
            .field("cells", &self.grid.len())
            .finish()
    }
}
