//! Cell data structures for the sheet grid.
//!
//! - [`Content`] - What a cell holds (empty, text, or a compiled formula)
//! - [`CacheState`] - Memoized result of a formula cell
//! - [`Cell`] - Content plus both directions of the reference graph
//! - [`CellView`] - Read-only handle handed out by [`Sheet::cell`](super::Sheet::cell)

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use gridcalc_engine::engine::{CellValue, Formula, FormulaError, Position};

use super::grid::Grid;

/// Leading character that marks formula input.
pub const FORMULA_SIGN: char = '=';
/// Leading character that forces the rest of the input to be literal text.
pub const ESCAPE_SIGN: char = '\'';

/// The content stored in a cell.
pub(crate) enum Content<F> {
    Empty,
    /// Literal text. `escaped` records a stripped leading [`ESCAPE_SIGN`].
    Text { text: String, escaped: bool },
    Formula(Arc<F>),
}

impl<F: Formula> Content<F> {
    /// Cells the content reads (only formulas read anything).
    pub(crate) fn referenced_cells(&self) -> &[Position] {
        match self {
            Content::Formula(formula) => formula.referenced_cells(),
            _ => &[],
        }
    }

    /// Input text that reproduces this content.
    pub(crate) fn text(&self) -> String {
        match self {
            Content::Empty => String::new(),
            Content::Text { text, escaped: true } => format!("{}{}", ESCAPE_SIGN, text),
            Content::Text { text, escaped: false } => text.clone(),
            Content::Formula(formula) => format!("{}{}", FORMULA_SIGN, formula.expression()),
        }
    }
}

impl<F> Content<F> {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }
}

/// Memoized result of a formula cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CacheState {
    Uncomputed,
    Cached(f64),
    CachedError(FormulaError),
}

impl CacheState {
    /// Drop any memoized result. Returns whether there was one.
    pub(crate) fn reset(&mut self) -> bool {
        let was_computed = !matches!(self, CacheState::Uncomputed);
        *self = CacheState::Uncomputed;
        was_computed
    }
}

impl From<Result<f64, FormulaError>> for CacheState {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => CacheState::Cached(n),
            Err(e) => CacheState::CachedError(e),
        }
    }
}

/// A slot in the grid.
pub(crate) struct Cell<F> {
    pub content: Content<F>,
    /// Positions this cell reads.
    pub referenced: BTreeSet<Position>,
    /// Positions that read this cell. Back-references only; never owning.
    pub referring: HashSet<Position>,
    pub cache: CacheState,
    /// Set while the slot exists only because other cells reference it.
    pub placeholder: bool,
}

impl<F> Cell<F> {
    pub(crate) fn new_empty() -> Cell<F> {
        Cell {
            content: Content::Empty,
            referenced: BTreeSet::new(),
            referring: HashSet::new(),
            cache: CacheState::Uncomputed,
            placeholder: false,
        }
    }

    /// An empty slot materialized as the target of a reference.
    pub(crate) fn new_placeholder() -> Cell<F> {
        Cell {
            placeholder: true,
            ..Cell::new_empty()
        }
    }

    /// A slot nothing depends on and that holds nothing may be reclaimed.
    pub(crate) fn is_unused(&self) -> bool {
        self.content.is_empty() && self.referring.is_empty()
    }

    /// A placeholder whose last referrer is gone.
    pub(crate) fn is_orphaned_placeholder(&self) -> bool {
        self.placeholder && self.is_unused()
    }

    /// The formula to run, if this is a formula cell without a memoized result.
    pub(crate) fn pending_formula(&self) -> Option<Arc<F>> {
        match (&self.content, self.cache) {
            (Content::Formula(formula), CacheState::Uncomputed) => Some(Arc::clone(formula)),
            _ => None,
        }
    }

    /// The value of the cell if it is known without evaluating anything.
    pub(crate) fn settled_value(&self) -> Option<CellValue> {
        match &self.content {
            Content::Empty => Some(CellValue::empty()),
            Content::Text { text, .. } => Some(CellValue::Text(text.clone())),
            Content::Formula(_) => match self.cache {
                CacheState::Uncomputed => None,
                CacheState::Cached(n) => Some(CellValue::Number(n)),
                CacheState::CachedError(e) => Some(CellValue::Error(e)),
            },
        }
    }
}

/// Read-only view of an existing cell.
///
/// Reading a formula's value may populate caches; that is not observable
/// except through [`CellView::cache_state`].
pub struct CellView<'a, F> {
    grid: &'a Grid<F>,
    pos: Position,
}

impl<'a, F: Formula> CellView<'a, F> {
    pub(crate) fn new(grid: &'a Grid<F>, pos: Position) -> Self {
        CellView { grid, pos }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// Computed value: text as stored, or the formula's (possibly cached) result.
    pub fn value(&self) -> CellValue {
        self.grid.value(self.pos)
    }

    /// Text that reproduces the cell: `=` plus the canonical expression for
    /// formulas, escaped text with its `'` restored.
    pub fn text(&self) -> String {
        self.grid
            .with_cell(self.pos, |cell| cell.content.text())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.grid
            .with_cell(self.pos, |cell| cell.content.is_empty())
            .unwrap_or(true)
    }

    pub fn is_formula(&self) -> bool {
        self.grid
            .with_cell(self.pos, |cell| matches!(cell.content, Content::Formula(_)))
            .unwrap_or(false)
    }

    /// Cells this cell reads, sorted.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.grid.referenced(self.pos).into_iter().collect()
    }

    /// Cells that read this cell, sorted.
    pub fn referring_cells(&self) -> Vec<Position> {
        let mut referring = self.grid.referring(self.pos);
        referring.sort();
        referring
    }

    pub fn cache_state(&self) -> CacheState {
        self.grid
            .with_cell(self.pos, |cell| cell.cache)
            .unwrap_or(CacheState::Uncomputed)
    }
}

impl<F> std::fmt::Debug for CellView<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellView").field("pos", &self.pos).finish()
    }
}
