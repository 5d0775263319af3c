//! gridcalc - Incremental spreadsheet formula engine.
//!
//! A [`Sheet`] stores cells on a sparse grid. Formula cells are compiled once
//! on entry, joined to the cells they read by a reference graph, and evaluated
//! lazily with memoization. Edits that would create a circular dependency are
//! rejected before anything changes.
//!
//! ```
//! use gridcalc::{CellValue, Position, Sheet};
//!
//! let mut sheet = Sheet::new();
//! let a1: Position = "A1".parse().unwrap();
//! let b1: Position = "B1".parse().unwrap();
//! sheet.set_cell(a1, "20").unwrap();
//! sheet.set_cell(b1, "=A1 / 8").unwrap();
//! assert_eq!(sheet.value(b1).unwrap(), CellValue::Number(2.5));
//! assert_eq!(sheet.text(b1).unwrap(), "=A1/8");
//! ```

pub use gridcalc_core::storage;
pub use gridcalc_core::{CacheState, CellView, Result, Sheet, SheetError};
pub use gridcalc_engine::engine::{
    CellValue, EngineConfig, Formula, FormulaCompiler, FormulaError, MAX_COLS, MAX_ROWS,
    Position, RhaiCompiler, Size,
};
pub use gridcalc_engine::{CompileError, ConfigError};
