//! gridcalc-core - Sheet model: dependency graph, memoized evaluation, export.

pub mod error;
pub mod sheet;
pub mod storage;

pub use error::{Result, SheetError};
pub use sheet::{CacheState, CellView, Sheet};

pub use gridcalc_engine::engine::{CellValue, FormulaError, Position, Size};
