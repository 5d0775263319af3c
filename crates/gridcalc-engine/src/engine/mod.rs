//! Formula engine API.
//!
//! This module provides everything a sheet needs to hold and evaluate formulas:
//!
//! - [`Position`], [`Size`] - Cell addresses (A1 notation ↔ row/col indices)
//! - [`CellValue`], [`FormulaError`] - The value model seen by cell readers
//! - [`Formula`], [`FormulaCompiler`] - The compiler seam used by the sheet
//! - [`RhaiCompiler`] - The default, Rhai-backed compiler
//! - [`extract_references`] - Find the cells a formula reads
//! - [`normalize_formula`] - Canonical rendering of formula source
//! - [`format_number`] - Format values for display

mod config;
mod deps;
mod eval;
mod format;
mod formula;
mod position;
mod preprocess;
mod value;

pub use config::EngineConfig;
pub use deps::{References, extract_references};
pub use eval::{RhaiCompiler, RhaiFormula, create_engine};
pub use format::format_number;
pub use formula::{Formula, FormulaCompiler};
pub use position::{MAX_COLS, MAX_ROWS, Position, Size};
pub use preprocess::{expand_ranges, normalize_formula};
pub use value::{CellValue, FormulaError};
