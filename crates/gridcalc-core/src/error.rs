//! Error types for Gridcalc core.

use gridcalc_engine::CompileError;
use gridcalc_engine::engine::Position;
use thiserror::Error;

fn format_path(path: &[Position]) -> String {
    path.iter()
        .map(Position::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur when editing or exporting a sheet.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Invalid position (row {}, col {})", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("Circular dependency: {}", format_path(.path))]
    CircularDependency { cell: Position, path: Vec<Position> },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
