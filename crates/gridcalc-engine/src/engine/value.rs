//! Result values of cells.
//!
//! A cell read yields text, a number, or a [`FormulaError`]. Formula errors are
//! ordinary values: they are cached like numbers and flow into every formula
//! that reads the failing cell.

use std::fmt;

use super::format::format_number;

/// A typed, non-exceptional evaluation failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FormulaError {
    /// Reference to a position outside the grid.
    Ref,
    /// Operand of the wrong type (e.g. non-numeric text).
    Value,
    /// Division by zero or another non-finite result.
    Arithmetic,
}

impl FormulaError {
    /// Short stable diagnostic tag.
    pub fn tag(&self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Arithmetic => "#ARITHM!",
        }
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::error::Error for FormulaError {}

/// The value of a cell as seen by readers.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

impl CellValue {
    pub fn empty() -> CellValue {
        CellValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<FormulaError> {
        match self {
            CellValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Interpret this value as a numeric formula operand.
    ///
    /// - Empty text reads as `0`.
    /// - Text that parses entirely as a finite number reads as that number.
    /// - Other text is [`FormulaError::Value`].
    /// - Errors propagate unchanged.
    pub fn as_operand(&self) -> Result<f64, FormulaError> {
        match self {
            CellValue::Number(n) => Ok(*n),
            CellValue::Error(e) => Err(*e),
            CellValue::Text(s) if s.is_empty() => Ok(0.0),
            CellValue::Text(s) => match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n),
                _ => Err(FormulaError::Value),
            },
        }
    }

    /// Interpret this value as a member of a range passed to a built-in.
    ///
    /// Numbers and numeric text yield `Some`; empty and other text yield
    /// `None` and are skipped by the built-ins. Errors propagate unchanged.
    pub fn as_range_member(&self) -> Result<Option<f64>, FormulaError> {
        match self {
            CellValue::Error(e) => Err(*e),
            CellValue::Text(s) if s.is_empty() => Ok(None),
            other => Ok(other.as_operand().ok()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<FormulaError> for CellValue {
    fn from(e: FormulaError) -> Self {
        CellValue::Error(e)
    }
}

impl From<Result<f64, FormulaError>> for CellValue {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}
