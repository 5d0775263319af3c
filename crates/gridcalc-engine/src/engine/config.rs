//! Engine limits.
//!
//! Formulas are user input; these bounds keep a single evaluation or a single
//! range reference from running away.

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum Rhai operations per formula evaluation.
    pub max_operations: u64,
    /// Maximum expression nesting depth accepted by the compiler.
    pub max_expr_depth: usize,
    /// Maximum number of cells a single range reference may cover.
    pub max_range_cells: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_operations: 100_000,
            max_expr_depth: 64,
            max_range_cells: 10_000,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML. Missing keys keep their defaults.
    ///
    /// ```toml
    /// max_operations = 50000
    /// max_range_cells = 2048
    /// ```
    pub fn from_toml_str(content: &str) -> Result<EngineConfig, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
