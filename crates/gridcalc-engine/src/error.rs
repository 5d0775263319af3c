//! Error types for the formula engine.

use thiserror::Error;

/// Errors raised while compiling formula source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Formula syntax error: {0}")]
    Syntax(String),

    #[error("Range {range} covers {cells} cells (limit {limit})")]
    RangeTooLarge {
        range: String,
        cells: usize,
        limit: usize,
    },
}

/// Errors raised while loading engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid engine config: {0}")]
    Toml(#[from] toml::de::Error),
}
