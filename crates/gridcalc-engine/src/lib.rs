//! gridcalc_engine - Formula values, positions and the Rhai-backed compiler.

pub(crate) mod builtins;
pub mod engine;
pub mod error;

pub use error::{CompileError, ConfigError};
