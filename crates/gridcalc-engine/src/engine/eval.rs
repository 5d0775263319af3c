//! Rhai engine creation and formula evaluation.
//!
//! [`RhaiCompiler`] is the default [`FormulaCompiler`]. A formula such as
//! `A1*2+SUM(B1:B3)` is normalized, its references extracted, ranges expanded
//! into arrays, and the result compiled as a Rhai *expression* (statements and
//! loops are rejected). Variables are strict: any identifier that is not a
//! cell reference fails to compile. At evaluation time every referenced cell
//! is bound as a scope constant named by its A1 text.

use std::fmt;
use std::sync::Arc;

use rhai::{AST, Dynamic, Engine, EvalAltResult, OptimizationLevel, Scope};

use super::config::EngineConfig;
use super::deps::{References, extract_references};
use super::formula::{Formula, FormulaCompiler};
use super::preprocess::{expand_ranges, normalize_formula, range_member_name, scan_references};
use super::{CellValue, FormulaError, Position};
use crate::error::CompileError;

/// Create a Rhai engine with built-ins registered and limits applied.
pub fn create_engine(config: &EngineConfig) -> Engine {
    let mut engine = Engine::new();
    // Operator overrides in the built-ins only apply with fast operators off,
    // and constant folding would bypass them.
    engine.set_fast_operators(false);
    engine.set_optimization_level(OptimizationLevel::None);
    engine.set_strict_variables(true);
    engine.set_max_operations(config.max_operations);
    engine.set_max_expr_depths(config.max_expr_depth, config.max_expr_depth);
    engine.on_print(|_| {});
    engine.on_debug(|_, _, _| {});
    crate::builtins::register_builtins(&mut engine);
    engine
}

/// Map a Rhai runtime failure onto a formula error value.
fn classify_error(err: &EvalAltResult) -> FormulaError {
    match err {
        EvalAltResult::ErrorArithmetic(..) => FormulaError::Arithmetic,
        _ => FormulaError::Value,
    }
}

/// Declare every name the expanded script may read, so strict variable
/// checking accepts cell references (in bounds or not) and nothing else.
fn declared_names(canonical: &str, references: &References) -> Scope<'static> {
    let mut scope = Scope::new();
    for span in scan_references(canonical) {
        if span.last.is_none() {
            scope.push_constant_dynamic(span.first.to_string(), Dynamic::UNIT);
        }
    }
    for &pos in &references.range_members {
        scope.push_constant_dynamic(range_member_name(pos), Dynamic::UNIT);
    }
    scope
}

fn to_number(value: &Dynamic) -> Result<f64, FormulaError> {
    let n = if let Ok(n) = value.as_float() {
        n
    } else if let Ok(n) = value.as_int() {
        n as f64
    } else {
        return Err(FormulaError::Value);
    };

    if n.is_finite() {
        Ok(n)
    } else {
        Err(FormulaError::Arithmetic)
    }
}

/// Formula compiler backed by a shared Rhai engine.
#[derive(Clone)]
pub struct RhaiCompiler {
    engine: Arc<Engine>,
    config: EngineConfig,
}

impl RhaiCompiler {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        RhaiCompiler {
            engine: Arc::new(create_engine(&config)),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for RhaiCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RhaiCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RhaiCompiler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FormulaCompiler for RhaiCompiler {
    type Formula = RhaiFormula;

    fn compile(&self, source: &str) -> Result<RhaiFormula, CompileError> {
        let expression = normalize_formula(source);
        if expression.is_empty() {
            return Err(CompileError::Syntax("empty formula".to_string()));
        }

        let references = extract_references(&expression, self.config.max_range_cells)?;
        let script = expand_ranges(&expression, self.config.max_range_cells)?;
        let declared = declared_names(&expression, &references);
        let ast = self
            .engine
            .compile_expression_with_scope(&declared, &script)
            .map_err(|e| CompileError::Syntax(e.to_string()))?;

        log::trace!(
            "compiled formula `{}` reading {} cell(s)",
            expression,
            references.cells.len()
        );

        Ok(RhaiFormula {
            engine: Arc::clone(&self.engine),
            ast,
            expression,
            references,
        })
    }
}

/// A formula compiled by [`RhaiCompiler`].
pub struct RhaiFormula {
    engine: Arc<Engine>,
    ast: AST,
    expression: String,
    references: References,
}

impl Formula for RhaiFormula {
    fn evaluate(&self, lookup: &mut dyn FnMut(Position) -> CellValue) -> Result<f64, FormulaError> {
        if self.references.out_of_bounds {
            return Err(FormulaError::Ref);
        }

        let mut scope = Scope::new();
        for &pos in &self.references.cells {
            let value = lookup(pos);
            if self.references.is_operand(pos) {
                scope.push_constant(pos.to_string(), value.as_operand()?);
            }
            if self.references.is_range_member(pos) {
                let member = match value.as_range_member()? {
                    Some(n) => Dynamic::from_float(n),
                    None => Dynamic::UNIT,
                };
                scope.push_constant_dynamic(range_member_name(pos), member);
            }
        }

        match self.engine.eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast) {
            Ok(value) => to_number(&value),
            Err(err) => Err(classify_error(&err)),
        }
    }

    fn referenced_cells(&self) -> &[Position] {
        &self.references.cells
    }

    fn expression(&self) -> String {
        self.expression.clone()
    }
}

impl fmt::Debug for RhaiFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RhaiFormula")
            .field("expression", &self.expression)
            .field("references", &self.references)
            .finish_non_exhaustive()
    }
}
