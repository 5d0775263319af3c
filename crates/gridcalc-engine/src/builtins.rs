//! Built-in spreadsheet functions (Rust) registered with the Rhai engine.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`).
//! - Range built-ins take an array; `A1:B5` is rewritten into one before
//!   compilation (see `engine::expand_ranges`).
//! - Members that are not numbers are skipped. A sheet binds empty cells and
//!   non-numeric text in a range as `()`, so `COUNT` counts numeric cells.
//! - Empty inputs to `AVG`/`MIN`/`MAX` produce a non-finite result, which the
//!   evaluator reports as `#ARITHM!`.

use rhai::{Array, Dynamic, Engine, FLOAT, INT};

pub struct RangeBuiltin {
    pub name: &'static str,
    pub func: fn(Array) -> FLOAT,
}

pub const RANGE_BUILTINS: &[RangeBuiltin] = &[
    RangeBuiltin { name: "SUM", func: sum },
    RangeBuiltin { name: "AVG", func: avg },
    RangeBuiltin { name: "COUNT", func: count },
    RangeBuiltin { name: "MIN", func: min },
    RangeBuiltin { name: "MAX", func: max },
];

fn dynamic_to_float(value: &Dynamic) -> Option<FLOAT> {
    value
        .as_float()
        .ok()
        .or_else(|| value.as_int().ok().map(|n| n as FLOAT))
}

fn numbers(values: &Array) -> Vec<FLOAT> {
    values.iter().filter_map(dynamic_to_float).collect()
}

fn sum(values: Array) -> FLOAT {
    numbers(&values).iter().sum()
}

fn avg(values: Array) -> FLOAT {
    let nums = numbers(&values);
    nums.iter().sum::<FLOAT>() / nums.len() as FLOAT
}

fn count(values: Array) -> FLOAT {
    numbers(&values).len() as FLOAT
}

fn min(values: Array) -> FLOAT {
    numbers(&values).into_iter().fold(FLOAT::INFINITY, FLOAT::min)
}

fn max(values: Array) -> FLOAT {
    numbers(&values)
        .into_iter()
        .fold(FLOAT::NEG_INFINITY, FLOAT::max)
}

/// Register all formula built-ins and operator overrides on `engine`.
///
/// Requires fast operators to be disabled, otherwise the integer division
/// override is bypassed.
pub fn register_builtins(engine: &mut Engine) {
    // Spreadsheet division is real division even between integer literals.
    engine.register_fn("/", |a: INT, b: INT| a as FLOAT / b as FLOAT);

    for builtin in RANGE_BUILTINS {
        engine.register_fn(builtin.name, builtin.func);
    }
}
