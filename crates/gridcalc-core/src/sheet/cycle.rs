//! Circular dependency detection for formula cells.
//!
//! When a formula is entered, we must verify it doesn't create a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1) *before*
//! anything is installed. The walk starts from the proposed references and
//! follows the edges already in the grid, so the sheet is never in a cyclic
//! state, not even transiently.

use std::collections::{BTreeSet, HashMap, HashSet};

use gridcalc_engine::engine::Position;

use super::grid::Grid;

/// Check whether giving `start` the outgoing edges `proposed` would close a
/// cycle. Returns the cycle as a path `[start, ..., start]` if so.
///
/// Installed edges of `start` itself are ignored; `proposed` replaces them.
pub(crate) fn detect_cycle<F>(
    grid: &Grid<F>,
    start: Position,
    proposed: &BTreeSet<Position>,
) -> Option<Vec<Position>> {
    // Reached position -> position it was reached from.
    let mut parents: HashMap<Position, Position> = HashMap::new();
    let mut visited: HashSet<Position> = HashSet::new();
    let mut stack: Vec<Position> = Vec::new();

    for &next in proposed {
        if next == start {
            return Some(vec![start, start]);
        }
        if visited.insert(next) {
            parents.insert(next, start);
            stack.push(next);
        }
    }

    while let Some(current) = stack.pop() {
        for next in grid.referenced(current) {
            if next == start {
                return Some(cycle_path(&parents, start, current));
            }
            if visited.insert(next) {
                parents.insert(next, current);
                stack.push(next);
            }
        }
    }

    None
}

fn cycle_path(parents: &HashMap<Position, Position>, start: Position, last: Position) -> Vec<Position> {
    let mut path = vec![start, last];
    let mut current = last;
    while let Some(&parent) = parents.get(&current) {
        path.push(parent);
        if parent == start {
            break;
        }
        current = parent;
    }
    path.reverse();
    path
}
