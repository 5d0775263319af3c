//! Memoized evaluation of formula cells.
//!
//! Reading a formula cell first lines up every uncomputed formula it depends
//! on, dependencies before dependents, using an explicit stack. Evaluating in
//! that order means each formula finds its inputs already cached, so the
//! native call stack stays flat no matter how long a reference chain is.

use std::collections::HashSet;

use gridcalc_engine::engine::{CellValue, Formula, Position};

use super::cell::CacheState;
use super::grid::Grid;

impl<F: Formula> Grid<F> {
    /// Current value of the cell at `pos`, evaluating and caching as needed.
    /// A position without a slot reads as empty text.
    pub(crate) fn value(&self, pos: Position) -> CellValue {
        if let Some(value) = self.settled_value(pos) {
            return value;
        }
        for target in self.evaluation_order(pos) {
            self.compute(target);
        }
        self.settled_value(pos).unwrap_or_else(CellValue::empty)
    }

    fn settled_value(&self, pos: Position) -> Option<CellValue> {
        match self.with_cell(pos, |cell| cell.settled_value()) {
            Some(settled) => settled,
            None => Some(CellValue::empty()),
        }
    }

    /// Uncomputed formula cells reachable from `root`, in post-order
    /// (every cell after everything it reads). The graph is acyclic.
    fn evaluation_order(&self, root: Position) -> Vec<Position> {
        let mut order = Vec::new();
        let mut seen: HashSet<Position> = HashSet::new();
        let mut stack = vec![(root, false)];

        while let Some((pos, expanded)) = stack.pop() {
            if expanded {
                order.push(pos);
                continue;
            }
            if !seen.insert(pos) {
                continue;
            }
            let Some(Some(referenced)) = self.with_cell(pos, |cell| {
                cell.pending_formula()
                    .map(|_| cell.referenced.iter().copied().collect::<Vec<_>>())
            }) else {
                continue;
            };

            stack.push((pos, true));
            for next in referenced {
                if !seen.contains(&next) {
                    stack.push((next, false));
                }
            }
        }

        order
    }

    /// Evaluate one formula cell and record the result in its cache.
    fn compute(&self, pos: Position) {
        let Some(Some(formula)) = self.with_cell(pos, |cell| cell.pending_formula()) else {
            return;
        };

        log::trace!("evaluating {}", pos);
        let result = formula.evaluate(&mut |other| self.value(other));
        let state = CacheState::from(result);
        self.with_cell_mut(pos, |cell| cell.cache = state);
    }
}
