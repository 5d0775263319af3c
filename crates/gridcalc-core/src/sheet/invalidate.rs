//! Cache invalidation after an edit.
//!
//! Walks the `referring` edges outward from the edited cell and drops every
//! memoized formula result it can reach. The walk always covers the whole
//! closure: a cell whose own cache is already empty may still sit between the
//! edit and an ancestor holding a value computed through it.

use std::collections::HashSet;

use gridcalc_engine::engine::Position;

use super::grid::Grid;

/// Reset every formula cache reachable from `start` (inclusive) through
/// `referring` edges. Returns how many caches actually held a value.
pub(crate) fn invalidate_dependents<F>(grid: &Grid<F>, start: Position) -> usize {
    let mut visited: HashSet<Position> = HashSet::from([start]);
    let mut to_process = vec![start];
    let mut reset = 0;

    while let Some(current) = to_process.pop() {
        let Some((was_cached, referring)) = grid.with_cell_mut(current, |cell| {
            let referring: Vec<Position> = cell.referring.iter().copied().collect();
            (cell.cache.reset(), referring)
        }) else {
            continue;
        };

        if was_cached {
            reset += 1;
        }
        for next in referring {
            if visited.insert(next) {
                to_process.push(next);
            }
        }
    }

    reset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::cell::{CacheState, Content};
    use std::collections::BTreeSet;

    fn pos(name: &str) -> Position {
        Position::from_a1(name).unwrap()
    }

    fn link(grid: &mut Grid<()>, from: &str, to: &[&str]) {
        let new: BTreeSet<Position> = to.iter().map(|n| pos(n)).collect();
        let old = grid.referenced(pos(from));
        grid.rewire(pos(from), &old, &new);
        grid.install(pos(from), Content::Empty, new);
    }

    fn set_cache(grid: &Grid<()>, name: &str, cache: CacheState) {
        grid.with_cell_mut(pos(name), |cell| cell.cache = cache);
    }

    fn cache(grid: &Grid<()>, name: &str) -> CacheState {
        grid.with_cell(pos(name), |cell| cell.cache).unwrap()
    }

    #[test]
    fn test_invalidates_transitive_dependents() {
        let mut grid = Grid::new();
        link(&mut grid, "B1", &["A1"]);
        link(&mut grid, "C1", &["B1"]);
        set_cache(&grid, "B1", CacheState::Cached(1.0));
        set_cache(&grid, "C1", CacheState::Cached(2.0));

        assert_eq!(invalidate_dependents(&grid, pos("A1")), 2);
        assert_eq!(cache(&grid, "B1"), CacheState::Uncomputed);
        assert_eq!(cache(&grid, "C1"), CacheState::Uncomputed);
    }

    #[test]
    fn test_walk_continues_through_uncomputed_cells() {
        let mut grid = Grid::new();
        link(&mut grid, "B1", &["A1"]);
        link(&mut grid, "C1", &["B1"]);
        link(&mut grid, "D1", &["C1"]);
        // C1 has no cache, but D1 above it does.
        set_cache(&grid, "B1", CacheState::Cached(1.0));
        set_cache(&grid, "D1", CacheState::CachedError(gridcalc_engine::engine::FormulaError::Value));

        assert_eq!(invalidate_dependents(&grid, pos("A1")), 2);
        assert_eq!(cache(&grid, "D1"), CacheState::Uncomputed);
    }

    #[test]
    fn test_leaves_unrelated_cells_alone() {
        let mut grid = Grid::new();
        link(&mut grid, "B1", &["A1"]);
        link(&mut grid, "C1", &["Z9"]);
        set_cache(&grid, "C1", CacheState::Cached(5.0));

        assert_eq!(invalidate_dependents(&grid, pos("A1")), 0);
        assert_eq!(cache(&grid, "C1"), CacheState::Cached(5.0));
    }

    #[test]
    fn test_diamond_visits_each_cell_once() {
        let mut grid = Grid::new();
        link(&mut grid, "B1", &["A1"]);
        link(&mut grid, "C1", &["A1"]);
        link(&mut grid, "D1", &["B1", "C1"]);
        set_cache(&grid, "D1", CacheState::Cached(3.0));

        assert_eq!(invalidate_dependents(&grid, pos("A1")), 1);
    }
}
