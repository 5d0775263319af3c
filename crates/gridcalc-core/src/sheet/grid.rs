//! Sparse cell storage and edge maintenance.
//!
//! The grid exclusively owns every cell slot, keyed by position. Edges between
//! cells are stored as positions on both ends, and [`Grid::rewire`] is the only
//! code that changes them, which keeps the `referenced`/`referring` sets
//! mirror images of each other.
//!
//! Slots live in a `DashMap` so that reads through `&self` can still record a
//! formula's memoized result. A guard returned by the map must never be held
//! across another call into the grid.

use std::collections::BTreeSet;

use dashmap::DashMap;
use gridcalc_engine::engine::{Position, Size};

use super::cell::{Cell, Content};

pub(crate) struct Grid<F> {
    cells: DashMap<Position, Cell<F>>,
}

impl<F> Grid<F> {
    pub(crate) fn new() -> Self {
        Grid {
            cells: DashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn contains(&self, pos: Position) -> bool {
        self.cells.contains_key(&pos)
    }

    /// Run `f` against the slot at `pos`, if any. `f` must not touch the grid.
    pub(crate) fn with_cell<R>(&self, pos: Position, f: impl FnOnce(&Cell<F>) -> R) -> Option<R> {
        self.cells.get(&pos).map(|cell| f(cell.value()))
    }

    /// Run `f` against the mutable slot at `pos`, if any. `f` must not touch the grid.
    pub(crate) fn with_cell_mut<R>(
        &self,
        pos: Position,
        f: impl FnOnce(&mut Cell<F>) -> R,
    ) -> Option<R> {
        self.cells.get_mut(&pos).map(|mut cell| f(cell.value_mut()))
    }

    /// Installed outgoing edges of `pos`.
    pub(crate) fn referenced(&self, pos: Position) -> BTreeSet<Position> {
        self.with_cell(pos, |cell| cell.referenced.clone())
            .unwrap_or_default()
    }

    /// Installed incoming edges of `pos`, in no particular order.
    pub(crate) fn referring(&self, pos: Position) -> Vec<Position> {
        self.with_cell(pos, |cell| cell.referring.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Move the outgoing edges of `pos` from `old` to `new`. Returns how many
    /// placeholder slots were reclaimed.
    ///
    /// Every target in `new` is materialized as a placeholder if it does not
    /// exist yet, so back-edges always land on a real cell. A placeholder in
    /// `old` that loses its last referrer is removed.
    pub(crate) fn rewire(
        &mut self,
        pos: Position,
        old: &BTreeSet<Position>,
        new: &BTreeSet<Position>,
    ) -> usize {
        let mut reclaimed = 0;
        for target in old.difference(new) {
            if let Some(mut cell) = self.cells.get_mut(target) {
                cell.referring.remove(&pos);
            }
            if self
                .cells
                .remove_if(target, |_, cell| cell.is_orphaned_placeholder())
                .is_some()
            {
                reclaimed += 1;
            }
        }
        for &target in new {
            self.cells
                .entry(target)
                .or_insert_with(Cell::new_placeholder)
                .referring
                .insert(pos);
        }
        reclaimed
    }

    /// Replace the content and outgoing edge set of `pos`, creating the slot if
    /// needed. The cache starts over as uncomputed.
    ///
    /// Callers rewire first; this only records the new edge set on `pos` itself.
    pub(crate) fn install(&mut self, pos: Position, content: Content<F>, referenced: BTreeSet<Position>) {
        let mut cell = self.cells.entry(pos).or_insert_with(Cell::new_empty);
        cell.content = content;
        cell.referenced = referenced;
        cell.cache.reset();
        cell.placeholder = false;
    }

    /// Remove the slot at `pos` if it holds nothing and nothing refers to it.
    /// A slot that is still referenced becomes a placeholder instead, to be
    /// reclaimed with its last referrer.
    pub(crate) fn release(&mut self, pos: Position) -> bool {
        if self.cells.remove_if(&pos, |_, cell| cell.is_unused()).is_some() {
            return true;
        }
        if let Some(mut cell) = self.cells.get_mut(&pos) {
            if cell.content.is_empty() {
                cell.placeholder = true;
            }
        }
        false
    }

    /// Smallest rectangle anchored at A1 that covers every cell with text.
    pub(crate) fn printable_size(&self) -> Size {
        let mut size = Size::default();
        for entry in self.cells.iter() {
            if entry.value().content.is_empty() {
                continue;
            }
            let pos = entry.key();
            size.rows = size.rows.max(pos.row + 1);
            size.cols = size.cols.max(pos.col + 1);
        }
        size
    }

    /// Positions of every slot, sorted row-major.
    pub(crate) fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.cells.iter().map(|entry| *entry.key()).collect();
        positions.sort();
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestGrid = Grid<()>;

    fn set(items: &[Position]) -> BTreeSet<Position> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_rewire_materializes_targets() {
        let mut grid = TestGrid::new();
        let a1 = Position::new(0, 0);
        let b1 = Position::new(0, 1);
        let c1 = Position::new(0, 2);

        grid.rewire(a1, &BTreeSet::new(), &set(&[b1, c1]));
        assert!(grid.contains(b1));
        assert!(grid.contains(c1));
        assert!(!grid.contains(a1));
        assert_eq!(grid.referring(b1), vec![a1]);
    }

    #[test]
    fn test_rewire_moves_back_edges() {
        let mut grid = TestGrid::new();
        let a1 = Position::new(0, 0);
        let b1 = Position::new(0, 1);
        let c1 = Position::new(0, 2);

        grid.rewire(a1, &BTreeSet::new(), &set(&[b1]));
        grid.rewire(a1, &set(&[b1]), &set(&[c1]));
        assert!(grid.referring(b1).is_empty());
        assert_eq!(grid.referring(c1), vec![a1]);
    }

    #[test]
    fn test_rewire_reclaims_orphaned_placeholders() {
        let mut grid = TestGrid::new();
        let a1 = Position::new(0, 0);
        let b1 = Position::new(0, 1);
        let c1 = Position::new(0, 2);

        grid.rewire(a1, &BTreeSet::new(), &set(&[b1, c1]));
        assert_eq!(grid.rewire(a1, &set(&[b1, c1]), &set(&[c1])), 1);
        assert!(!grid.contains(b1));
        assert_eq!(grid.referring(c1), vec![a1]);
    }

    #[test]
    fn test_rewire_keeps_written_slots() {
        let mut grid = TestGrid::new();
        let a1 = Position::new(0, 0);
        let b1 = Position::new(0, 1);

        grid.install(b1, Content::Empty, BTreeSet::new());
        grid.rewire(a1, &BTreeSet::new(), &set(&[b1]));
        assert_eq!(grid.rewire(a1, &set(&[b1]), &BTreeSet::new()), 0);
        assert!(grid.contains(b1));
    }

    #[test]
    fn test_release_defers_referenced_slots() {
        let mut grid = TestGrid::new();
        let a1 = Position::new(0, 0);
        let b1 = Position::new(0, 1);

        grid.install(b1, Content::Empty, BTreeSet::new());
        grid.rewire(a1, &BTreeSet::new(), &set(&[b1]));
        assert!(!grid.release(b1));
        assert!(grid.contains(b1));

        // Released while referenced, so it goes with the last back-edge.
        grid.rewire(a1, &set(&[b1]), &BTreeSet::new());
        assert!(!grid.contains(b1));
    }

    #[test]
    fn test_printable_size_ignores_placeholders() {
        let mut grid = TestGrid::new();
        grid.rewire(Position::new(0, 0), &BTreeSet::new(), &set(&[Position::new(9, 9)]));
        assert_eq!(grid.printable_size(), Size::new(0, 0));

        grid.install(
            Position::new(2, 4),
            Content::Text {
                text: "x".into(),
                escaped: false,
            },
            BTreeSet::new(),
        );
        assert_eq!(grid.printable_size(), Size::new(3, 5));
        assert_eq!(grid.len(), 2);
    }
}
