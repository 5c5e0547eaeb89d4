//! Selection tracking with edge-clamped navigation.

use crate::cell_ref::{CellRef, GRID_COLS, GRID_ROWS};

/// Directional navigation input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The currently selected cell.
///
/// Always holds a valid position; a new selection starts at A1 and lives
/// until its document closes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    active: CellRef,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            active: CellRef::new(0, 0),
        }
    }

    pub fn active(&self) -> CellRef {
        self.active
    }

    /// Set the selection unconditionally (address assumed pre-validated).
    pub fn select(&mut self, cell: CellRef) {
        self.active = cell;
    }

    /// Move one cell in `dir`. Returns false when the step would leave the
    /// grid; the selection is then unchanged and no refresh should fire.
    pub fn step(&mut self, dir: Direction) -> bool {
        let CellRef { col, row } = self.active;
        let candidate = match dir {
            Direction::Up if row > 0 => CellRef::new(col, row - 1),
            Direction::Down if row + 1 < GRID_ROWS => CellRef::new(col, row + 1),
            Direction::Left if col > 0 => CellRef::new(col - 1, row),
            Direction::Right if col + 1 < GRID_COLS => CellRef::new(col + 1, row),
            _ => return false,
        };
        self.active = candidate;
        true
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_a1() {
        assert_eq!(Selection::new().active(), CellRef::new(0, 0));
    }

    #[test]
    fn test_step_moves_inside_grid() {
        let mut sel = Selection::new();
        assert!(sel.step(Direction::Down));
        assert!(sel.step(Direction::Right));
        assert_eq!(sel.active(), CellRef::new(1, 1));
        assert!(sel.step(Direction::Up));
        assert!(sel.step(Direction::Left));
        assert_eq!(sel.active(), CellRef::new(0, 0));
    }

    #[test]
    fn test_step_clamps_at_edges() {
        let mut sel = Selection::new();
        assert!(!sel.step(Direction::Up));
        assert!(!sel.step(Direction::Left));
        assert_eq!(sel.active(), CellRef::new(0, 0));

        sel.select(CellRef::new(GRID_COLS - 1, GRID_ROWS - 1));
        assert!(!sel.step(Direction::Down));
        assert!(!sel.step(Direction::Right));
        assert_eq!(sel.active(), CellRef::new(GRID_COLS - 1, GRID_ROWS - 1));
    }

    #[test]
    fn test_clamp_at_z1_going_right() {
        let mut sel = Selection::new();
        sel.select(CellRef::new(25, 0));
        assert!(!sel.step(Direction::Right));
        assert_eq!(sel.active().name(), "Z1");
    }
}
