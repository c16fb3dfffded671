//! 2D grid for the world.

use eco_core::{grid_area, CellState, Direction, Position};
use serde::Serialize;

/// A bounded `rows x cols` grid of cell states, stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub rows: i32,
    pub cols: i32,
    cells: Vec<CellState>,
}

impl Grid {
    pub fn new(rows: i32, cols: i32) -> Self {
        let size = grid_area(rows, cols).unwrap_or(0);
        Self {
            rows,
            cols,
            cells: vec![CellState::Empty; size],
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.rows && pos.y >= 0 && pos.y < self.cols
    }

    /// Get the state at position, `None` when out of bounds
    pub fn get(&self, pos: Position) -> Option<CellState> {
        self.index_of(pos).map(|index| self.cells[index])
    }

    /// Set the state at position. Out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Position, state: CellState) {
        if let Some(index) = self.index_of(pos) {
            self.cells[index] = state;
        }
    }

    /// Neighbours of `pos` in state `wanted`, checked North, East, South, West
    pub fn adjacent_matching(&self, pos: Position, wanted: CellState) -> Vec<Position> {
        let mut matches = Vec::with_capacity(4);
        for direction in Direction::ORTHOGONAL {
            let neighbor = pos.step(direction);
            if self.get(neighbor) == Some(wanted) {
                matches.push(neighbor);
            }
        }
        matches
    }

    /// Reset every cell in `state` to empty
    pub fn clear_state(&mut self, state: CellState) {
        for cell in &mut self.cells {
            if *cell == state {
                *cell = CellState::Empty;
            }
        }
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|cell| **cell == state).count()
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Row-major index of an in-bounds position
    pub fn index_of(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.x * self.cols + pos.y) as usize)
        } else {
            None
        }
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) / self.cols;
        let y = (index as i32) % self.cols;
        Position::new(x, y)
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), *cell))
    }

    /// One row of cells, `None` when the row is out of bounds
    pub fn row(&self, x: i32) -> Option<&[CellState]> {
        if x < 0 || x >= self.rows {
            return None;
        }
        let start = (x * self.cols) as usize;
        Some(&self.cells[start..start + self.cols as usize])
    }
}
