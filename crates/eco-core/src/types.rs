//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D position in the world.
///
/// `x` is the row and `y` is the column, so `(0, 0)` is the top-left cell and
/// row-major scan order is `x * cols + y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Neighbouring position one step in `direction`, possibly out of bounds
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }
}

/// Number of cells in a `rows x cols` grid.
///
/// `None` unless both sides are positive and every row-major index fits in an
/// `i32`, which is what [`Position`] arithmetic works in.
pub fn grid_area(rows: i32, cols: i32) -> Option<usize> {
    if rows <= 0 || cols <= 0 {
        return None;
    }
    rows.checked_mul(cols).map(|area| area as usize)
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal direction for movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Lookup order used by every neighbour query
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Row/column delta. North decreases the row.
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }
}

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    Rabbit,
    Fox,
    Rock,
}

impl CellState {
    /// Single-character symbol used by the text renderer
    pub fn symbol(&self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Rabbit => 'R',
            CellState::Fox => 'F',
            CellState::Rock => '*',
        }
    }

    /// Keyword used by the world file format, `None` for empty cells
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            CellState::Empty => None,
            CellState::Rabbit => Some("RABBIT"),
            CellState::Fox => Some("FOX"),
            CellState::Rock => Some("ROCK"),
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "RABBIT" => Some(CellState::Rabbit),
            "FOX" => Some(CellState::Fox),
            "ROCK" => Some(CellState::Rock),
            _ => None,
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellState::Empty => write!(f, "empty"),
            CellState::Rabbit => write!(f, "rabbit"),
            CellState::Fox => write!(f, "fox"),
            CellState::Rock => write!(f, "rock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_area_bounds() {
        assert_eq!(grid_area(4, 6), Some(24));
        assert_eq!(grid_area(1, i32::MAX), Some(i32::MAX as usize));
        assert_eq!(grid_area(0, 5), None);
        assert_eq!(grid_area(5, -1), None);
        assert_eq!(grid_area(50_000, 50_000), None);
        assert_eq!(grid_area(46_341, 46_341), None);
        assert_eq!(grid_area(46_340, 46_340), Some(46_340 * 46_340));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::North.to_delta(), (-1, 0));
        assert_eq!(Direction::East.to_delta(), (0, 1));
        assert_eq!(Direction::South.to_delta(), (1, 0));
        assert_eq!(Direction::West.to_delta(), (0, -1));
    }

    #[test]
    fn test_orthogonal_order_is_clockwise_from_north() {
        let origin = Position::new(1, 1);
        let steps: Vec<Position> = Direction::ORTHOGONAL
            .iter()
            .map(|d| origin.step(*d))
            .collect();
        assert_eq!(
            steps,
            vec![
                Position::new(0, 1),
                Position::new(1, 2),
                Position::new(2, 1),
                Position::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_cell_keywords() {
        for state in [CellState::Rabbit, CellState::Fox, CellState::Rock] {
            let keyword = state.keyword().unwrap();
            assert_eq!(CellState::from_keyword(keyword), Some(state));
        }
        assert_eq!(CellState::Empty.keyword(), None);
        assert_eq!(CellState::from_keyword("WOLF"), None);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(CellState::Empty.symbol(), '.');
        assert_eq!(CellState::Rabbit.symbol(), 'R');
        assert_eq!(CellState::Fox.symbol(), 'F');
        assert_eq!(CellState::Rock.symbol(), '*');
    }
}
