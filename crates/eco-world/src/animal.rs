//! Rabbit and fox state.

use eco_core::{CellState, Position};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt::Debug;

/// Behaviour shared by both species as far as staging and commit are concerned
pub trait Animal: Copy + Debug + Send + Sync {
    /// Cell state this species occupies on the grid
    const CELL: CellState;

    /// Conflict-resolution key; the greater rank keeps a contested cell
    type Rank: Ord;

    fn position(&self) -> Position;

    fn rank(&self) -> Self::Rank;

    /// A freshly born animal at `position`
    fn newborn(position: Position) -> Self;
}

/// A rabbit in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rabbit {
    pub position: Position,
    /// Generations since birth or since the last time it reproduced
    pub age: u32,
}

impl Rabbit {
    pub fn new(position: Position) -> Self {
        Self { position, age: 0 }
    }

    pub fn with_age(position: Position, age: u32) -> Self {
        Self { position, age }
    }
}

impl Animal for Rabbit {
    const CELL: CellState = CellState::Rabbit;
    type Rank = u32;

    fn position(&self) -> Position {
        self.position
    }

    fn rank(&self) -> u32 {
        self.age
    }

    fn newborn(position: Position) -> Self {
        Self::new(position)
    }
}

/// A fox in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fox {
    pub position: Position,
    /// Generations since birth or since the last time it reproduced
    pub age: u32,
    /// Generations since the last meal
    pub hunger: u32,
}

impl Fox {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            age: 0,
            hunger: 0,
        }
    }

    pub fn with_state(position: Position, age: u32, hunger: u32) -> Self {
        Self {
            position,
            age,
            hunger,
        }
    }
}

impl Animal for Fox {
    const CELL: CellState = CellState::Fox;
    /// Older wins, then the better fed.
    type Rank = (u32, Reverse<u32>);

    fn position(&self) -> Position {
        self.position
    }

    fn rank(&self) -> Self::Rank {
        (self.age, Reverse(self.hunger))
    }

    fn newborn(position: Position) -> Self {
        Self::new(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newborns_start_at_zero() {
        let rabbit = Rabbit::newborn(Position::new(2, 3));
        assert_eq!(rabbit.age, 0);
        assert_eq!(rabbit.position(), Position::new(2, 3));

        let fox = Fox::newborn(Position::new(1, 1));
        assert_eq!((fox.age, fox.hunger), (0, 0));
    }

    #[test]
    fn test_rabbit_rank_is_age() {
        let old = Rabbit::with_age(Position::new(0, 0), 5);
        let young = Rabbit::with_age(Position::new(0, 1), 2);
        assert!(old.rank() > young.rank());
    }

    #[test]
    fn test_fox_rank_prefers_age_then_low_hunger() {
        let pos = Position::new(0, 0);
        let old_hungry = Fox::with_state(pos, 4, 3);
        let young_fed = Fox::with_state(pos, 3, 0);
        assert!(old_hungry.rank() > young_fed.rank());

        let fed = Fox::with_state(pos, 4, 1);
        assert!(fed.rank() > old_hungry.rank());

        let twin = Fox::with_state(Position::new(5, 5), 4, 1);
        assert_eq!(fed.rank(), twin.rank());
    }
}
