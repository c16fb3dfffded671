//! A complete world: the grid plus both populations.

use crate::animal::{Fox, Rabbit};
use crate::grid::Grid;
use eco_core::{grid_area, CellState, Error, GeneratorConfig, Position, Result};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub grid: Grid,
    pub rabbits: Vec<Rabbit>,
    pub foxes: Vec<Fox>,
}

impl World {
    /// An empty `rows x cols` world
    pub fn new(rows: i32, cols: i32) -> Result<Self> {
        if rows <= 0 || cols <= 0 {
            return Err(Error::MalformedWorld(format!(
                "grid must be at least 1x1, got {}x{}",
                rows, cols
            )));
        }
        if grid_area(rows, cols).is_none() {
            return Err(Error::MalformedWorld(format!(
                "grid of {}x{} has more cells than can be indexed",
                rows, cols
            )));
        }
        Ok(Self {
            grid: Grid::new(rows, cols),
            rabbits: Vec::new(),
            foxes: Vec::new(),
        })
    }

    /// Put a rock or a fresh animal on an empty cell
    pub fn place(&mut self, state: CellState, pos: Position) -> Result<()> {
        match self.grid.get(pos) {
            None => {
                return Err(Error::MalformedWorld(format!(
                    "{} at {} lies outside the {}x{} grid",
                    state, pos, self.grid.rows, self.grid.cols
                )))
            }
            Some(CellState::Empty) => {}
            Some(occupant) => {
                return Err(Error::MalformedWorld(format!(
                    "cannot place {} at {}: cell already holds a {}",
                    state, pos, occupant
                )))
            }
        }

        match state {
            CellState::Rabbit => self.rabbits.push(Rabbit::new(pos)),
            CellState::Fox => self.foxes.push(Fox::new(pos)),
            CellState::Rock => {}
            CellState::Empty => return Ok(()),
        }
        self.grid.set(pos, state);
        Ok(())
    }

    /// Check that every animal sits on a cell of its own species, no two
    /// animals share a cell and the grid holds no unlisted animals.
    pub fn validate(&self) -> Result<()> {
        if self.grid.rows <= 0 || self.grid.cols <= 0 {
            return Err(Error::MalformedWorld(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.rows, self.grid.cols
            )));
        }
        if grid_area(self.grid.rows, self.grid.cols) != Some(self.grid.len()) {
            return Err(Error::MalformedWorld(format!(
                "grid of {}x{} has more cells than can be indexed",
                self.grid.rows, self.grid.cols
            )));
        }

        let mut seen = HashSet::with_capacity(self.rabbits.len() + self.foxes.len());
        let positions = self
            .rabbits
            .iter()
            .map(|r| (CellState::Rabbit, r.position))
            .chain(self.foxes.iter().map(|f| (CellState::Fox, f.position)));

        for (species, pos) in positions {
            match self.grid.get(pos) {
                Some(state) if state == species => {}
                Some(state) => {
                    return Err(Error::MalformedWorld(format!(
                        "{} listed at {} but the cell holds {}",
                        species, pos, state
                    )))
                }
                None => {
                    return Err(Error::MalformedWorld(format!(
                        "{} at {} lies outside the grid",
                        species, pos
                    )))
                }
            }
            if !seen.insert(pos) {
                return Err(Error::MalformedWorld(format!(
                    "more than one animal claims {}",
                    pos
                )));
            }
        }

        let grid_rabbits = self.grid.count(CellState::Rabbit);
        let grid_foxes = self.grid.count(CellState::Fox);
        if grid_rabbits != self.rabbits.len() || grid_foxes != self.foxes.len() {
            return Err(Error::MalformedWorld(format!(
                "grid holds {} rabbits and {} foxes but {} and {} are listed",
                grid_rabbits,
                grid_foxes,
                self.rabbits.len(),
                self.foxes.len()
            )));
        }

        Ok(())
    }

    pub fn rock_count(&self) -> usize {
        self.grid.count(CellState::Rock)
    }

    /// Fill a fresh world by rolling each cell against the configured densities
    pub fn generate(config: &GeneratorConfig, rng: &mut ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let mut world = Self::new(config.rows, config.cols)?;

        let rock_limit = config.rock_density;
        let rabbit_limit = rock_limit + config.rabbit_density;
        let fox_limit = rabbit_limit + config.fox_density;

        for x in 0..config.rows {
            for y in 0..config.cols {
                let roll = rng.gen::<f32>();
                let state = if roll < rock_limit {
                    CellState::Rock
                } else if roll < rabbit_limit {
                    CellState::Rabbit
                } else if roll < fox_limit {
                    CellState::Fox
                } else {
                    continue;
                };
                world.place(state, Position::new(x, y))?;
            }
        }

        Ok(world)
    }

    pub fn snapshot(&self, generation: u64) -> WorldSnapshot<'_> {
        WorldSnapshot {
            generation,
            grid: &self.grid,
            rabbits: &self.rabbits,
            foxes: &self.foxes,
            rock_count: self.rock_count(),
        }
    }
}

/// Read-only view of a world at a generation boundary
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WorldSnapshot<'a> {
    pub generation: u64,
    pub grid: &'a Grid,
    pub rabbits: &'a [Rabbit],
    pub foxes: &'a [Fox],
    pub rock_count: usize,
}

impl WorldSnapshot<'_> {
    /// Every occupied cell in row-major order
    pub fn occupants(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        self.grid
            .iter()
            .filter(|(_, state)| *state != CellState::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_place_builds_populations() {
        let mut world = World::new(3, 3).unwrap();
        world.place(CellState::Rock, Position::new(0, 0)).unwrap();
        world.place(CellState::Rabbit, Position::new(1, 1)).unwrap();
        world.place(CellState::Fox, Position::new(2, 2)).unwrap();

        assert_eq!(world.rock_count(), 1);
        assert_eq!(world.rabbits, vec![Rabbit::new(Position::new(1, 1))]);
        assert_eq!(world.foxes, vec![Fox::new(Position::new(2, 2))]);
        world.validate().unwrap();
    }

    #[test]
    fn test_place_rejects_out_of_bounds_and_overlap() {
        let mut world = World::new(2, 2).unwrap();
        assert!(matches!(
            world.place(CellState::Rock, Position::new(2, 0)),
            Err(Error::MalformedWorld(_))
        ));

        world.place(CellState::Fox, Position::new(1, 1)).unwrap();
        assert!(matches!(
            world.place(CellState::Rabbit, Position::new(1, 1)),
            Err(Error::MalformedWorld(_))
        ));
        assert!(world.rabbits.is_empty());
    }

    #[test]
    fn test_zero_sized_world_rejected() {
        assert!(World::new(0, 5).is_err());
        assert!(World::new(4, -1).is_err());
    }

    #[test]
    fn test_oversized_world_rejected() {
        assert!(matches!(
            World::new(50_000, 50_000),
            Err(Error::MalformedWorld(_))
        ));
        assert!(matches!(
            World::new(2, i32::MAX),
            Err(Error::MalformedWorld(_))
        ));

        let unindexable = World {
            grid: Grid::new(i32::MAX, i32::MAX),
            rabbits: vec![],
            foxes: vec![],
        };
        assert!(matches!(unindexable.validate(), Err(Error::MalformedWorld(_))));
    }

    fn validate_parts(grid: &Grid, rabbits: Vec<Rabbit>) -> Result<()> {
        World {
            grid: grid.clone(),
            rabbits,
            foxes: vec![],
        }
        .validate()
    }

    #[test]
    fn test_validate_detects_mismatch() {
        let mut grid = Grid::new(2, 2);
        grid.set(Position::new(0, 0), CellState::Rabbit);

        // Listed rabbit on the wrong cell
        assert!(validate_parts(&grid, vec![Rabbit::new(Position::new(1, 1))]).is_err());

        // Unlisted rabbit on the grid
        assert!(validate_parts(&grid, vec![]).is_err());

        // Duplicate listing
        let doubled = vec![
            Rabbit::new(Position::new(0, 0)),
            Rabbit::new(Position::new(0, 0)),
        ];
        assert!(validate_parts(&grid, doubled).is_err());

        assert!(validate_parts(&grid, vec![Rabbit::new(Position::new(0, 0))]).is_ok());
    }

    #[test]
    fn test_generate_is_seeded() {
        let config = GeneratorConfig {
            rows: 20,
            cols: 20,
            rock_density: 0.1,
            rabbit_density: 0.3,
            fox_density: 0.1,
            seed: 42,
        };

        let first = World::generate(&config, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let second = World::generate(&config, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
        first.validate().unwrap();

        // Loose bounds around the expected 40 rocks, 120 rabbits and 40 foxes
        assert!(first.rock_count() > 10 && first.rock_count() < 80);
        assert!(first.rabbits.len() > 70 && first.rabbits.len() < 170);
        assert!(first.foxes.len() > 10 && first.foxes.len() < 80);
    }

    #[test]
    fn test_snapshot_lists_occupants_row_major() {
        let mut world = World::new(2, 2).unwrap();
        world.place(CellState::Fox, Position::new(1, 0)).unwrap();
        world.place(CellState::Rock, Position::new(0, 1)).unwrap();

        let snapshot = world.snapshot(0);
        let occupants: Vec<_> = snapshot.occupants().collect();
        assert_eq!(
            occupants,
            vec![
                (Position::new(0, 1), CellState::Rock),
                (Position::new(1, 0), CellState::Fox),
            ]
        );
        assert_eq!(snapshot.rock_count, 1);
    }
}
