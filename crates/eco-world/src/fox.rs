//! Fox phase of a generation.

use crate::animal::{Fox, Rabbit};
use crate::grid::Grid;
use crate::scheduler::{Scheduler, Tally};
use crate::selector::select_destination;
use crate::staging::StagingBuffer;
use eco_core::{CellState, Parameters, Position, Result};
use tracing::{debug, trace};

/// What one fox does this generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoxPlan {
    /// Found nothing to eat and reached the starvation threshold
    Starved { position: Position, hunger: u32 },
    Survives {
        /// The fox as it will be staged
        next: Fox,
        /// Cell a newborn should appear in, if the fox reproduced
        birth_at: Option<Position>,
        /// Rabbit cell the fox moved onto
        prey: Option<Position>,
    },
}

/// Decide a fox's move from the grid left by the rabbit phase.
///
/// An adjacent rabbit is always eaten and resets hunger. Otherwise the fox
/// gets hungrier, dies at the starvation threshold, or wanders into an empty
/// cell. Only a mature fox that actually moved reproduces.
pub fn plan_fox(fox: &Fox, grid: &Grid, params: &Parameters, generation: u64) -> FoxPlan {
    let origin = fox.position;
    let prey = grid.adjacent_matching(origin, CellState::Rabbit);

    let (destination, hunger, meal) = match select_destination(origin, &prey, generation) {
        Some(target) => (target, 0, Some(target)),
        None => {
            let hunger = fox.hunger.saturating_add(1);
            if hunger >= params.fox_starvation_threshold {
                return FoxPlan::Starved {
                    position: origin,
                    hunger,
                };
            }
            let empty = grid.adjacent_matching(origin, CellState::Empty);
            let destination = select_destination(origin, &empty, generation).unwrap_or(origin);
            (destination, hunger, None)
        }
    };

    let (age, birth_at) = if destination != origin && fox.age >= params.fox_maturity_age {
        (0, Some(origin))
    } else {
        (fox.age.saturating_add(1), None)
    };

    FoxPlan::Survives {
        next: Fox::with_state(destination, age, hunger),
        birth_at,
        prey: meal,
    }
}

#[derive(Debug, Default)]
struct FoxTally {
    kills: Vec<Position>,
    starved: usize,
    moved: usize,
}

impl Tally for FoxTally {
    fn merge(&mut self, mut other: Self) {
        self.kills.append(&mut other.kills);
        self.starved += other.starved;
        self.moved += other.moved;
    }
}

/// Counters for one fox phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoxPhase {
    pub moved: usize,
    pub births: usize,
    pub conflicts: usize,
    pub starved: usize,
    pub rabbits_eaten: usize,
}

/// Stage every fox in parallel, remove the rabbits they ate, then commit the
/// staged foxes and their newborns into `grid` and `foxes`.
///
/// On error nothing has been committed.
pub fn advance_foxes(
    grid: &mut Grid,
    foxes: &mut Vec<Fox>,
    rabbits: &mut Vec<Rabbit>,
    params: &Parameters,
    generation: u64,
    staging: &mut StagingBuffer<Fox>,
    scheduler: &Scheduler,
) -> Result<FoxPhase> {
    let tally: FoxTally = {
        let current: &Grid = grid;
        let staging: &StagingBuffer<Fox> = staging;
        scheduler.run(foxes.as_slice(), |tally: &mut FoxTally, fox| {
            match plan_fox(fox, current, params, generation) {
                FoxPlan::Starved { position, hunger } => {
                    trace!(x = position.x, y = position.y, hunger, "Fox starved");
                    tally.starved += 1;
                }
                FoxPlan::Survives {
                    next,
                    birth_at,
                    prey,
                } => {
                    if let Some(birth) = birth_at {
                        staging.mark_birth(birth);
                    }
                    if let Some(prey) = prey {
                        tally.kills.push(prey);
                    }
                    if next.position != fox.position {
                        tally.moved += 1;
                    }
                    staging.stage(next, fox.position);
                }
            }
        })?
    };

    // Several foxes may have jumped on the same rabbit
    let mut eaten = vec![false; grid.len()];
    for kill in &tally.kills {
        if let Some(index) = grid.index_of(*kill) {
            eaten[index] = true;
        }
    }
    let before = rabbits.len();
    rabbits.retain(|rabbit| {
        !grid
            .index_of(rabbit.position)
            .map(|index| eaten[index])
            .unwrap_or(false)
    });
    let rabbits_eaten = before - rabbits.len();
    for (index, _) in eaten.iter().enumerate().filter(|(_, eaten)| **eaten) {
        let pos = grid.index_to_pos(index);
        trace!(x = pos.x, y = pos.y, "Rabbit eaten");
        grid.set(pos, CellState::Empty);
    }

    let conflicts = staging.conflicts();
    let births = staging.commit(grid, foxes);

    debug!(
        generation,
        moved = tally.moved,
        births,
        conflicts,
        starved = tally.starved,
        rabbits_eaten,
        "Fox phase committed"
    );

    Ok(FoxPhase {
        moved: tally.moved,
        births,
        conflicts,
        starved: tally.starved,
        rabbits_eaten,
    })
}
