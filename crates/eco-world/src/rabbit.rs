//! Rabbit phase of a generation.

use crate::animal::Rabbit;
use crate::grid::Grid;
use crate::scheduler::{Scheduler, Tally};
use crate::selector::select_destination;
use crate::staging::StagingBuffer;
use eco_core::{CellState, Parameters, Position, Result};
use tracing::debug;

/// What one rabbit does this generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RabbitPlan {
    /// The rabbit as it will be staged
    pub next: Rabbit,
    /// Cell a newborn should appear in, if the rabbit reproduced
    pub birth_at: Option<Position>,
}

/// Decide a rabbit's move from the grid as it stood when the generation began.
///
/// Rabbits only step into empty cells. A mature rabbit that moves leaves a
/// newborn behind and its age starts over; everything else just ages.
pub fn plan_rabbit(
    rabbit: &Rabbit,
    grid: &Grid,
    params: &Parameters,
    generation: u64,
) -> RabbitPlan {
    let origin = rabbit.position;
    let empty = grid.adjacent_matching(origin, CellState::Empty);

    match select_destination(origin, &empty, generation) {
        Some(destination) if rabbit.age >= params.rabbit_maturity_age => RabbitPlan {
            next: Rabbit::with_age(destination, 0),
            birth_at: Some(origin),
        },
        Some(destination) => RabbitPlan {
            next: Rabbit::with_age(destination, rabbit.age.saturating_add(1)),
            birth_at: None,
        },
        None => RabbitPlan {
            next: Rabbit::with_age(origin, rabbit.age.saturating_add(1)),
            birth_at: None,
        },
    }
}

#[derive(Debug, Default)]
struct RabbitTally {
    moved: usize,
}

impl Tally for RabbitTally {
    fn merge(&mut self, other: Self) {
        self.moved += other.moved;
    }
}

/// Counters for one rabbit phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RabbitPhase {
    pub moved: usize,
    pub births: usize,
    pub conflicts: usize,
}

/// Stage every rabbit in parallel, then commit the staged rabbits and their
/// newborns into `grid` and `rabbits`.
///
/// On error nothing has been committed.
pub fn advance_rabbits(
    grid: &mut Grid,
    rabbits: &mut Vec<Rabbit>,
    params: &Parameters,
    generation: u64,
    staging: &mut StagingBuffer<Rabbit>,
    scheduler: &Scheduler,
) -> Result<RabbitPhase> {
    let tally: RabbitTally = {
        let current: &Grid = grid;
        let staging: &StagingBuffer<Rabbit> = staging;
        scheduler.run(rabbits.as_slice(), |tally: &mut RabbitTally, rabbit| {
            let plan = plan_rabbit(rabbit, current, params, generation);
            if let Some(birth) = plan.birth_at {
                staging.mark_birth(birth);
            }
            if plan.next.position != rabbit.position {
                tally.moved += 1;
            }
            staging.stage(plan.next, rabbit.position);
        })?
    };

    let conflicts = staging.conflicts();
    let births = staging.commit(grid, rabbits);

    debug!(
        generation,
        moved = tally.moved,
        births,
        conflicts,
        "Rabbit phase committed"
    );

    Ok(RabbitPhase {
        moved: tally.moved,
        births,
        conflicts,
    })
}
