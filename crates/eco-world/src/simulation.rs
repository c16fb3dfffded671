//! Simulation engine: drives the generation loop over a world.

use crate::animal::{Fox, Rabbit};
use crate::fox::advance_foxes;
use crate::grid::Grid;
use crate::pacing::{Control, GenerationView, Pacer, Unpaced};
use crate::rabbit::advance_rabbits;
use crate::scheduler::Scheduler;
use crate::staging::StagingBuffer;
use crate::world::{World, WorldSnapshot};
use eco_core::{CellState, Parameters, Result, RunConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, instrument, warn, Level};

/// Outcome of a single generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Index of the generation that produced this report, starting at 0
    pub generation: u64,
    pub rabbits: usize,
    pub foxes: usize,
    pub rabbit_births: usize,
    pub fox_births: usize,
    pub rabbits_eaten: usize,
    pub foxes_starved: usize,
    pub rabbit_conflicts: usize,
    pub fox_conflicts: usize,
}

/// Cumulative counters over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub rabbit_births: u64,
    pub fox_births: u64,
    pub rabbits_eaten: u64,
    pub foxes_starved: u64,
    pub conflicts: u64,
}

impl Totals {
    fn record(&mut self, report: &GenerationReport) {
        self.rabbit_births += report.rabbit_births as u64;
        self.fox_births += report.fox_births as u64;
        self.rabbits_eaten += report.rabbits_eaten as u64;
        self.foxes_starved += report.foxes_starved as u64;
        self.conflicts += (report.rabbit_conflicts + report.fox_conflicts) as u64;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub generations_run: u64,
    /// The pacer stopped the run before the last generation
    pub cancelled: bool,
    pub rabbits: usize,
    pub foxes: usize,
    pub rocks: usize,
    pub totals: Totals,
}

pub struct Simulation {
    grid: Grid,
    rabbits: Vec<Rabbit>,
    foxes: Vec<Fox>,
    params: Parameters,
    scheduler: Scheduler,
    rabbit_staging: StagingBuffer<Rabbit>,
    fox_staging: StagingBuffer<Fox>,
    /// Rabbits as they were before the current generation's rabbit commit
    rabbits_before: Vec<Rabbit>,
    rock_count: usize,
    generation: u64,
    progress_interval: u64,
    totals: Totals,
}

impl Simulation {
    pub fn new(world: World, params: Parameters, config: &RunConfig) -> Result<Self> {
        config.validate()?;
        let mut sim = Self::with_scheduler(world, params, &config.scheduler)?;
        sim.progress_interval = config.progress_interval;
        Ok(sim)
    }

    pub fn with_scheduler(
        world: World,
        params: Parameters,
        scheduler: &SchedulerConfig,
    ) -> Result<Self> {
        world.validate()?;
        let rock_count = world.rock_count();
        let World {
            grid,
            rabbits,
            foxes,
        } = world;

        let tie_break = scheduler.tie_break;

        Ok(Self {
            rabbit_staging: StagingBuffer::new(grid.rows, grid.cols, tie_break),
            fox_staging: StagingBuffer::new(grid.rows, grid.cols, tie_break),
            scheduler: Scheduler::new(scheduler)?,
            rabbits_before: Vec::with_capacity(rabbits.len()),
            grid,
            rabbits,
            foxes,
            params,
            rock_count,
            generation: 0,
            progress_interval: RunConfig::default().progress_interval,
            totals: Totals::default(),
        })
    }

    /// Generations committed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rabbits(&self) -> &[Rabbit] {
        &self.rabbits
    }

    pub fn foxes(&self) -> &[Fox] {
        &self.foxes
    }

    pub fn rock_count(&self) -> usize {
        self.rock_count
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn is_finished(&self) -> bool {
        self.generation >= self.params.generation_count
    }

    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            generation: self.generation,
            grid: &self.grid,
            rabbits: &self.rabbits,
            foxes: &self.foxes,
            rock_count: self.rock_count,
        }
    }

    /// Copy of the current world
    pub fn to_world(&self) -> World {
        World {
            grid: self.grid.clone(),
            rabbits: self.rabbits.clone(),
            foxes: self.foxes.clone(),
        }
    }

    /// Advance the world by one generation.
    ///
    /// On error the world is left exactly as it was before the call.
    pub fn step(&mut self) -> Result<GenerationReport> {
        let generation = self.generation;
        self.rabbit_staging.reset();
        self.fox_staging.reset();

        // The rabbit commit lands before the fox phase can fail
        self.rabbits_before.clone_from(&self.rabbits);

        let rabbit = advance_rabbits(
            &mut self.grid,
            &mut self.rabbits,
            &self.params,
            generation,
            &mut self.rabbit_staging,
            &self.scheduler,
        )?;

        let fox = match advance_foxes(
            &mut self.grid,
            &mut self.foxes,
            &mut self.rabbits,
            &self.params,
            generation,
            &mut self.fox_staging,
            &self.scheduler,
        ) {
            Ok(fox) => fox,
            Err(e) => {
                self.undo_rabbit_commit();
                warn!(generation, error = %e, "Generation rolled back");
                return Err(e);
            }
        };

        let report = GenerationReport {
            generation,
            rabbits: self.rabbits.len(),
            foxes: self.foxes.len(),
            rabbit_births: rabbit.births,
            fox_births: fox.births,
            rabbits_eaten: fox.rabbits_eaten,
            foxes_starved: fox.starved,
            rabbit_conflicts: rabbit.conflicts,
            fox_conflicts: fox.conflicts,
        };

        self.generation += 1;
        self.totals.record(&report);

        debug!(
            generation,
            rabbits = report.rabbits,
            foxes = report.foxes,
            rabbit_births = report.rabbit_births,
            fox_births = report.fox_births,
            rabbits_eaten = report.rabbits_eaten,
            foxes_starved = report.foxes_starved,
            "Generation committed"
        );

        Ok(report)
    }

    /// Put the rabbits back where they were before this generation.
    ///
    /// Only valid while the fox phase has committed nothing, so the rabbit
    /// commit is the only change on the grid.
    fn undo_rabbit_commit(&mut self) {
        self.grid.clear_state(CellState::Rabbit);
        for rabbit in &self.rabbits_before {
            self.grid.set(rabbit.position, CellState::Rabbit);
        }
        std::mem::swap(&mut self.rabbits, &mut self.rabbits_before);
    }

    /// Run the remaining generations back to back
    pub fn run(&mut self) -> Result<SimulationResult> {
        self.run_with(&mut Unpaced)
    }

    /// Run the remaining generations, consulting `pacer` after each one
    #[instrument(skip(self, pacer), fields(generations = self.params.generation_count))]
    pub fn run_with<P: Pacer + ?Sized>(&mut self, pacer: &mut P) -> Result<SimulationResult> {
        info!(
            rows = self.grid.rows,
            cols = self.grid.cols,
            rabbits = self.rabbits.len(),
            foxes = self.foxes.len(),
            rocks = self.rock_count,
            workers = self.scheduler.workers(),
            tie_break = %self.rabbit_staging.tie_break(),
            "Starting simulation for {} generations",
            self.params.generation_count
        );

        let mut cancelled = false;
        while !self.is_finished() {
            let report = self.step()?;

            if self.progress_interval > 0 && self.generation % self.progress_interval == 0 {
                self.emit_progress(&report);
            }

            let view = GenerationView {
                report: &report,
                snapshot: self.snapshot(),
            };
            if pacer.after_generation(&view) == Control::Halt {
                cancelled = !self.is_finished();
                if cancelled {
                    info!(generation = self.generation, "Run halted before the last generation");
                }
                break;
            }
        }

        self.emit_summary();

        Ok(SimulationResult {
            generations_run: self.generation,
            cancelled,
            rabbits: self.rabbits.len(),
            foxes: self.foxes.len(),
            rocks: self.rock_count,
            totals: self.totals,
        })
    }

    fn emit_progress(&self, report: &GenerationReport) {
        info!(
            "Generation {}/{}: {} rabbits, {} foxes",
            self.generation,
            self.params.generation_count,
            report.rabbits,
            report.foxes
        );

        event!(
            Level::INFO,
            gauge_name = "population_rabbits",
            gauge_value = report.rabbits,
            generation = self.generation,
            "Rabbit population"
        );

        event!(
            Level::INFO,
            gauge_name = "population_foxes",
            gauge_value = report.foxes,
            generation = self.generation,
            "Fox population"
        );
    }

    fn emit_summary(&self) {
        info!(
            event = "run_summary",
            generations = self.generation,
            rabbits = self.rabbits.len(),
            foxes = self.foxes.len(),
            rabbit_births = self.totals.rabbit_births,
            fox_births = self.totals.fox_births,
            rabbits_eaten = self.totals.rabbits_eaten,
            foxes_starved = self.totals.foxes_starved,
            conflicts = self.totals.conflicts,
            "Simulation finished"
        );

        if self.rabbits.is_empty() && self.foxes.is_empty() {
            info!(event = "extinction", "No animals survived");
        }
    }
}
