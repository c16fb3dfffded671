//! Predator/prey grid simulation engine.
//!
//! Rabbits and foxes live on a bounded grid with rocks. Each generation every
//! animal plans its move against the committed grid, stages the result in a
//! double buffer and the buffer is committed once all workers are done, so the
//! outcome does not depend on how the work was split.

pub mod animal;
pub mod fox;
pub mod grid;
pub mod pacing;
pub mod rabbit;
pub mod render;
pub mod scheduler;
pub mod selector;
pub mod simulation;
pub mod staging;
pub mod world;
pub mod world_file;

pub use animal::{Animal, Fox, Rabbit};
pub use grid::Grid;
pub use pacing::{
    Control, GenerationView, Pacer, PacingCommand, PacingController, PacingFeedback,
    PacingState, Unpaced,
};
pub use render::{render_grid, render_stats};
pub use scheduler::Scheduler;
pub use simulation::{GenerationReport, Simulation, SimulationResult, Totals};
pub use world::{World, WorldSnapshot};
pub use world_file::{
    parse_world, read_world, save_initial_world, save_world, write_initial_world, write_world,
    WorldFile,
};
