//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::grid_area;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Life-cycle parameters, fixed for the duration of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Generations a rabbit must age before it can leave offspring behind
    pub rabbit_maturity_age: u32,
    /// Generations a fox must age before it can leave offspring behind
    pub fox_maturity_age: u32,
    /// Hunger at which a fox starves
    pub fox_starvation_threshold: u32,
    /// Number of generations to simulate
    pub generation_count: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            rabbit_maturity_age: 2,
            fox_maturity_age: 8,
            fox_starvation_threshold: 4,
            generation_count: 100,
        }
    }
}

/// How a conflict is settled once both contenders tie on every rank field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The contender whose origin cell comes first in row-major order wins.
    /// Independent of processing order, so any worker count gives the same world.
    #[default]
    ScanOrder,
    /// The earlier claim keeps the cell. Deterministic with a single worker only.
    ArrivalOrder,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::ScanOrder => write!(f, "scan"),
            TieBreak::ArrivalOrder => write!(f, "arrival"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scan" | "scan_order" => Ok(TieBreak::ScanOrder),
            "arrival" | "arrival_order" => Ok(TieBreak::ArrivalOrder),
            other => Err(format!("unknown tie-break policy '{}' (expected scan or arrival)", other)),
        }
    }
}

/// Worker pool configuration for the per-animal update loops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker threads; 0 uses every available core, 1 runs sequentially
    pub workers: usize,
    /// Animals handed to a worker at a time
    pub partition_size: usize,
    /// Policy for full ties in conflict resolution
    pub tie_break: TieBreak,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            partition_size: 8,
            tie_break: TieBreak::ScanOrder,
        }
    }
}

impl SchedulerConfig {
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.partition_size == 0 {
            return Err(Error::Validation(
                "partition_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Timing of the interactive mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay between generations when the run starts (milliseconds)
    pub initial_delay_ms: u64,
    /// Fastest allowed delay (milliseconds)
    pub min_delay_ms: u64,
    /// Change applied by one speed-up or slow-down command (milliseconds)
    pub delay_step_ms: u64,
    /// Keyboard poll interval (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 600,
            min_delay_ms: 50,
            delay_step_ms: 50,
            poll_interval_ms: 50,
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_delay_ms > self.initial_delay_ms {
            return Err(Error::Validation(format!(
                "min_delay_ms ({}) exceeds initial_delay_ms ({})",
                self.min_delay_ms, self.initial_delay_ms
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Validation(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Random initial world parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of rows
    pub rows: i32,
    /// Number of columns
    pub cols: i32,
    /// Rock density (0.0 to 1.0)
    pub rock_density: f32,
    /// Rabbit density (0.0 to 1.0)
    pub rabbit_density: f32,
    /// Fox density (0.0 to 1.0)
    pub fox_density: f32,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 32,
            rock_density: 0.05,
            rabbit_density: 0.25,
            fox_density: 0.05,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows <= 0 || self.cols <= 0 {
            return Err(Error::Validation(format!(
                "grid must be at least 1x1, got {}x{}",
                self.rows, self.cols
            )));
        }
        if grid_area(self.rows, self.cols).is_none() {
            return Err(Error::Validation(format!(
                "grid of {}x{} has more cells than can be indexed",
                self.rows, self.cols
            )));
        }
        let densities = [self.rock_density, self.rabbit_density, self.fox_density];
        if densities.iter().any(|d| !(0.0..=1.0).contains(d)) {
            return Err(Error::Validation(
                "densities must lie between 0.0 and 1.0".to_string(),
            ));
        }
        if densities.iter().sum::<f32>() > 1.0 {
            return Err(Error::Validation(
                "densities must not add up to more than 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a run needs besides the world itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Life-cycle parameters; when absent the world file's values are used
    pub parameters: Option<Parameters>,
    /// Worker pool configuration
    pub scheduler: SchedulerConfig,
    /// Interactive mode timing
    pub pacing: PacingConfig,
    /// Generations between progress log lines
    pub progress_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            parameters: None,
            scheduler: SchedulerConfig::default(),
            pacing: PacingConfig::default(),
            progress_interval: 100,
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;
        self.pacing.validate()
    }
}
