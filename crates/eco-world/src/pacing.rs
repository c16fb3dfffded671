//! Generation pacing for interactive runs.
//!
//! The simulation hands control to a [`Pacer`] after every committed
//! generation. Batch runs use [`Unpaced`]; the terminal front end wraps a
//! [`PacingController`] that turns key presses into pause, speed and quit
//! commands.

use crate::simulation::GenerationReport;
use crate::world::WorldSnapshot;
use eco_core::PacingConfig;
use std::time::Duration;

/// Whether the run should go on after a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Halt,
}

/// What a pacer gets to see after each generation
#[derive(Debug, Clone, Copy)]
pub struct GenerationView<'a> {
    pub report: &'a GenerationReport,
    pub snapshot: WorldSnapshot<'a>,
}

pub trait Pacer {
    /// Called once per committed generation, before the next one starts
    fn after_generation(&mut self, view: &GenerationView<'_>) -> Control;
}

/// Runs every generation back to back
#[derive(Debug, Default, Clone, Copy)]
pub struct Unpaced;

impl Pacer for Unpaced {
    fn after_generation(&mut self, _view: &GenerationView<'_>) -> Control {
        Control::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingState {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingCommand {
    TogglePause,
    SpeedUp,
    SlowDown,
    Quit,
    Help,
}

/// Result of applying a command, for the front end to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingFeedback {
    Paused,
    Resumed,
    Delay(Duration),
    Quitting,
    ShowHelp,
    /// The command has no effect in the current state
    Ignored,
}

#[derive(Debug, Clone)]
pub struct PacingController {
    state: PacingState,
    delay: Duration,
    min_delay: Duration,
    step: Duration,
    poll_interval: Duration,
}

impl PacingController {
    pub fn new(config: &PacingConfig) -> Self {
        let min_delay = Duration::from_millis(config.min_delay_ms);
        Self {
            state: PacingState::Running,
            delay: Duration::from_millis(config.initial_delay_ms).max(min_delay),
            min_delay,
            step: Duration::from_millis(config.delay_step_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    pub fn state(&self) -> PacingState {
        self.state
    }

    /// Pause between two generations while running
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// How long to wait for input before checking the state again
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn should_continue(&self) -> bool {
        self.state != PacingState::Stopped
    }

    pub fn apply(&mut self, command: PacingCommand) -> PacingFeedback {
        if self.state == PacingState::Stopped {
            return PacingFeedback::Ignored;
        }

        match command {
            PacingCommand::TogglePause => match self.state {
                PacingState::Running => {
                    self.state = PacingState::Paused;
                    PacingFeedback::Paused
                }
                _ => {
                    self.state = PacingState::Running;
                    PacingFeedback::Resumed
                }
            },
            PacingCommand::SpeedUp => {
                let faster = self.delay.saturating_sub(self.step).max(self.min_delay);
                if faster == self.delay {
                    return PacingFeedback::Ignored;
                }
                self.delay = faster;
                PacingFeedback::Delay(faster)
            }
            PacingCommand::SlowDown => {
                self.delay = self.delay.saturating_add(self.step);
                PacingFeedback::Delay(self.delay)
            }
            PacingCommand::Quit => {
                self.state = PacingState::Stopped;
                PacingFeedback::Quitting
            }
            PacingCommand::Help => PacingFeedback::ShowHelp,
        }
    }
}
