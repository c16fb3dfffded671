//! Keyboard-driven pacing for `ecosim run --interactive`.

use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use eco_core::PacingConfig;
use eco_world::{
    render_grid, render_stats, Control, GenerationView, Pacer, PacingCommand, PacingController,
    PacingFeedback, PacingState,
};
use std::io::{self, Stdout, Write};
use std::time::Instant;
use tracing::error;

const HELP: &str = "\n--- CONTROLS ---\np: pause/resume\n+: faster\n-: slower\nq: quit\nh: help\n----------------\n";

/// Redraws the world after every generation and waits out the delay while
/// listening for keys. Raw mode is left again when the pacer is dropped.
pub struct TerminalPacer {
    controller: PacingController,
    stdout: Stdout,
}

impl TerminalPacer {
    pub fn new(config: &PacingConfig) -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        Ok(Self {
            controller: PacingController::new(config),
            stdout: io::stdout(),
        })
    }

    fn draw(&mut self, view: &GenerationView<'_>) -> io::Result<()> {
        let snapshot = &view.snapshot;
        execute!(self.stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        self.print(&render_grid(snapshot.grid, snapshot.generation))?;
        self.print(&render_stats(
            snapshot.generation,
            snapshot.rabbits.len(),
            snapshot.foxes.len(),
        ))?;
        let status = match self.controller.state() {
            PacingState::Paused => "PAUSED (press 'p' to resume)",
            _ => "RUNNING (press 'p' to pause, 'h' for help)",
        };
        self.print(&format!(
            "Delay: {}ms | {}\n",
            self.controller.delay().as_millis(),
            status
        ))
    }

    /// Raw mode does not translate `\n`, so every line needs its own `\r`
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.stdout.write_all(text.replace('\n', "\r\n").as_bytes())?;
        self.stdout.flush()
    }

    fn announce(&mut self, feedback: PacingFeedback) -> io::Result<()> {
        match feedback {
            PacingFeedback::Paused => self.print("Simulation paused. Press 'p' to resume.\n"),
            PacingFeedback::Resumed => self.print("Simulation resumed.\n"),
            PacingFeedback::Delay(delay) => {
                self.print(&format!("Delay: {}ms\n", delay.as_millis()))
            }
            PacingFeedback::Quitting => self.print("Stopping simulation...\n"),
            PacingFeedback::ShowHelp => self.print(HELP),
            PacingFeedback::Ignored => Ok(()),
        }
    }

    /// Block until the delay has passed while running, or until the user quits
    fn wait(&mut self) -> io::Result<Control> {
        let mut started = Instant::now();
        loop {
            if event::poll(self.controller.poll_interval())? {
                if let Event::Key(key) = event::read()? {
                    if let Some(command) = command_for(key) {
                        let feedback = self.controller.apply(command);
                        self.announce(feedback)?;
                    }
                }
            }

            match self.controller.state() {
                PacingState::Stopped => return Ok(Control::Halt),
                // The full delay starts over once resumed
                PacingState::Paused => started = Instant::now(),
                PacingState::Running => {
                    if started.elapsed() >= self.controller.delay() {
                        return Ok(Control::Continue);
                    }
                }
            }
        }
    }
}

impl Pacer for TerminalPacer {
    fn after_generation(&mut self, view: &GenerationView<'_>) -> Control {
        if let Err(err) = self.draw(view) {
            error!(?err, "failed to draw generation");
        }
        match self.wait() {
            Ok(control) => control,
            Err(err) => {
                error!(?err, "failed to read keyboard input");
                Control::Halt
            }
        }
    }
}

impl Drop for TerminalPacer {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.stdout, Clear(ClearType::All), MoveTo(0, 0)) {
            error!(?err, "failed to clear screen");
        }
        if let Err(err) = disable_raw_mode() {
            error!(?err, "failed to disable raw mode");
        }
    }
}

fn command_for(key: KeyEvent) -> Option<PacingCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(PacingCommand::Quit),
        (KeyCode::Char('p') | KeyCode::Char('P'), _) => Some(PacingCommand::TogglePause),
        (KeyCode::Char('+') | KeyCode::Char('='), _) => Some(PacingCommand::SpeedUp),
        (KeyCode::Char('-') | KeyCode::Char('_'), _) => Some(PacingCommand::SlowDown),
        (KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc, _) => Some(PacingCommand::Quit),
        (KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?'), _) => {
            Some(PacingCommand::Help)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(
            command_for(press(KeyCode::Char('p'))),
            Some(PacingCommand::TogglePause)
        );
        assert_eq!(
            command_for(press(KeyCode::Char('+'))),
            Some(PacingCommand::SpeedUp)
        );
        assert_eq!(
            command_for(press(KeyCode::Char('-'))),
            Some(PacingCommand::SlowDown)
        );
        assert_eq!(command_for(press(KeyCode::Char('q'))), Some(PacingCommand::Quit));
        assert_eq!(command_for(press(KeyCode::Char('h'))), Some(PacingCommand::Help));
        assert_eq!(command_for(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for(key), Some(PacingCommand::Quit));
    }

    #[test]
    fn test_release_events_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(command_for(key), None);
    }
}
