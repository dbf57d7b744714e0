//! Interactive command loop for a running recorder.
//!
//! Single-key commands read and write the shared [`Session`]; recording
//! overrides go through the [`RecordingTimer`] so it stays the only writer of
//! the `recording` flag.

mod console;
mod input;

pub use console::Console;
pub use input::{CommandInput, InputEvent, LineInput, TerminalInput};

#[cfg(test)]
pub(crate) use console::CapturedOutput;
#[cfg(test)]
pub(crate) use input::ScriptedInput;

use crate::config::{DEFAULT_THRESHOLD, MIN_THRESHOLD};
use crate::log_debug;
use crate::session::Session;
use crate::vox::RecordingTimer;
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Threshold restored when recording is switched off by hand.
pub const QUIET_THRESHOLD: u32 = DEFAULT_THRESHOLD;

/// How often the loop wakes up to notice a session stopped elsewhere.
const INPUT_POLL: Duration = Duration::from_millis(200);

const HELP_LINES: [&str; 2] = [
    "h: help, f: show filename, k:show peak level, p: show peak",
    "q: quit, r: record on/off, v: set trigger level",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    ShowLevel,
    SetThreshold,
    ShowFilename,
    ToggleRecord,
    ToggleMeter,
    Quit,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'h' | '?' => Some(Self::Help),
            'k' => Some(Self::ShowLevel),
            'v' => Some(Self::SetThreshold),
            'f' => Some(Self::ShowFilename),
            'r' => Some(Self::ToggleRecord),
            'p' => Some(Self::ToggleMeter),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct ControlSurface {
    session: Arc<Session>,
    timer: Arc<RecordingTimer>,
    console: Console,
}

impl ControlSurface {
    pub fn new(session: Arc<Session>, timer: Arc<RecordingTimer>, console: Console) -> Self {
        Self {
            session,
            timer,
            console,
        }
    }

    /// Read and execute commands until quit, end of input, or the session
    /// stopping for another reason.
    pub fn run(&self, input: &mut dyn CommandInput) -> Result<()> {
        while self.session.is_running() {
            match input.next_event(INPUT_POLL)? {
                None => {}
                Some(InputEvent::Key(key)) => match Command::from_key(key) {
                    Some(command) => {
                        if self.execute(command, input)? == Flow::Quit {
                            break;
                        }
                    }
                    None => log_debug(&format!("ignoring unknown command key {key:?}")),
                },
                Some(InputEvent::Interrupt) | Some(InputEvent::Closed) => {
                    self.execute(Command::Quit, input)?;
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn execute(&self, command: Command, input: &mut dyn CommandInput) -> Result<Flow> {
        match command {
            Command::Help => {
                for line in HELP_LINES {
                    self.console.line(line);
                }
            }
            Command::ShowLevel => {
                self.console.line(&format!(
                    "Peak/Trigger: {} {}",
                    self.session.current_level(),
                    self.session.threshold()
                ));
            }
            Command::SetThreshold => self.prompt_threshold(input)?,
            Command::ShowFilename => self.show_filename(),
            Command::ToggleRecord => {
                if self.session.is_recording() {
                    self.stop_recording();
                    self.console.line("Recording disabled");
                } else {
                    self.session.set_threshold_clamped(MIN_THRESHOLD);
                    self.timer.force_start(Instant::now());
                    self.console.line("Recording enabled");
                }
            }
            Command::ToggleMeter => {
                let shown = self.session.toggle_level_meter();
                log_debug(&format!("level meter {}", if shown { "on" } else { "off" }));
            }
            Command::Quit => {
                self.console.line("Quitting...");
                self.timer.force_stop();
                self.session.shutdown();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Force the timer Idle (which closes the file) and go back to the quiet
    /// threshold. Safe to repeat.
    pub fn stop_recording(&self) {
        self.timer.force_stop();
        self.session.set_threshold_clamped(QUIET_THRESHOLD);
    }

    fn show_filename(&self) {
        if !self.session.is_recording() {
            self.console.line("Not recording");
            return;
        }
        let name = self
            .session
            .recording_file()
            .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "No File".to_string());
        self.console.line(&format!("Filename: {name}"));
    }

    fn prompt_threshold(&self, input: &mut dyn CommandInput) -> Result<()> {
        // Meter lines would land in the middle of the typed number.
        let meter_was_on = self.session.show_level_meter();
        self.session.set_show_level_meter(false);
        self.console.print("New Peak Limit: ");
        let entered = input.read_line();
        self.session.set_show_level_meter(meter_was_on);

        let Some(raw) = entered? else {
            return Ok(());
        };
        match raw.trim().parse::<u32>() {
            Ok(value) => match self.session.set_threshold(value) {
                Ok(()) => {
                    tracing::info!(threshold = value, "threshold changed");
                }
                Err(err) => self.console.line(&format!("? {err}")),
            },
            Err(_) => self.console.line("? Number not recognized"),
        }
        Ok(())
    }
}
