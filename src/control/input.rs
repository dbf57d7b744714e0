//! Where control commands come from.
//!
//! On a terminal, stdin goes to raw mode and every key is a command. Otherwise
//! stdin is read line by line on a helper thread and the first non-blank
//! character of each line is the command.

use super::Console;
use crate::log_debug;
use crate::terminal_restore::TerminalRestoreGuard;
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::BufRead;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(char),
    /// Ctrl-C while stdin is in raw mode.
    Interrupt,
    /// No more input will arrive.
    Closed,
}

pub trait CommandInput {
    /// Wait up to `timeout` for the next command key. `Ok(None)` means nothing
    /// arrived in time.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>>;

    /// Block for one line of free text. `Ok(None)` means the entry was
    /// cancelled or input ended.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// Single-key commands from a raw-mode terminal. Raw mode ends on drop.
pub struct TerminalInput {
    _guard: TerminalRestoreGuard,
    console: Console,
}

impl TerminalInput {
    pub fn new(console: Console) -> Result<Self> {
        let guard = TerminalRestoreGuard::new();
        guard
            .enable_raw_mode()
            .context("failed to put the terminal in raw mode")?;
        Ok(Self {
            _guard: guard,
            console,
        })
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

impl CommandInput for TerminalInput {
    fn next_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        if !event::poll(timeout).context("terminal poll failed")? {
            return Ok(None);
        }
        match event::read().context("terminal read failed")? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if is_ctrl_c(&key) {
                    return Ok(Some(InputEvent::Interrupt));
                }
                match key.code {
                    KeyCode::Char(ch) => Ok(Some(InputEvent::Key(ch))),
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        loop {
            let key = match event::read().context("terminal read failed")? {
                Event::Key(key) if key.kind != KeyEventKind::Release => key,
                _ => continue,
            };
            if is_ctrl_c(&key) {
                self.console.line("");
                return Ok(None);
            }
            match key.code {
                KeyCode::Enter => {
                    self.console.line("");
                    return Ok(Some(line));
                }
                KeyCode::Esc => {
                    self.console.line("");
                    return Ok(None);
                }
                KeyCode::Backspace => {
                    if line.pop().is_some() {
                        self.console.print("\u{8} \u{8}");
                    }
                }
                KeyCode::Char(ch) => {
                    line.push(ch);
                    self.console.print(ch.encode_utf8(&mut [0u8; 4]));
                }
                _ => {}
            }
        }
    }
}

/// Line-oriented commands from a pipe or file.
pub struct LineInput {
    lines: Receiver<String>,
}

impl LineInput {
    /// Read `reader` on a helper thread. End of input closes the channel.
    pub fn spawn<R>(reader: R) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("voxcorder-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                return;
                            }
                        }
                        Err(err) => {
                            log_debug(&format!("command input read error: {err}"));
                            return;
                        }
                    }
                }
            })
            .context("failed to spawn command input thread")?;
        Ok(Self { lines: rx })
    }
}

impl CommandInput for LineInput {
    fn next_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => Ok(line.trim().chars().next().map(InputEvent::Key)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Ok(Some(InputEvent::Closed)),
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.recv().ok())
    }
}

/// Canned input for driving the control surface in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct ScriptedInput {
    pub(crate) events: std::collections::VecDeque<InputEvent>,
    pub(crate) lines: std::collections::VecDeque<String>,
}

#[cfg(test)]
impl ScriptedInput {
    pub(crate) fn keys(keys: &str) -> Self {
        Self {
            events: keys.chars().map(InputEvent::Key).collect(),
            lines: Default::default(),
        }
    }

    pub(crate) fn with_line(mut self, line: &str) -> Self {
        self.lines.push_back(line.to_string());
        self
    }
}

#[cfg(test)]
impl CommandInput for ScriptedInput {
    fn next_event(&mut self, _timeout: Duration) -> Result<Option<InputEvent>> {
        Ok(Some(self.events.pop_front().unwrap_or(InputEvent::Closed)))
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
