use crate::lock_or_recover;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Shared user-facing output. Lines end in `\r\n` because stdout may be in
/// raw mode, and each write happens under one lock so the timer's meter lines
/// never interleave with command replies.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    pub fn line(&self, message: &str) {
        let mut out = lock_or_recover(&self.out, "console");
        let _ = write!(out, "{message}\r\n");
        let _ = out.flush();
    }

    /// Write without a line ending (prompts, echoed keystrokes).
    pub fn print(&self, text: &str) {
        let mut out = lock_or_recover(&self.out, "console");
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// In-memory console sink for tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl CapturedOutput {
    pub(crate) fn console() -> (Console, Self) {
        let captured = Self::default();
        (Console::new(captured.clone()), captured)
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&lock_or_recover(&self.0, "captured_output")).into_owned()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.text()
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock_or_recover(&self.0, "captured_output").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
