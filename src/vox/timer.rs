//! Hang-delay clock that owns the session's `recording` flag.
//!
//! The processor reports every above-threshold frame through
//! [`RecordingTimer::reset_trigger`]; the tick thread calls
//! [`RecordingTimer::evaluate`] on a fixed cadence and flips `recording`:
//!
//! - Idle to Active when a trigger was latched since the last tick, or the last
//!   trigger is younger than the hang delay.
//! - Active to Idle once the last trigger is older than hang delay + 1s. The
//!   stream processor is told to close its file on that edge.
//!
//! Between the two bounds the current state holds, so a borderline signal does
//! not flap the file open and shut.

use super::{CloseReason, WriterCommand};
use crate::audio::format_meter_line;
use crate::control::Console;
use crate::session::Session;
use crate::{lock_or_recover, log_debug};
use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Extra quiet time required on top of the hang delay before recording stops.
const STOP_MARGIN: Duration = Duration::from_secs(1);

/// Sleep granularity so the tick thread notices shutdown promptly.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// `last_trigger_ns` value meaning "never triggered" (or reset by a force stop).
const NEVER: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTransition {
    Started,
    Stopped,
    Unchanged,
}

pub struct RecordingTimer {
    session: Arc<Session>,
    epoch: Instant,
    /// Nanoseconds since `epoch` plus one; `NEVER` when unset.
    last_trigger_ns: AtomicU64,
    triggered: AtomicBool,
    close_tx: Sender<WriterCommand>,
    // Serializes evaluate against the control surface overrides.
    gate: Mutex<()>,
}

impl RecordingTimer {
    pub fn new(session: Arc<Session>, close_tx: Sender<WriterCommand>) -> Self {
        Self {
            session,
            epoch: Instant::now(),
            last_trigger_ns: AtomicU64::new(NEVER),
            triggered: AtomicBool::new(false),
            close_tx,
            gate: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Note that the level exceeded the threshold at `now`. Timestamps never
    /// move backwards.
    pub fn reset_trigger(&self, now: Instant) {
        let nanos = now.saturating_duration_since(self.epoch).as_nanos();
        let encoded = u64::try_from(nanos).unwrap_or(u64::MAX - 1) + 1;
        self.last_trigger_ns.fetch_max(encoded, Ordering::SeqCst);
        self.triggered.store(true, Ordering::SeqCst);
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        match self.last_trigger_ns.load(Ordering::SeqCst) {
            NEVER => None,
            encoded => Some(self.epoch + Duration::from_nanos(encoded - 1)),
        }
    }

    /// Run one tick of the state machine at `now`.
    pub fn evaluate(&self, now: Instant) -> TimerTransition {
        let _gate = lock_or_recover(&self.gate, "recording_timer.gate");
        let latched = self.triggered.swap(false, Ordering::SeqCst);
        let since = self
            .last_trigger()
            .map(|last| now.saturating_duration_since(last));
        let hang = self.session.hang_delay();
        let current = self.session.is_recording();

        let active = if latched {
            true
        } else {
            match since {
                None => false,
                Some(quiet) if quiet < hang => true,
                Some(quiet) if quiet > hang + STOP_MARGIN => false,
                Some(_) => current,
            }
        };

        if active == current {
            return TimerTransition::Unchanged;
        }
        self.session.swap_recording(active);
        if active {
            tracing::info!(
                threshold = self.session.threshold(),
                level = self.session.current_level(),
                "recording started"
            );
            TimerTransition::Started
        } else {
            tracing::info!(
                hang_delay_secs = hang.as_secs(),
                "recording stopped after hang delay"
            );
            self.send_close(CloseReason::HangDelayElapsed);
            TimerTransition::Stopped
        }
    }

    /// Forget the last trigger and drop to Idle immediately. Always asks the
    /// processor to close, which is a no-op when nothing is open. Returns
    /// whether recording was active.
    pub fn force_stop(&self) -> bool {
        let _gate = lock_or_recover(&self.gate, "recording_timer.gate");
        self.last_trigger_ns.store(NEVER, Ordering::SeqCst);
        self.triggered.store(false, Ordering::SeqCst);
        let was_recording = self.session.swap_recording(false);
        tracing::info!(was_recording, "recording force stopped");
        self.send_close(CloseReason::ForceStop);
        was_recording
    }

    /// Treat `now` as a trigger and go Active without waiting for a tick.
    /// Returns whether this changed the state.
    pub fn force_start(&self, now: Instant) -> bool {
        let _gate = lock_or_recover(&self.gate, "recording_timer.gate");
        self.reset_trigger(now);
        let was_recording = self.session.swap_recording(true);
        if !was_recording {
            tracing::info!("recording force started");
        }
        !was_recording
    }

    fn send_close(&self, reason: CloseReason) {
        if self.close_tx.send(WriterCommand::Close { reason }).is_err() {
            log_debug(&format!(
                "recording timer: close ({reason:?}) dropped, stream processor is gone"
            ));
        }
    }
}

/// Run the timer tick on its own thread until the session stops. When the
/// level meter is on, each tick also prints a meter line.
pub fn spawn_timer_thread(
    timer: Arc<RecordingTimer>,
    console: Console,
    tick: Duration,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("voxcorder-timer".to_string())
        .spawn(move || run_ticks(&timer, &console, tick))
        .context("failed to spawn recording timer thread")
}

fn run_ticks(timer: &RecordingTimer, console: &Console, tick: Duration) {
    let session = Arc::clone(timer.session());
    log_debug(&format!("recording timer started (tick {tick:?})"));
    while sleep_while_running(&session, tick) {
        timer.evaluate(Instant::now());
        if session.show_level_meter() {
            console.line(&format_meter_line(
                session.current_level(),
                session.is_recording(),
            ));
        }
    }
    log_debug("recording timer stopped");
}

/// Sleep for `total` in short slices. Returns `false` if the session stopped.
fn sleep_while_running(session: &Session, total: Duration) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if !session.is_running() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(SHUTDOWN_POLL));
    }
}
