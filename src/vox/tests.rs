use super::*;
use crate::audio::{sample_queue, FrameSink};
use crate::control::{CapturedOutput, Command, ControlSurface, ScriptedInput};
use crate::session::Session;
use crossbeam_channel::Receiver;
use hound::WavReader;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SAMPLE_RATE: u32 = 8_000;
const FRAME_LEN: usize = 4;

fn session(threshold: u32, hang_secs: u64, pre_roll: usize) -> Arc<Session> {
    Arc::new(Session::new(
        threshold,
        Duration::from_secs(hang_secs),
        pre_roll,
    ))
}

fn timer_for(session: &Arc<Session>) -> (Arc<RecordingTimer>, Receiver<WriterCommand>) {
    let (close_tx, close_rx) = writer_channel();
    (
        Arc::new(RecordingTimer::new(Arc::clone(session), close_tx)),
        close_rx,
    )
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

fn temp_output_dir(tag: &str) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let dir = env::temp_dir().join(format!(
        "voxcorder_{tag}_{}_{}",
        process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create temp output dir");
    dir
}

/// Output directory removed again when the test ends.
struct TempDir(PathBuf);

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

struct Rig {
    session: Arc<Session>,
    timer: Arc<RecordingTimer>,
    sink: FrameSink,
    processor: StreamProcessor,
    dir: TempDir,
    output: CapturedOutput,
}

impl Rig {
    fn new(tag: &str, threshold: u32, hang_secs: u64, pre_roll: usize) -> Self {
        let dir = temp_output_dir(tag);
        Self::with_dir(dir, threshold, hang_secs, pre_roll)
    }

    fn with_dir(dir: PathBuf, threshold: u32, hang_secs: u64, pre_roll: usize) -> Self {
        let session = session(threshold, hang_secs, pre_roll);
        let (timer, close_rx) = timer_for(&session);
        let (sink, queue) = sample_queue();
        let (console, output) = CapturedOutput::console();
        let mut takes = 0;
        let processor = StreamProcessor::new(
            Arc::clone(&session),
            Arc::clone(&timer),
            queue,
            close_rx,
            SAMPLE_RATE,
            dir.clone(),
            console,
        )
        .with_queue_wait(Duration::from_millis(5))
        .with_file_namer(move || {
            takes += 1;
            format!("take-{takes}.wav")
        });
        Self {
            session,
            timer,
            sink,
            processor,
            dir: TempDir(dir),
            output,
        }
    }

    /// Push one frame whose samples all equal `value` and process it.
    fn feed(&mut self, value: i16) {
        assert!(self.sink.push(vec![value; FRAME_LEN]));
        assert!(self.processor.step().expect("process frame"));
    }

    fn idle_step(&mut self) {
        assert!(!self.processor.step().expect("idle step"));
    }

    fn take(&self, n: usize) -> PathBuf {
        self.dir.0.join(format!("take-{n}.wav"))
    }

    fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.dir.0)
            .expect("read output dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

fn read_samples(path: &Path) -> Vec<i16> {
    let mut reader = WavReader::open(path).expect("open recording");
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    reader
        .samples::<i16>()
        .map(|sample| sample.expect("valid sample"))
        .collect()
}

fn frames_of(values: &[i16]) -> Vec<i16> {
    values
        .iter()
        .flat_map(|&value| std::iter::repeat(value).take(FRAME_LEN))
        .collect()
}

#[test]
fn latched_trigger_starts_recording_on_next_tick() {
    let session = session(50, 6, 8);
    let (timer, _close_rx) = timer_for(&session);
    let t0 = Instant::now();
    timer.reset_trigger(t0);
    // Even a late tick sees the latch.
    assert_eq!(timer.evaluate(t0 + secs(30.0)), TimerTransition::Started);
    assert!(session.is_recording());
}

#[test]
fn idle_timer_without_trigger_stays_idle() {
    let session = session(50, 6, 8);
    let (timer, close_rx) = timer_for(&session);
    let t0 = Instant::now();
    assert_eq!(timer.last_trigger(), None);
    assert_eq!(timer.evaluate(t0), TimerTransition::Unchanged);
    assert_eq!(timer.evaluate(t0 + secs(10.0)), TimerTransition::Unchanged);
    assert!(!session.is_recording());
    assert!(close_rx.try_recv().is_err());
}

#[test]
fn stops_only_after_hang_delay_plus_margin_and_signals_close_once() {
    let session = session(50, 6, 8);
    let (timer, close_rx) = timer_for(&session);
    let t0 = Instant::now();
    timer.reset_trigger(t0);
    assert_eq!(timer.evaluate(t0), TimerTransition::Started);
    assert_eq!(timer.evaluate(t0 + secs(3.0)), TimerTransition::Unchanged);
    // Inside the margin band the state holds.
    assert_eq!(timer.evaluate(t0 + secs(6.5)), TimerTransition::Unchanged);
    assert_eq!(timer.evaluate(t0 + secs(6.99)), TimerTransition::Unchanged);
    assert!(session.is_recording());
    assert!(close_rx.try_recv().is_err());

    assert_eq!(timer.evaluate(t0 + secs(7.01)), TimerTransition::Stopped);
    assert!(!session.is_recording());
    assert_eq!(timer.evaluate(t0 + secs(20.0)), TimerTransition::Unchanged);

    assert_eq!(
        close_rx.try_recv().expect("close command"),
        WriterCommand::Close {
            reason: CloseReason::HangDelayElapsed
        }
    );
    assert!(close_rx.try_recv().is_err());
}

#[test]
fn fresh_trigger_extends_recording() {
    let session = session(50, 2, 8);
    let (timer, _close_rx) = timer_for(&session);
    let t0 = Instant::now();
    timer.reset_trigger(t0);
    timer.evaluate(t0);
    timer.reset_trigger(t0 + secs(2.5));
    assert_eq!(timer.evaluate(t0 + secs(4.0)), TimerTransition::Unchanged);
    assert!(session.is_recording());
    assert_eq!(timer.evaluate(t0 + secs(5.6)), TimerTransition::Stopped);
}

#[test]
fn zero_hang_delay_records_then_stops_without_flicker() {
    let session = session(50, 0, 8);
    let (timer, _close_rx) = timer_for(&session);
    let t0 = Instant::now();
    timer.reset_trigger(t0);
    assert_eq!(timer.evaluate(t0 + secs(0.5)), TimerTransition::Started);
    assert_eq!(timer.evaluate(t0 + secs(0.99)), TimerTransition::Unchanged);
    assert!(session.is_recording());
    assert_eq!(timer.evaluate(t0 + secs(2.0)), TimerTransition::Stopped);
}

#[test]
fn reset_trigger_never_moves_backwards() {
    let session = session(50, 6, 8);
    let (timer, _close_rx) = timer_for(&session);
    let t0 = Instant::now();
    timer.reset_trigger(t0 + secs(5.0));
    timer.reset_trigger(t0 + secs(1.0));
    let last = timer.last_trigger().expect("trigger recorded");
    let drift = (t0 + secs(5.0)).saturating_duration_since(last);
    assert!(drift < Duration::from_millis(1));
}

#[test]
fn force_stop_is_idempotent_and_always_requests_close() {
    let session = session(50, 6, 8);
    let (timer, close_rx) = timer_for(&session);
    let t0 = Instant::now();
    timer.reset_trigger(t0);
    timer.evaluate(t0);

    assert!(timer.force_stop());
    assert!(!timer.force_stop());
    assert!(!session.is_recording());
    assert_eq!(timer.last_trigger(), None);
    let closes: Vec<WriterCommand> = close_rx.try_iter().collect();
    assert_eq!(
        closes,
        vec![
            WriterCommand::Close {
                reason: CloseReason::ForceStop
            };
            2
        ]
    );

    // The forgotten trigger cannot restart recording.
    assert_eq!(timer.evaluate(t0 + secs(1.0)), TimerTransition::Unchanged);
}

#[test]
fn force_start_goes_active_without_waiting_for_a_tick() {
    let session = session(50, 6, 8);
    let (timer, _close_rx) = timer_for(&session);
    let t0 = Instant::now();
    assert!(timer.force_start(t0));
    assert!(session.is_recording());
    assert!(!timer.force_start(t0));
    assert_eq!(timer.evaluate(t0 + secs(1.0)), TimerTransition::Unchanged);
    assert!(session.is_recording());
}

#[test]
fn timer_thread_prints_meter_and_exits_on_shutdown() {
    let session = session(50, 6, 8);
    let (timer, _close_rx) = timer_for(&session);
    let (console, output) = CapturedOutput::console();
    session.set_current_level(3);
    session.set_show_level_meter(true);
    let handle = spawn_timer_thread(Arc::clone(&timer), console, Duration::from_millis(50))
        .expect("spawn timer");
    thread::sleep(Duration::from_millis(300));
    session.shutdown();
    handle.join().expect("timer thread");
    assert!(output.lines().iter().any(|line| line == "### 3"));
}

#[test]
fn pre_roll_then_live_frames_land_in_order() {
    let mut rig = Rig::new("order", 50, 6, 3);
    for value in 1..=5 {
        rig.feed(value);
    }
    assert_eq!(rig.processor.pre_roll().len(), 3);
    rig.feed(4000);
    assert_eq!(rig.session.current_level(), 97);
    assert!(rig.timer.last_trigger().is_some());
    assert!(!rig.processor.is_file_open());

    assert_eq!(rig.timer.evaluate(Instant::now()), TimerTransition::Started);
    rig.feed(6);
    rig.feed(4001);
    assert!(rig.processor.is_file_open());
    assert!(rig.processor.pre_roll().is_empty());
    assert_eq!(rig.session.recording_file(), Some(rig.take(1)));

    rig.timer.force_stop();
    rig.idle_step();
    assert!(!rig.processor.is_file_open());
    assert_eq!(rig.session.recording_file(), None);

    assert_eq!(
        read_samples(&rig.take(1)),
        frames_of(&[4, 5, 4000, 6, 4001])
    );
    assert!(rig
        .output
        .lines()
        .contains(&"opening file take-1.wav".to_string()));
}

#[test]
fn quiet_input_never_creates_a_file() {
    let mut rig = Rig::new("quiet", 50, 6, 3);
    let t0 = Instant::now();
    for tick in 0..20 {
        rig.feed(100);
        rig.timer.evaluate(t0 + secs(f64::from(tick)));
    }
    assert!(!rig.session.is_recording());
    assert!(rig.files().is_empty());
    assert_eq!(rig.processor.pre_roll().len(), 3);
}

#[test]
fn always_trigger_with_zero_hang_opens_file_with_pre_roll() {
    let mut rig = Rig::new("always", 1, 0, 3);
    for _ in 0..5 {
        rig.feed(0);
    }
    assert_eq!(rig.timer.last_trigger(), None);
    rig.feed(100);
    rig.timer.evaluate(Instant::now());
    rig.feed(0);
    rig.timer.force_stop();
    rig.idle_step();
    assert_eq!(read_samples(&rig.take(1)), frames_of(&[0, 0, 100, 0]));
}

#[test]
fn hang_delay_close_then_new_trigger_opens_fresh_file() {
    let mut rig = Rig::new("fresh", 50, 0, 0);
    let t0 = Instant::now();
    rig.feed(4000);
    rig.timer.evaluate(t0);
    rig.feed(4000);
    // The second loud frame latched again, so one more tick holds.
    assert_eq!(rig.timer.evaluate(t0 + secs(5.0)), TimerTransition::Unchanged);
    assert_eq!(rig.timer.evaluate(t0 + secs(6.0)), TimerTransition::Stopped);
    rig.idle_step();
    assert!(!rig.processor.is_file_open());

    rig.feed(4000);
    rig.timer.evaluate(Instant::now() + secs(6.0));
    rig.feed(10);
    rig.timer.force_stop();
    rig.idle_step();

    assert_eq!(rig.files(), vec!["take-1.wav", "take-2.wav"]);
    assert_eq!(read_samples(&rig.take(1)), frames_of(&[4000]));
    assert_eq!(read_samples(&rig.take(2)), frames_of(&[10]));
}

#[test]
fn closing_twice_is_a_no_op() {
    let mut rig = Rig::new("twice", 50, 6, 2);
    rig.timer.force_start(Instant::now());
    rig.feed(7);
    rig.processor
        .close_recording(CloseReason::ForceStop)
        .expect("first close");
    rig.processor
        .close_recording(CloseReason::ForceStop)
        .expect("second close");
    assert_eq!(read_samples(&rig.take(1)), frames_of(&[7]));
}

#[test]
fn quit_during_recording_leaves_complete_file() {
    let mut rig = Rig::new("quit", 50, 6, 2);
    let (console, _output) = CapturedOutput::console();
    let control = ControlSurface::new(Arc::clone(&rig.session), Arc::clone(&rig.timer), console);
    rig.timer.force_start(Instant::now());
    for value in [11, 12, 13] {
        rig.feed(value);
    }
    let mut input = ScriptedInput::default();
    control
        .execute(Command::Quit, &mut input)
        .expect("quit command");
    assert!(!rig.session.is_running());

    let Rig { processor, dir, .. } = rig;
    let path = dir.0.join("take-1.wav");
    processor.run().expect("processor exits cleanly");

    let reader = WavReader::open(&path).expect("header is complete");
    assert_eq!(reader.len() as usize, 3 * FRAME_LEN);
    assert_eq!(read_samples(&path), frames_of(&[11, 12, 13]));
}

#[test]
fn processor_thread_exits_when_session_stops() {
    let rig = Rig::new("exit", 50, 6, 2);
    let Rig {
        session,
        processor,
        sink,
        ..
    } = rig;
    let handle = processor.spawn().expect("spawn processor");
    sink.push(vec![1; FRAME_LEN]);
    thread::sleep(Duration::from_millis(30));
    session.shutdown();
    handle
        .join()
        .expect("processor thread")
        .expect("clean exit");
}

#[test]
fn write_failure_stops_the_session() {
    let missing = env::temp_dir().join(format!(
        "voxcorder_missing_{}_{}",
        process::id(),
        line!()
    ));
    let _ = fs::remove_dir_all(&missing);
    let rig = Rig::with_dir(missing.clone(), 50, 6, 2);
    let Rig {
        session,
        timer,
        processor,
        sink,
        ..
    } = rig;
    timer.force_start(Instant::now());
    sink.push(vec![1; FRAME_LEN]);
    let err = processor.run().expect_err("missing dir must fail");
    assert!(format!("{err:#}").contains("failed to create recording"));
    assert!(!session.is_running());
    assert!(!missing.exists());
}
