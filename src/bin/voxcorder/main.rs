//! Voxcorder entrypoint: lists capture devices or runs the VOX recorder.
//!
//! # Architecture
//!
//! - Capture callback: converts device audio into fixed-size frames on the sample queue
//! - Stream processor thread: measures levels, keeps the pre-roll, writes WAV files
//! - Recording timer thread: hang-delay clock and the optional level meter
//! - Main thread: single-key command loop

mod cli_utils;

use anyhow::{anyhow, Result};
use std::io::{self, BufReader, IsTerminal};
use std::sync::Arc;
use voxcorder::audio::{sample_queue, FrameDispatcher, Recorder};
use voxcorder::config::{AppConfig, RunCommand};
use voxcorder::control::{Console, ControlSurface, LineInput, TerminalInput};
use voxcorder::vox::{spawn_timer_thread, writer_channel, RecordingTimer, StreamProcessor};
use voxcorder::{init_logging, init_tracing, log_debug, log_file_path, Session};

use crate::cli_utils::list_input_devices;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);
    match config.command {
        RunCommand::Listdevs => list_input_devices(),
        RunCommand::Record => run_recorder(&config),
    }
}

fn run_recorder(config: &AppConfig) -> Result<()> {
    log_debug("=== Voxcorder Started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    let recorder = Recorder::open(config.devno)?;
    let session = Arc::new(Session::from_config(config));
    let console = Console::stdout();
    let (close_tx, close_rx) = writer_channel();
    let timer = Arc::new(RecordingTimer::new(Arc::clone(&session), close_tx));
    let (sink, queue) = sample_queue();

    println!(
        "Recording from device #{} ({}) at {} Hz into {}",
        recorder.index(),
        recorder.device_name(),
        recorder.sample_rate(),
        config.output_dir.display()
    );
    println!("Press h for help.");
    tracing::info!(
        device = recorder.index(),
        sample_rate = recorder.sample_rate(),
        chunk = config.chunk,
        threshold = config.threshold,
        hang_delay_secs = config.hangdelay,
        pre_roll_frames = config.saverecs,
        "recorder starting"
    );

    let processor_handle = StreamProcessor::new(
        Arc::clone(&session),
        Arc::clone(&timer),
        queue,
        close_rx,
        recorder.sample_rate(),
        config.output_dir.clone(),
        console.clone(),
    )
    .spawn()?;
    let timer_handle = spawn_timer_thread(
        Arc::clone(&timer),
        console.clone(),
        config.tick_interval(),
    );

    let dispatcher = FrameDispatcher::new(config.chunk, sink, Arc::clone(&session));
    let outcome = timer_handle.and_then(|ticker| {
        let controls = recorder.start(dispatcher).and_then(|stream| {
            let controls = run_controls(&session, &timer, &console);
            stream.stop();
            controls
        });
        session.shutdown();
        if ticker.join().is_err() {
            log_debug("recording timer thread panicked");
        }
        controls
    });

    session.shutdown();
    let processed = processor_handle
        .join()
        .map_err(|_| anyhow!("stream processor thread panicked"))?;
    outcome?;
    processed?;

    console.line("Done.");
    log_debug("=== Voxcorder Exiting ===");
    Ok(())
}

fn run_controls(
    session: &Arc<Session>,
    timer: &Arc<RecordingTimer>,
    console: &Console,
) -> Result<()> {
    let control = ControlSurface::new(Arc::clone(session), Arc::clone(timer), console.clone());
    if io::stdin().is_terminal() {
        let mut input = TerminalInput::new(console.clone())?;
        control.run(&mut input)
    } else {
        let mut input = LineInput::spawn(BufReader::new(io::stdin()))?;
        control.run(&mut input)
    }
}
