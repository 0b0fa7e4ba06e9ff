//! # Polyphonic - Real-time Pitch Set Detector
//!
//! Command-line front end for the polyphonic pitch-set engine. It captures the
//! default input device, runs detection on a dedicated analysis thread and
//! prints every pitch set as it is detected.
//!
//! ## Architecture
//! - **Audio Thread**: cpal callback re-chunks samples and enqueues them
//! - **Analysis Thread**: the core `Scheduler` ticks the engine every interval
//! - **Printer Thread**: drains delivered pitch sets to stdout
//! - **Main Thread**: reads stdin; Enter toggles Stop/Start, `q` quits

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cpal::traits::StreamTrait;
use crossbeam_channel::Receiver;
use log::{info, warn};
use polyphonic_core::fft::WindowFunction;
use polyphonic_core::audio::AudioInput;
use polyphonic_core::{EngineConfig, PitchEngine, PitchSet, Scheduler};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Pitch sets that may queue up before the printer falls behind.
const RESULT_QUEUE_CAPACITY: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "polyphonic")]
#[command(about = "real-time polyphonic pitch-set detection from the default input device")]
struct Args {
    /// JSON engine configuration; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analysis tick period in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Window applied before each transform
    #[arg(short, long, value_enum)]
    window: Option<WindowArg>,

    /// Print each pitch set as a JSON array
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WindowArg {
    Rectangular,
    Hann,
}

impl From<WindowArg> for WindowFunction {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Rectangular => WindowFunction::Rectangular,
            WindowArg::Hann => WindowFunction::Hann,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let input = AudioInput::open_default()?;
    let config = engine_config(&args, input.sample_rate())?;

    let capture_size = config.capture_size;
    let engine = PitchEngine::new(config)?;

    let (set_tx, set_rx) = crossbeam_channel::bounded(RESULT_QUEUE_CAPACITY);
    let mut scheduler = Scheduler::start(engine, set_tx);
    let printer = spawn_printer(set_rx, args.json);

    let stream = input.start(scheduler.chunk_sender(), capture_size)?;

    scheduler.enable();
    println!("Listening. Press Enter to stop/start, q + Enter to quit.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }

        if scheduler.is_enabled() {
            if let Err(e) = stream.pause() {
                warn!("Error pausing stream: {}", e);
            }
            scheduler.disable();
            println!("Stopped.");
        } else {
            stream.play()?;
            scheduler.enable();
            println!("Started.");
        }
    }

    info!("Shutting down...");
    if let Err(e) = stream.pause() {
        warn!("Error pausing stream: {}", e);
    }
    drop(stream);

    // Joining the analysis thread drops the result sender, which ends the printer.
    if let Some(engine) = scheduler.shutdown() {
        info!("Last pitch set: {}", engine.pitch_set());
    }
    let _ = printer.join();
    Ok(())
}

/// Merges the config file and command-line overrides. The device's rate
/// always wins over a `sample_rate` from the file.
fn engine_config(args: &Args, sample_rate: u32) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(interval) = args.interval_ms {
        config.update_interval_ms = interval;
    }
    if let Some(window) = args.window {
        config.window_function = window.into();
    }
    config.sample_rate = sample_rate;
    Ok(config)
}

fn spawn_printer(set_rx: Receiver<PitchSet>, json: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdout = io::stdout();
        for set in set_rx.iter() {
            let line = if json {
                serde_json::to_string(&set).unwrap_or_else(|_| "[]".to_string())
            } else {
                set.to_string()
            };
            let mut out = stdout.lock();
            if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
                break;
            }
        }
    })
}
