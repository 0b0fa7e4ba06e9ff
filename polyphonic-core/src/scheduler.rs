//! # Scheduler Module
//!
//! Runs a [`PitchEngine`] on a dedicated analysis thread.
//!
//! ## Architecture
//! - **Audio side**: capture chunks arrive on a bounded crossbeam channel
//!   (see [`Scheduler::chunk_sender`]); senders never block
//! - **Analysis thread**: drains chunks into the engine and runs one analysis
//!   step per timer tick while enabled
//! - **Consumer**: every completed detection pass is handed to a
//!   [`PitchSetObserver`]
//!
//! Disabling only stops the timer. The sliding window, the calibrated noise
//! floor and any partial accumulation survive a disable/enable cycle, and a
//! tick already in progress always runs to completion.

use crossbeam_channel::{Receiver, Sender, TrySendError, never, select, tick};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::engine::PitchEngine;
use crate::tuning::PitchSet;

/// Number of capture chunks that can queue up between analysis ticks.
pub const CHUNK_QUEUE_CAPACITY: usize = 64;

/// Receives each new pitch set. Called on the analysis thread, so
/// implementations must return quickly.
pub trait PitchSetObserver: Send {
    fn on_pitch_set_updated(&mut self, pitch_set: &PitchSet);
}

/// Forwards pitch sets over a channel. A full channel drops the update rather
/// than stalling the analysis thread.
impl PitchSetObserver for Sender<PitchSet> {
    fn on_pitch_set_updated(&mut self, pitch_set: &PitchSet) {
        match self.try_send(pitch_set.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Pitch set consumer is behind, dropping update"),
            Err(TrySendError::Disconnected(_)) => debug!("Pitch set consumer disconnected"),
        }
    }
}

/// Adapts a closure into an observer.
pub struct CallbackObserver<F>(pub F);

impl<F> PitchSetObserver for CallbackObserver<F>
where
    F: FnMut(&PitchSet) + Send,
{
    fn on_pitch_set_updated(&mut self, pitch_set: &PitchSet) {
        (self.0)(pitch_set)
    }
}

#[derive(Debug, Clone, Copy)]
enum Control {
    Enable,
    Disable,
    Shutdown,
}

/// Owns the analysis thread and its controls.
pub struct Scheduler {
    chunk_tx: Sender<Vec<f32>>,
    control_tx: Sender<Control>,
    last_pitch_set: Arc<Mutex<PitchSet>>,
    enabled: bool,
    worker: Option<JoinHandle<PitchEngine>>,
}

impl Scheduler {
    /// Moves `engine` onto a new analysis thread. The timer starts disabled.
    ///
    /// # Arguments
    /// * `engine` - The pipeline to drive; its configured update interval sets the cadence
    /// * `observer` - Receives every completed pitch set
    pub fn start<O>(engine: PitchEngine, observer: O) -> Self
    where
        O: PitchSetObserver + 'static,
    {
        let (chunk_tx, chunk_rx) = crossbeam_channel::bounded(CHUNK_QUEUE_CAPACITY);
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let last_pitch_set = Arc::new(Mutex::new(PitchSet::new()));

        let shared = Arc::clone(&last_pitch_set);
        let worker = thread::spawn(move || {
            run_analysis_loop(engine, chunk_rx, control_rx, observer, shared)
        });

        Self {
            chunk_tx,
            control_tx,
            last_pitch_set,
            enabled: false,
            worker: Some(worker),
        }
    }

    /// A handle for the audio source to enqueue capture chunks with `try_send`.
    pub fn chunk_sender(&self) -> Sender<Vec<f32>> {
        self.chunk_tx.clone()
    }

    /// Enqueues one capture chunk without blocking.
    ///
    /// # Returns
    /// * `false` - The queue was full and the chunk was dropped
    pub fn push(&self, chunk: Vec<f32>) -> bool {
        self.chunk_tx.try_send(chunk).is_ok()
    }

    /// Starts the periodic analysis tick. No-op if already running.
    pub fn enable(&mut self) {
        if !self.enabled {
            self.send(Control::Enable);
            self.enabled = true;
        }
    }

    /// Stops the periodic tick without discarding any engine state.
    pub fn disable(&mut self) {
        if self.enabled {
            self.send(Control::Disable);
            self.enabled = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The most recently delivered pitch set.
    pub fn last_pitch_set(&self) -> PitchSet {
        match self.last_pitch_set.lock() {
            Ok(set) => set.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stops the analysis thread and hands the engine back.
    ///
    /// # Returns
    /// * `None` - The analysis thread panicked
    pub fn shutdown(mut self) -> Option<PitchEngine> {
        self.stop()
    }

    fn send(&self, control: Control) {
        if self.control_tx.send(control).is_err() {
            warn!("Analysis thread is gone, ignoring {:?}", control);
        }
    }

    fn stop(&mut self) -> Option<PitchEngine> {
        let handle = self.worker.take()?;
        let _ = self.control_tx.send(Control::Shutdown);
        match handle.join() {
            Ok(engine) => Some(engine),
            Err(_) => {
                error!("Analysis thread panicked");
                None
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

enum Event {
    Chunk(Vec<f32>),
    Control(Control),
    Tick,
    SourceClosed,
}

fn run_analysis_loop<O: PitchSetObserver>(
    mut engine: PitchEngine,
    chunk_rx: Receiver<Vec<f32>>,
    control_rx: Receiver<Control>,
    mut observer: O,
    last_pitch_set: Arc<Mutex<PitchSet>>,
) -> PitchEngine {
    let interval = engine.config().update_interval();
    let mut ticker: Receiver<Instant> = never();
    info!("Analysis thread started, tick every {:?}", interval);

    loop {
        let event = select! {
            recv(chunk_rx) -> msg => msg.map(Event::Chunk).unwrap_or(Event::SourceClosed),
            recv(control_rx) -> msg => Event::Control(msg.unwrap_or(Control::Shutdown)),
            recv(ticker) -> _ => Event::Tick,
        };

        match event {
            Event::Chunk(chunk) => ingest(&mut engine, &chunk),
            Event::Control(Control::Enable) => {
                debug!("Analysis tick enabled");
                ticker = tick(interval);
            }
            Event::Control(Control::Disable) => {
                debug!("Analysis tick disabled");
                ticker = never();
            }
            Event::Control(Control::Shutdown) => {
                drain(&mut engine, &chunk_rx);
                break;
            }
            Event::Tick => {
                // Analyse the freshest window available.
                drain(&mut engine, &chunk_rx);
                run_tick(&mut engine, &mut observer, &last_pitch_set);
            }
            Event::SourceClosed => {
                info!("Audio source disconnected");
                break;
            }
        }
    }

    info!(
        "Analysis thread finished after {} capture chunks",
        engine.chunks_pushed()
    );
    engine
}

fn drain(engine: &mut PitchEngine, chunk_rx: &Receiver<Vec<f32>>) {
    while let Ok(chunk) = chunk_rx.try_recv() {
        ingest(engine, &chunk);
    }
}

fn ingest(engine: &mut PitchEngine, chunk: &[f32]) {
    if let Err(e) = engine.push(chunk) {
        error!("Dropping capture chunk: {}", e);
    }
}

fn run_tick<O: PitchSetObserver>(
    engine: &mut PitchEngine,
    observer: &mut O,
    last_pitch_set: &Mutex<PitchSet>,
) {
    let started = Instant::now();
    match engine.tick() {
        Ok(Some(set)) => {
            match last_pitch_set.lock() {
                Ok(mut last) => *last = set.clone(),
                Err(poisoned) => *poisoned.into_inner() = set.clone(),
            }
            observer.on_pitch_set_updated(&set);
        }
        Ok(None) => {}
        Err(e) => error!("Analysis tick failed: {}", e),
    }

    let elapsed = started.elapsed();
    if elapsed > engine.config().update_interval() {
        warn!("Analysis tick took {:?}, longer than the update interval", elapsed);
    }
}
