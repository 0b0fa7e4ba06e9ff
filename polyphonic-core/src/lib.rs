// polyphonic-core/src/lib.rs

//! The core logic for the polyphonic pitch-set detector.
//! This crate is responsible for audio capture, spectral analysis,
//! noise calibration and pitch-set extraction. It is completely headless
//! and contains no UI code.
//!
//! Data flow: capture chunks → [`buffer::SampleBuffer`] → [`fft::SpectrumAnalyzer`]
//! → [`noise::NoiseCalibrator`] (startup) or [`profile::ProfileAccumulator`]
//! (steady state) → [`extract::PitchSetExtractor`] → observer.

pub mod audio;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fft;
pub mod noise;
pub mod pitch;
pub mod profile;
pub mod scheduler;
pub mod spectrum;
pub mod tuning;

pub use config::EngineConfig;
pub use engine::PitchEngine;
pub use error::{EngineError, Result};
pub use scheduler::{CallbackObserver, PitchSetObserver, Scheduler};
pub use tuning::{PitchClass, PitchSet};
