//! # Engine Configuration Module
//!
//! Every tunable constant of the pitch-set pipeline lives in [`EngineConfig`].
//! The defaults reproduce the classic detector: 2048-sample capture chunks,
//! a four-chunk (8192-sample) analysis window, a 40 ms analysis cadence,
//! 15 calibration frames and 7-frame spectral accumulation.
//!
//! Configurations can be saved and loaded as JSON; missing fields fall back
//! to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::fft::WindowFunction;

/// Default number of samples in one capture chunk.
pub const DEFAULT_CAPTURE_SIZE: usize = 2048;

/// Tunable parameters for the pitch-set engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate of the incoming audio in Hz.
    pub sample_rate: u32,
    /// Samples per capture chunk delivered by the audio source.
    pub capture_size: usize,
    /// Number of chunks held in the sliding window.
    pub window_chunks: usize,
    /// Period of the analysis tick in milliseconds.
    pub update_interval_ms: u64,
    /// Number of single-frame spectra observed before the noise floor locks.
    pub calibration_frames: usize,
    /// Number of spectra summed before each detection pass.
    pub accumulation_frames: usize,
    /// Multiplier applied to the calibrated noise maximum.
    /// `None` derives it from `accumulation_frames`.
    pub noise_scale: Option<f32>,
    /// How many of the strongest bins are considered per detection pass.
    pub top_peaks: usize,
    /// Fraction of the spectrum's amplitude range a peak must exceed.
    pub amplitude_range_fraction: f32,
    /// Fraction of the strongest class a weaker class must reach to be reported.
    pub benchmark_ratio: f32,
    /// Maximum distance in Hz between a peak and the nearest table pitch.
    pub match_tolerance_hz: f32,
    /// Window applied to the samples before the transform.
    pub window_function: WindowFunction,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            capture_size: DEFAULT_CAPTURE_SIZE,
            window_chunks: 4,
            update_interval_ms: 40,
            calibration_frames: 15,
            accumulation_frames: 7,
            noise_scale: None,
            top_peaks: 20,
            amplitude_range_fraction: 0.25,
            benchmark_ratio: 0.3,
            match_tolerance_hz: 5.0,
            window_function: WindowFunction::Hann,
        }
    }
}

impl EngineConfig {
    /// Default configuration at a specific sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Arguments
    /// * `path` - Path to a JSON document; absent fields take their defaults
    ///
    /// # Returns
    /// * `Ok(config)` - A validated configuration
    /// * `Err(e)` - The file could not be read, parsed, or failed validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Length of the analysis window and of the forward transform.
    ///
    /// # Returns
    /// * `Err(EngineError::Configuration)` - The window length overflows `usize`
    pub fn fft_size(&self) -> Result<usize> {
        self.capture_size
            .checked_mul(self.window_chunks)
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "analysis window of {} x {} samples is too large",
                    self.window_chunks, self.capture_size
                ))
            })
    }

    /// The scale applied to the calibrated noise maximum.
    ///
    /// Calibration samples single-frame spectra while detection runs on the
    /// sum of `accumulation_frames` spectra, so the noise maximum is scaled by
    /// the same frame count unless explicitly overridden.
    pub fn effective_noise_scale(&self) -> f32 {
        self.noise_scale.unwrap_or(self.accumulation_frames as f32)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// Rejects configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(EngineError::Configuration(
                "sample_rate must be positive".into(),
            ));
        }
        if self.capture_size == 0 || self.window_chunks == 0 {
            return Err(EngineError::Configuration(
                "capture_size and window_chunks cannot be zero".into(),
            ));
        }
        let fft_size = self.fft_size()?;
        if !fft_size.is_power_of_two() {
            return Err(EngineError::Configuration(format!(
                "analysis window of {} samples is not a power of two",
                fft_size
            )));
        }
        if self.update_interval_ms == 0 {
            return Err(EngineError::Configuration(
                "update_interval_ms cannot be zero".into(),
            ));
        }
        if self.calibration_frames == 0 || self.accumulation_frames == 0 {
            return Err(EngineError::Configuration(
                "calibration_frames and accumulation_frames cannot be zero".into(),
            ));
        }
        if self.top_peaks == 0 {
            return Err(EngineError::Configuration("top_peaks cannot be zero".into()));
        }
        if !(self.effective_noise_scale() > 0.0) {
            return Err(EngineError::Configuration(
                "noise_scale must be positive".into(),
            ));
        }
        if !(self.match_tolerance_hz > 0.0) {
            return Err(EngineError::Configuration(
                "match_tolerance_hz must be positive".into(),
            ));
        }
        if !(self.benchmark_ratio > 0.0 && self.benchmark_ratio <= 1.0) {
            return Err(EngineError::Configuration(format!(
                "benchmark_ratio must lie in (0, 1], got {}",
                self.benchmark_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.amplitude_range_fraction) {
            return Err(EngineError::Configuration(format!(
                "amplitude_range_fraction must lie in [0, 1], got {}",
                self.amplitude_range_fraction
            )));
        }
        Ok(())
    }
}
