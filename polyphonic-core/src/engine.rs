//! # Pitch Engine Module
//!
//! The synchronous pitch-set pipeline. One [`PitchEngine`] owns the sliding
//! window, the noise calibrator and the spectral accumulation; it is driven
//! by two calls:
//!
//! - [`PitchEngine::push`] ingests one capture chunk from the audio source
//! - [`PitchEngine::tick`] runs one analysis step
//!
//! The [`Scheduler`](crate::scheduler::Scheduler) calls `tick` on a fixed
//! cadence from its own thread; tests drive it directly.

use log::{debug, info};

use crate::buffer::SampleBuffer;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::extract::PitchSetExtractor;
use crate::fft::SpectrumAnalyzer;
use crate::noise::{NoiseCalibrator, NoiseThreshold};
use crate::profile::ProfileAccumulator;
use crate::spectrum::Spectrum;
use crate::tuning::PitchSet;

#[derive(Debug)]
pub struct PitchEngine {
    config: EngineConfig,
    buffer: SampleBuffer,
    analyzer: SpectrumAnalyzer,
    calibrator: NoiseCalibrator,
    accumulator: ProfileAccumulator,
    extractor: PitchSetExtractor,
    pitch_set: PitchSet,
    frames_analyzed: u64,
}

impl PitchEngine {
    /// Builds an engine for the given configuration.
    ///
    /// # Returns
    /// * `Err(EngineError::Configuration)` - The configuration is invalid or
    ///   the transform cannot be planned
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let analyzer =
            SpectrumAnalyzer::new(config.fft_size()?, config.sample_rate, config.window_function)?;
        info!(
            "Pitch engine ready: {} Hz, {} x {} sample window, {:?} window",
            config.sample_rate, config.window_chunks, config.capture_size, config.window_function
        );

        Ok(Self {
            buffer: SampleBuffer::new(config.capture_size, config.window_chunks),
            analyzer,
            calibrator: NoiseCalibrator::new(
                config.calibration_frames,
                config.effective_noise_scale(),
            ),
            accumulator: ProfileAccumulator::new(config.accumulation_frames),
            extractor: PitchSetExtractor::from_config(&config),
            pitch_set: PitchSet::new(),
            frames_analyzed: 0,
            config,
        })
    }

    /// Default configuration at the given sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Result<Self> {
        Self::new(EngineConfig::with_sample_rate(sample_rate))
    }

    /// Appends one capture chunk to the sliding window.
    pub fn push(&mut self, chunk: &[f32]) -> Result<()> {
        self.buffer.push(chunk)
    }

    /// Runs one analysis step.
    ///
    /// Does nothing until the window has filled. While the noise floor is
    /// being calibrated each spectrum goes to the calibrator only. Afterwards
    /// spectra are accumulated, and every completed group is reduced to a new
    /// pitch set.
    ///
    /// # Returns
    /// * `Ok(Some(set))` - A detection pass completed; `set` replaces the previous one
    /// * `Ok(None)` - Nothing new to report this tick
    pub fn tick(&mut self) -> Result<Option<PitchSet>> {
        if !self.buffer.is_full() {
            return Ok(None);
        }

        let spectrum = self.analyzer.analyze(self.buffer.window())?;
        self.frames_analyzed += 1;
        self.process_spectrum(spectrum)
    }

    /// Feeds an already computed spectrum through calibration or detection.
    ///
    /// This is the part of [`tick`](Self::tick) after the transform.
    pub fn process_spectrum(&mut self, spectrum: Spectrum) -> Result<Option<PitchSet>> {
        let noise_threshold = match self.calibrator.state() {
            NoiseThreshold::Calibrating { .. } => {
                self.calibrator.observe(&spectrum);
                return Ok(None);
            }
            NoiseThreshold::Calibrated(threshold) => threshold,
        };

        let Some(accumulated) = self.accumulator.accumulate(spectrum)? else {
            return Ok(None);
        };

        let set = self.extractor.extract(&accumulated, noise_threshold);
        debug!("Detected pitch set: {}", set);
        self.pitch_set = set.clone();
        Ok(Some(set))
    }

    /// The most recently detected pitch set.
    pub fn pitch_set(&self) -> &PitchSet {
        &self.pitch_set
    }

    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }

    pub fn noise_threshold(&self) -> NoiseThreshold {
        self.calibrator.state()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    /// Spectra observed by the noise calibrator so far.
    pub fn calibration_progress(&self) -> usize {
        self.calibrator.progress()
    }

    /// Capture chunks accepted into the window so far.
    pub fn chunks_pushed(&self) -> u64 {
        self.buffer.chunks_pushed()
    }

    /// Windows transformed by [`tick`](Self::tick) so far.
    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed
    }

    /// Frames accumulated towards the next detection pass.
    pub fn accumulated_frames(&self) -> usize {
        self.accumulator.count()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.analyzer
    }
}
