//! # Fast Fourier Transform (FFT) Module
//!
//! Turns the sliding sample window into a frequency-labelled magnitude
//! spectrum for pitch-set detection.
//!
//! ## Features
//! - High-performance FFT using RustFFT, planned once per analyzer
//! - DC offset removal for accurate analysis
//! - Hann or rectangular windowing
//! - Magnitudes scaled by `2 / N` so a full-scale sine reads close to its amplitude

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::spectrum::Spectrum;

/// Window applied to the samples before the forward transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// No tapering.
    Rectangular,
    /// Hann window, tapering the signal to zero at the edges to reduce leakage.
    Hann,
}

impl WindowFunction {
    fn coefficients(self, n: usize) -> Vec<f32> {
        match self {
            WindowFunction::Rectangular => vec![1.0; n],
            WindowFunction::Hann => {
                let n_minus_1 = (n.max(2) - 1) as f32;
                (0..n)
                    .map(|i| {
                        0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos())
                    })
                    .collect()
            }
        }
    }
}

/// Removes the DC offset from a signal by making its average value zero.
///
/// DC offset introduces a large component at 0 Hz that would otherwise
/// dominate the amplitude range of every spectrum.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Converts sample windows into magnitude spectra.
///
/// The analyzer holds no per-call state: the same window always yields the
/// same spectrum.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    sample_rate: u32,
    window: Vec<f32>,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("fft_size", &self.fft_size)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl SpectrumAnalyzer {
    /// Plans a forward transform of `fft_size` samples.
    ///
    /// # Arguments
    /// * `fft_size` - Transform length; must be a non-zero power of two
    /// * `sample_rate` - Sample rate in Hz, used to label bins
    /// * `window_function` - Window applied before each transform
    ///
    /// # Returns
    /// * `Err(EngineError::Configuration)` - Unsupported transform length or sample rate
    pub fn new(fft_size: usize, sample_rate: u32, window_function: WindowFunction) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(EngineError::Configuration(format!(
                "FFT size {} is not a power of two",
                fft_size
            )));
        }
        if sample_rate == 0 {
            return Err(EngineError::Configuration(
                "sample rate must be positive".into(),
            ));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Ok(Self {
            fft,
            fft_size,
            sample_rate,
            window: window_function.coefficients(fft_size),
        })
    }

    /// Number of bins in every spectrum this analyzer produces.
    pub fn spectrum_len(&self) -> usize {
        self.fft_size / 2
    }

    /// Performs one forward transform of `window` and returns its magnitude spectrum.
    ///
    /// Steps:
    /// 1. DC offset removal
    /// 2. Windowing
    /// 3. Forward FFT
    /// 4. Magnitudes of the first `fft_size / 2` bins, labelled with their frequency
    ///
    /// # Returns
    /// * `Err(EngineError::WindowSize)` - `window` is not exactly `fft_size` samples
    pub fn analyze(&self, window: &[f32]) -> Result<Spectrum> {
        if window.len() != self.fft_size {
            return Err(EngineError::WindowSize {
                expected: self.fft_size,
                got: window.len(),
            });
        }

        let mut processed = window.to_vec();
        remove_dc_offset(&mut processed);

        let mut buffer: Vec<Complex<f32>> = processed
            .into_iter()
            .zip(self.window.iter())
            .map(|(sample, w)| Complex { re: sample * w, im: 0.0 })
            .collect();

        self.fft.process(&mut buffer);

        let scale = 2.0 / self.fft_size as f32;
        let magnitudes = buffer
            .iter()
            .take(self.spectrum_len())
            .map(|c| c.norm() * scale)
            .collect();

        Ok(Spectrum::from_magnitudes(magnitudes, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    #[test]
    fn rejects_non_power_of_two() {
        assert!(matches!(
            SpectrumAnalyzer::new(1000, 44_100, WindowFunction::Hann),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_wrong_window_length() {
        let analyzer = SpectrumAnalyzer::new(1024, 44_100, WindowFunction::Hann).unwrap();
        assert!(matches!(
            analyzer.analyze(&[0.0; 512]),
            Err(EngineError::WindowSize { expected: 1024, got: 512 })
        ));
    }

    #[test]
    fn spectrum_has_half_length_and_nyquist_labels() {
        let analyzer = SpectrumAnalyzer::new(1024, 8000, WindowFunction::Rectangular).unwrap();
        let spectrum = analyzer.analyze(&[0.0; 1024]).unwrap();
        assert_eq!(spectrum.len(), 512);
        assert_eq!(spectrum.bins()[0].frequency, 0.0);
        assert!((spectrum.bins()[256].frequency - 2000.0).abs() < 1e-3);
    }

    #[test]
    fn bin_centred_sine_peaks_at_its_bin() {
        // 64 cycles over 1024 samples lands exactly on bin 64.
        let sample_rate = 8192;
        let analyzer =
            SpectrumAnalyzer::new(1024, sample_rate, WindowFunction::Rectangular).unwrap();
        let signal = sine(512.0, sample_rate, 1024, 0.5);
        let spectrum = analyzer.analyze(&signal).unwrap();

        let (peak, bin) = spectrum
            .bins()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.magnitude.total_cmp(&b.1.magnitude))
            .unwrap();
        assert_eq!(peak, 64);
        assert!((bin.frequency - 512.0).abs() < 1e-3);
        assert!((bin.magnitude - 0.5).abs() < 1e-3);
    }

    #[test]
    fn dc_offset_does_not_leak_into_bin_zero() {
        let analyzer = SpectrumAnalyzer::new(256, 8000, WindowFunction::Hann).unwrap();
        let spectrum = analyzer.analyze(&[0.3; 256]).unwrap();
        assert!(spectrum.max_magnitude() < 1e-4);
    }

    #[test]
    fn analysis_is_repeatable() {
        let analyzer = SpectrumAnalyzer::new(2048, 44_100, WindowFunction::Hann).unwrap();
        let signal = sine(440.0, 44_100, 2048, 0.8);
        assert_eq!(analyzer.analyze(&signal).unwrap(), analyzer.analyze(&signal).unwrap());
    }
}
