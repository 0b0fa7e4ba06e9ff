//! Frequency-labelled magnitude spectra.

use crate::error::{EngineError, Result};

/// One FFT output bin mapped to its physical frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumBin {
    /// Centre frequency in Hz.
    pub frequency: f32,
    /// Magnitude, never negative.
    pub magnitude: f32,
}

/// A magnitude spectrum from one analysis pass (or the sum of several).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    bins: Vec<SpectrumBin>,
}

impl Spectrum {
    pub fn new(bins: Vec<SpectrumBin>) -> Self {
        Self { bins }
    }

    /// Builds a spectrum from raw magnitudes, labelling bin `i` with
    /// `i * nyquist / magnitudes.len()`.
    pub fn from_magnitudes(magnitudes: Vec<f32>, sample_rate: u32) -> Self {
        let nyquist = 0.5 * sample_rate as f32;
        let len = magnitudes.len() as f32;
        let bins = magnitudes
            .into_iter()
            .enumerate()
            .map(|(i, magnitude)| SpectrumBin {
                frequency: i as f32 * nyquist / len,
                magnitude,
            })
            .collect();
        Self { bins }
    }

    pub fn bins(&self) -> &[SpectrumBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Largest magnitude, or 0 for an empty spectrum.
    pub fn max_magnitude(&self) -> f32 {
        self.bins.iter().fold(0.0, |max, bin| max.max(bin.magnitude))
    }

    /// Difference between the largest and smallest magnitude.
    pub fn amplitude_range(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let (min, max) = self
            .bins
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), bin| {
                (min.min(bin.magnitude), max.max(bin.magnitude))
            });
        max - min
    }

    /// Adds `other`'s magnitudes bin by bin.
    ///
    /// Bins are positionally aligned, so both spectra must come from the same
    /// analyzer. On a length mismatch nothing is modified.
    pub fn add_assign(&mut self, other: &Spectrum) -> Result<()> {
        if other.len() != self.len() {
            return Err(EngineError::SpectrumLength {
                expected: self.len(),
                got: other.len(),
            });
        }
        for (acc, bin) in self.bins.iter_mut().zip(other.bins.iter()) {
            acc.magnitude += bin.magnitude;
        }
        Ok(())
    }
}
