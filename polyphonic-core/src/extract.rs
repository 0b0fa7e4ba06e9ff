//! # Pitch Set Extraction Module
//!
//! Reduces an accumulated spectrum to the set of pitch classes currently
//! sounding.
//!
//! ## Algorithm
//! 1. Threshold = max(noise threshold, fraction of the spectrum's amplitude range)
//! 2. Keep the strongest `top_peaks` bins that exceed the threshold and lie
//!    within the pitch table's range (plus tolerance)
//! 3. Classify each surviving bin and sum its magnitude into its pitch class
//! 4. Report the strongest class plus every class reaching a fixed fraction of it

use log::debug;

use crate::config::EngineConfig;
use crate::pitch::PitchMapper;
use crate::profile::PitchProfile;
use crate::spectrum::{Spectrum, SpectrumBin};
use crate::tuning::PitchSet;

#[derive(Debug, Clone)]
pub struct PitchSetExtractor {
    mapper: PitchMapper,
    top_peaks: usize,
    amplitude_range_fraction: f32,
    benchmark_ratio: f32,
}

impl Default for PitchSetExtractor {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl PitchSetExtractor {
    pub fn new(
        mapper: PitchMapper,
        top_peaks: usize,
        amplitude_range_fraction: f32,
        benchmark_ratio: f32,
    ) -> Self {
        Self {
            mapper,
            top_peaks,
            amplitude_range_fraction,
            benchmark_ratio,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            PitchMapper::new(config.match_tolerance_hz),
            config.top_peaks,
            config.amplitude_range_fraction,
            config.benchmark_ratio,
        )
    }

    /// Bins up the strongest spectral peaks into pitch classes.
    ///
    /// # Arguments
    /// * `spectrum` - Accumulated magnitude spectrum
    /// * `noise_threshold` - Calibrated noise floor for this spectrum's scale
    ///
    /// # Returns
    /// * A fresh profile; bins that are too weak, out of range, or not close
    ///   to any pitch contribute nothing
    pub fn profile(&self, spectrum: &Spectrum, noise_threshold: f32) -> PitchProfile {
        let mut profile = PitchProfile::new();
        if spectrum.is_empty() {
            return profile;
        }

        let threshold =
            noise_threshold.max(self.amplitude_range_fraction * spectrum.amplitude_range());

        let tolerance = self.mapper.tolerance_hz();
        let low = self.mapper.min_frequency() - tolerance;
        let high = self.mapper.max_frequency() + tolerance;

        for bin in self.strongest_bins(spectrum) {
            if bin.magnitude <= threshold {
                continue;
            }
            if bin.frequency < low || bin.frequency > high {
                continue;
            }
            if let Some(class) = self.mapper.classify(bin.frequency) {
                profile.add(class, bin.magnitude);
            }
        }
        profile
    }

    /// Derives the reported pitch set from a spectrum.
    ///
    /// # Returns
    /// * An alphabetically sorted set; empty when no class gathered any strength
    pub fn extract(&self, spectrum: &Spectrum, noise_threshold: f32) -> PitchSet {
        let profile = self.profile(spectrum, noise_threshold);
        let ranked = profile.ranked();

        let strongest = ranked[0].1;
        if strongest <= 0.0 {
            return PitchSet::new();
        }

        let benchmark = strongest * self.benchmark_ratio;
        let set: PitchSet = std::iter::once(ranked[0].0)
            .chain(
                ranked[1..]
                    .iter()
                    .filter(|(_, strength)| *strength >= benchmark)
                    .map(|(class, _)| *class),
            )
            .collect();

        debug!("Pitch profile {:?} -> {}", ranked, set);
        set
    }

    /// The `top_peaks` bins with the highest magnitude, in no particular order.
    fn strongest_bins(&self, spectrum: &Spectrum) -> Vec<SpectrumBin> {
        if self.top_peaks == 0 {
            return Vec::new();
        }
        let mut bins = spectrum.bins().to_vec();
        if bins.len() > self.top_peaks {
            bins.select_nth_unstable_by(self.top_peaks - 1, |a, b| {
                b.magnitude.total_cmp(&a.magnitude)
            });
            bins.truncate(self.top_peaks);
        }
        bins
    }
}
