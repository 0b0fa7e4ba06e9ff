//! # Profile Module
//!
//! Temporal smoothing and per-class strength bookkeeping.
//!
//! [`ProfileAccumulator`] sums a fixed number of consecutive spectra before
//! each detection pass, trading latency for signal-to-noise ratio.
//! [`PitchProfile`] holds the summed strength of each pitch class during one
//! detection pass.

use std::cmp::Ordering;

use crate::error::Result;
use crate::spectrum::Spectrum;
use crate::tuning::PitchClass;

/// Sums consecutive spectra in groups of `frames`.
#[derive(Debug, Clone)]
pub struct ProfileAccumulator {
    frames: usize,
    count: usize,
    accumulated: Spectrum,
}

impl ProfileAccumulator {
    pub fn new(frames: usize) -> Self {
        Self {
            frames,
            count: 0,
            accumulated: Spectrum::default(),
        }
    }

    /// Folds one spectrum into the running sum.
    ///
    /// The first spectrum of a group replaces the accumulation; later ones are
    /// added bin by bin.
    ///
    /// # Returns
    /// * `Ok(Some(sum))` - This call completed a group; the sum is handed over
    ///   and the next call starts a fresh group
    /// * `Ok(None)` - The group is still filling
    /// * `Err(EngineError::SpectrumLength)` - The spectrum does not line up with
    ///   the accumulation; nothing changes
    pub fn accumulate(&mut self, spectrum: Spectrum) -> Result<Option<Spectrum>> {
        if self.count == 0 {
            self.accumulated = spectrum;
        } else {
            self.accumulated.add_assign(&spectrum)?;
        }

        self.count = (self.count + 1) % self.frames;
        if self.count == 0 {
            Ok(Some(std::mem::take(&mut self.accumulated)))
        } else {
            Ok(None)
        }
    }

    /// Frames folded into the current group so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The partially accumulated spectrum of the current group.
    pub fn accumulated(&self) -> &Spectrum {
        &self.accumulated
    }
}

/// Summed spectral strength of each pitch class.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchProfile {
    strengths: [f32; 12],
}

impl PitchProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, class: PitchClass, strength: f32) {
        self.strengths[class.index()] += strength;
    }

    pub fn strength(&self, class: PitchClass) -> f32 {
        self.strengths[class.index()]
    }

    /// Classes with their strengths, strongest first.
    pub fn ranked(&self) -> Vec<(PitchClass, f32)> {
        let mut ranked: Vec<(PitchClass, f32)> = PitchClass::ALL
            .iter()
            .map(|&class| (class, self.strength(class)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn flat(value: f32, len: usize) -> Spectrum {
        Spectrum::from_magnitudes(vec![value; len], 8000)
    }

    #[test]
    fn seven_frames_sum_to_seven_times() {
        let mut acc = ProfileAccumulator::new(7);
        for _ in 0..6 {
            assert!(acc.accumulate(flat(0.5, 8)).unwrap().is_none());
        }
        let ready = acc.accumulate(flat(0.5, 8)).unwrap().expect("group complete");
        assert!(ready.bins().iter().all(|b| b.magnitude == 3.5));
        assert_eq!(acc.count(), 0);
    }

    #[test]
    fn eighth_frame_starts_fresh() {
        let mut acc = ProfileAccumulator::new(7);
        for _ in 0..7 {
            acc.accumulate(flat(1.0, 8)).unwrap();
        }
        assert!(acc.accumulate(flat(2.0, 8)).unwrap().is_none());
        assert_eq!(acc.count(), 1);
        assert!(acc.accumulated().bins().iter().all(|b| b.magnitude == 2.0));
    }

    #[test]
    fn frequencies_are_preserved() {
        let mut acc = ProfileAccumulator::new(2);
        acc.accumulate(flat(1.0, 4)).unwrap();
        let ready = acc.accumulate(flat(1.0, 4)).unwrap().unwrap();
        assert_eq!(ready, flat(2.0, 4));
    }

    #[test]
    fn mismatched_spectrum_is_rejected() {
        let mut acc = ProfileAccumulator::new(7);
        acc.accumulate(flat(1.0, 8)).unwrap();
        let err = acc.accumulate(flat(1.0, 4)).unwrap_err();
        assert!(matches!(err, EngineError::SpectrumLength { expected: 8, got: 4 }));
        assert_eq!(acc.count(), 1);
    }

    #[test]
    fn profile_ranks_strongest_first() {
        let mut profile = PitchProfile::new();
        profile.add(PitchClass::E, 2.0);
        profile.add(PitchClass::A, 1.0);
        profile.add(PitchClass::E, 1.5);

        let ranked = profile.ranked();
        assert_eq!(ranked[0], (PitchClass::E, 3.5));
        assert_eq!(ranked[1], (PitchClass::A, 1.0));
        assert_eq!(ranked[2].1, 0.0);
    }
}
