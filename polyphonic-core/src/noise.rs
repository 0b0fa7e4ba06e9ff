//! # Noise Calibration Module
//!
//! Learns the ambient noise floor from the first spectra after startup.
//!
//! Calibration looks at single-frame spectra, but detection runs on the sum of
//! several frames. The locked threshold is therefore the loudest bin seen
//! during calibration multiplied by a scale, which defaults to the number of
//! accumulated frames.

use log::{debug, info};

use crate::spectrum::Spectrum;

/// Calibration state. Once `Calibrated`, the threshold never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseThreshold {
    Calibrating { observed: usize, running_max: f32 },
    Calibrated(f32),
}

#[derive(Debug, Clone)]
pub struct NoiseCalibrator {
    state: NoiseThreshold,
    frames: usize,
    scale: f32,
}

impl NoiseCalibrator {
    /// Creates a calibrator that locks after `frames` observed spectra.
    ///
    /// # Arguments
    /// * `frames` - Number of spectra to observe before locking
    /// * `scale` - Multiplier applied to the loudest observed bin
    pub fn new(frames: usize, scale: f32) -> Self {
        Self {
            state: NoiseThreshold::Calibrating {
                observed: 0,
                running_max: 0.0,
            },
            frames,
            scale,
        }
    }

    /// Folds one spectrum into the running maximum. No-op once calibrated.
    ///
    /// # Returns
    /// * `true` - This observation completed the calibration
    pub fn observe(&mut self, spectrum: &Spectrum) -> bool {
        let NoiseThreshold::Calibrating { observed, running_max } = self.state else {
            return false;
        };

        let observed = observed + 1;
        let running_max = running_max.max(spectrum.max_magnitude());

        if observed >= self.frames {
            let threshold = running_max * self.scale;
            info!(
                "Noise floor locked after {} frames: max {:.6} x {} = {:.6}",
                observed, running_max, self.scale, threshold
            );
            self.state = NoiseThreshold::Calibrated(threshold);
            true
        } else {
            debug!("Noise calibration {}/{}: running max {:.6}", observed, self.frames, running_max);
            self.state = NoiseThreshold::Calibrating { observed, running_max };
            false
        }
    }

    pub fn state(&self) -> NoiseThreshold {
        self.state
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.state, NoiseThreshold::Calibrated(_))
    }

    /// The locked threshold, if calibration has finished.
    pub fn threshold(&self) -> Option<f32> {
        match self.state {
            NoiseThreshold::Calibrated(value) => Some(value),
            NoiseThreshold::Calibrating { .. } => None,
        }
    }

    /// Number of spectra observed so far, capped at the calibration length.
    pub fn progress(&self) -> usize {
        match self.state {
            NoiseThreshold::Calibrating { observed, .. } => observed,
            NoiseThreshold::Calibrated(_) => self.frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(value: f32) -> Spectrum {
        Spectrum::from_magnitudes(vec![value; 16], 8000)
    }

    #[test]
    fn locks_on_exactly_the_fifteenth_frame() {
        let mut calibrator = NoiseCalibrator::new(15, 7.0);
        for i in 0..14 {
            assert!(!calibrator.observe(&flat(0.01 * i as f32)));
            assert!(!calibrator.is_calibrated());
            assert_eq!(calibrator.threshold(), None);
        }
        assert_eq!(calibrator.progress(), 14);

        assert!(calibrator.observe(&flat(0.05)));
        assert!(calibrator.is_calibrated());
        let expected = 0.13_f32 * 7.0;
        let threshold = calibrator.threshold().unwrap();
        assert!((threshold - expected).abs() < 1e-6);
    }

    #[test]
    fn tracks_max_across_bins_and_frames() {
        let mut calibrator = NoiseCalibrator::new(3, 7.0);
        let mut peaked = vec![0.0; 8];
        peaked[5] = 0.2;
        calibrator.observe(&Spectrum::from_magnitudes(peaked, 8000));
        calibrator.observe(&flat(0.1));
        calibrator.observe(&flat(0.05));
        assert_eq!(calibrator.state(), NoiseThreshold::Calibrated(0.2 * 7.0));
    }

    #[test]
    fn ignores_spectra_after_locking() {
        let mut calibrator = NoiseCalibrator::new(2, 7.0);
        calibrator.observe(&flat(0.1));
        calibrator.observe(&flat(0.1));
        let locked = calibrator.threshold();

        assert!(!calibrator.observe(&flat(50.0)));
        assert_eq!(calibrator.threshold(), locked);
        assert_eq!(calibrator.progress(), 2);
    }

    #[test]
    fn silence_calibrates_to_zero() {
        let mut calibrator = NoiseCalibrator::new(2, 7.0);
        calibrator.observe(&flat(0.0));
        calibrator.observe(&flat(0.0));
        assert_eq!(calibrator.threshold(), Some(0.0));
    }
}
