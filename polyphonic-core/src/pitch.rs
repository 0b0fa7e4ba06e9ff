//! # Pitch Mapping Module
//!
//! Maps a frequency to the pitch class of the nearest key in the pitch table,
//! refusing to answer when no key is close enough.
//!
//! ## Features
//! - Binary search over the sorted 88-key table
//! - Boundary clamping below A0 and above C8
//! - Bounded-error matching so broadband noise is not labelled as a pitch

use crate::tuning::{PitchClass, TableEntry, PITCH_TABLE};

/// Default maximum distance in Hz between a frequency and its matched key.
pub const DEFAULT_TOLERANCE_HZ: f32 = 5.0;

/// Bounded-error nearest-neighbour classifier over a frequency table.
#[derive(Debug, Clone)]
pub struct PitchMapper {
    table: &'static [TableEntry],
    tolerance_hz: f32,
}

impl Default for PitchMapper {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_HZ)
    }
}

impl PitchMapper {
    /// Creates a mapper over the 88-key table.
    pub fn new(tolerance_hz: f32) -> Self {
        Self {
            table: PITCH_TABLE.as_slice(),
            tolerance_hz,
        }
    }

    pub fn tolerance_hz(&self) -> f32 {
        self.tolerance_hz
    }

    /// Frequency of the lowest table entry.
    pub fn min_frequency(&self) -> f32 {
        self.table[0].frequency
    }

    /// Frequency of the highest table entry.
    pub fn max_frequency(&self) -> f32 {
        self.table[self.table.len() - 1].frequency
    }

    /// Finds the pitch class closest to a frequency.
    ///
    /// Frequencies outside the table range clamp to the boundary entry. Inside
    /// the range the tightest bracketing pair is found by binary search and
    /// the closer endpoint wins, ties going to the lower one.
    ///
    /// # Arguments
    /// * `freq` - Frequency in Hz
    ///
    /// # Returns
    /// * `Some(class)` - The nearest pitch class
    /// * `None` - Both bracketing keys are at least `tolerance_hz` away
    pub fn classify(&self, freq: f32) -> Option<PitchClass> {
        let table = self.table;
        let len = table.len();

        if freq < table[0].frequency {
            return Some(table[0].pitch_class);
        } else if freq > table[len - 1].frequency {
            return Some(table[len - 1].pitch_class);
        }

        // Invariant: table[lo].frequency <= freq < table[hi].frequency, or hi == len.
        let mut lo = 0;
        let mut hi = len;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            let test = table[mid].frequency;
            if freq < test {
                hi = mid;
            } else if freq > test {
                lo = mid;
            } else {
                return Some(table[mid].pitch_class);
            }
        }

        // hi == len would need freq == max, which the exact-match branch returns.
        let hi = hi.min(len - 1);

        let pick_lo = (freq - table[lo].frequency).abs();
        let pick_hi = (freq - table[hi].frequency).abs();

        if pick_lo.min(pick_hi) >= self.tolerance_hz {
            return None;
        }
        if pick_hi < pick_lo {
            Some(table[hi].pitch_class)
        } else {
            Some(table[lo].pitch_class)
        }
    }
}
