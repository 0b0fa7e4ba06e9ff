//! # Musical Tuning Module
//!
//! Pitch classes and the static frequency table used for nearest-pitch lookups.
//!
//! ## Features
//! - The 12 octave-independent pitch classes, ordered alphabetically by label
//! - 88-key equal temperament table (A0 to C8) with A4 = 440 Hz
//! - Pitch sets: alphabetically ordered collections of pitch classes

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One of the 12 semitone labels, with no octave information.
///
/// Variant order matches the alphabetical order of the labels
/// ("A" < "A#" < "B" < "C" ...), so the derived `Ord` sorts alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
}

impl PitchClass {
    /// All pitch classes, starting from A.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
    ];

    /// Position in [`PitchClass::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A table entry: the frequency of one piano key and its pitch class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableEntry {
    pub frequency: f32,
    pub pitch_class: PitchClass,
}

/// Statically computed frequencies for a standard 88-key piano (A0 to C8).
///
/// Strictly increasing by frequency. Computed once using equal temperament
/// with A4 = 440 Hz.
pub static PITCH_TABLE: Lazy<Vec<TableEntry>> = Lazy::new(|| {
    (0..88)
        .map(|i| {
            // A4 is the 49th key, which is index 48 in a 0-indexed loop.
            let frequency = 440.0 * 2.0_f32.powf((i as f32 - 48.0) / 12.0);
            // A piano starts at A0, so the class cycles every 12 keys from A.
            TableEntry {
                frequency,
                pitch_class: PitchClass::ALL[i % 12],
            }
        })
        .collect()
});

/// The engine's externally visible result: an alphabetically sorted set of
/// pitch classes. An empty set means "no confident pitch".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PitchSet(Vec<PitchClass>);

impl PitchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> &[PitchClass] {
        &self.0
    }

    pub fn contains(&self, class: PitchClass) -> bool {
        self.0.binary_search(&class).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels in alphabetical order, e.g. `["A", "C#", "E"]`.
    pub fn labels(&self) -> Vec<&'static str> {
        self.0.iter().map(|c| c.label()).collect()
    }
}

impl FromIterator<PitchClass> for PitchSet {
    fn from_iter<I: IntoIterator<Item = PitchClass>>(iter: I) -> Self {
        let mut classes: Vec<PitchClass> = iter.into_iter().collect();
        classes.sort();
        classes.dedup();
        Self(classes)
    }
}

/// Goes through [`FromIterator`] so decoded sets are sorted and deduplicated.
impl<'de> Deserialize<'de> for PitchSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let classes = Vec::<PitchClass>::deserialize(deserializer)?;
        Ok(classes.into_iter().collect())
    }
}

/// Formats as `A, C#, E`, or `-` when empty.
impl fmt::Display for PitchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("-");
        }
        f.write_str(&self.labels().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_spans_the_piano() {
        assert_eq!(PITCH_TABLE.len(), 88);
        let first = PITCH_TABLE[0];
        let last = PITCH_TABLE[87];
        assert_eq!(first.pitch_class, PitchClass::A);
        assert!((first.frequency - 27.5).abs() < 1e-3);
        assert_eq!(last.pitch_class, PitchClass::C);
        assert!((last.frequency - 4186.0).abs() < 0.1);
    }

    #[test]
    fn table_is_strictly_increasing() {
        assert!(PITCH_TABLE
            .windows(2)
            .all(|pair| pair[0].frequency < pair[1].frequency));
    }

    #[test]
    fn a4_and_e5_are_where_expected() {
        assert_eq!(PITCH_TABLE[48].frequency, 440.0);
        assert_eq!(PITCH_TABLE[48].pitch_class, PitchClass::A);
        assert_eq!(PITCH_TABLE[55].pitch_class, PitchClass::E);
        assert!((PITCH_TABLE[55].frequency - 659.26).abs() < 0.01);
    }

    #[test]
    fn ordering_is_alphabetical_by_label() {
        let mut labels: Vec<&str> = PitchClass::ALL.iter().map(|c| c.label()).collect();
        labels.sort();
        let ordered: Vec<&str> = PitchClass::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(labels, ordered);
    }

    #[test]
    fn pitch_set_sorts_and_dedups() {
        let set: PitchSet = [PitchClass::E, PitchClass::A, PitchClass::E, PitchClass::CSharp]
            .into_iter()
            .collect();
        assert_eq!(set.labels(), vec!["A", "C#", "E"]);
        assert!(set.contains(PitchClass::CSharp));
        assert!(!set.contains(PitchClass::B));
        assert_eq!(set.to_string(), "A, C#, E");
        assert_eq!(PitchSet::new().to_string(), "-");
    }

    #[test]
    fn pitch_set_serializes_as_labels() {
        let set: PitchSet = [PitchClass::FSharp, PitchClass::D].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["D","F#"]"#);
    }

    #[test]
    fn deserialized_pitch_set_is_sorted_and_deduplicated() {
        let set: PitchSet = serde_json::from_str(r#"["E","A","A"]"#).unwrap();
        assert_eq!(set.labels(), vec!["A", "E"]);
        assert!(set.contains(PitchClass::A));
        assert!(serde_json::from_str::<PitchSet>(r#"["H"]"#).is_err());
    }
}
