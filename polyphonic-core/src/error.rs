//! Error type shared by every engine component.

use thiserror::Error;

/// Errors returned by the pitch-set engine.
///
/// "No confident pitch" is never an error: it is reported as `None` from the
/// pitch mapper or as an empty `PitchSet` from the extractor.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The analysis setup is invalid or unsupported.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A capture chunk did not have the configured capture size.
    #[error("expected capture chunk of length {expected}, got {got}")]
    ChunkSize { expected: usize, got: usize },

    /// A sample window did not match the FFT length.
    #[error("expected analysis window of length {expected}, got {got}")]
    WindowSize { expected: usize, got: usize },

    /// Two spectra folded into the same accumulation differ in length.
    #[error("expected spectrum of {expected} bins, got {got}")]
    SpectrumLength { expected: usize, got: usize },

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid JSON for `EngineConfig`.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
