//! Error types for the tunnel renderer.
//!
//! The rendering core itself never fails: everything that can go wrong is
//! caught at a boundary (parameter validation, lattice construction, audio
//! and display setup, frame export) and reported through these enums.

/// Rejected scene parameters
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("{field} must be > 0, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

/// Invalid lattice texture data
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LatticeError {
    #[error("lattice size must be > 0")]
    ZeroSize,

    #[error("expected {expected} texels for the lattice, got {actual}")]
    TexelCount { expected: usize, actual: usize },
}

/// Audio synthesis, analysis and device failures
#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("invalid FFT config: {0}")]
    Config(String),

    #[error("glicol engine: {0}")]
    Synth(String),

    #[error("audio device: {0}")]
    Device(String),

    #[error("audio stream: {0}")]
    Stream(String),

    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
}

/// Window surface and GPU presentation failures
#[derive(thiserror::Error, Debug)]
pub enum DisplayError {
    #[error("failed to create surface: {0}")]
    Surface(String),

    #[error("failed to find suitable GPU adapter")]
    Adapter,

    #[error("failed to request device: {0}")]
    Device(String),
}

/// Headless recording failures
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame export: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Audio(#[from] AudioError),
}
