//! Audio synthesis and FFT analysis system.
//!
//! Combines Glicol procedural synthesis with FFT band analysis and beat
//! detection. The renderer only ever sees [`AudioSignal`] snapshots; they come
//! from [`AudioSystem`] when playing live and from [`OfflineAudio`] when
//! recording.

mod analysis;
mod offline;
mod signal;
mod synthesis;
mod system;

pub use analysis::{hann_window, AudioAnalyzer, BandAnalyzer, BandEnergies, BeatDetector};
pub use offline::OfflineAudio;
pub use signal::AudioSignal;
pub use synthesis::{SampleSource, Synth, GLICOL_COMPOSITION};
pub use system::AudioSystem;
