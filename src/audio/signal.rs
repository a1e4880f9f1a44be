//! Snapshot of the audio analysis read by the renderer.

/// Band levels and beat state at one analysis tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioSignal {
    /// Smoothed low-band level in [0, 1]
    pub bass: f32,

    /// Smoothed mid-band level in [0, 1]
    pub mid: f32,

    /// Smoothed high-band level in [0, 1]
    pub high: f32,

    /// Decaying beat pulse in [0, 1], 1 right at a beat
    pub beat: f32,

    /// A beat was detected during the tick that produced this snapshot
    pub beat_detected: bool,
}

impl AudioSignal {
    /// No audio at all
    pub fn silent() -> Self {
        Self::default()
    }
}
