//! Procedural music via Glicol.

use glicol::Engine;

use crate::error::AudioError;
use crate::params::audio_constants::BLOCK_SIZE;

/// Glicol composition: a pulsing sub kick under a filtered saw arpeggio.
///
/// The kick lands twice per second so beat detection always has material.
pub const GLICOL_COMPOSITION: &str = r#"
~kgate: speed 2.0 >> seq 60
~kenv: ~kgate >> envperc 0.002 0.3
~kick: sin 52 >> mul ~kenv >> mul 0.6
~gate: speed 4.0 >> seq 60 _60 _~a 48
~a: choose 48 48 55 60 72 0 0
~amp: ~gate >> envperc 0.001 0.12
~pit: ~gate >> mul 261.63
~mod: sin 0.1 >> mul 1100 >> add 1500
~lead: saw ~pit >> mul ~amp >> lpf ~mod 4.0 >> mul 0.08
~pad: ~lead >> plate 0.2
o: mix ~kick ~pad
"#;

/// Hard limit on output samples
const OUTPUT_LIMIT: f32 = 0.5;

/// Anything producing stereo frames one at a time
pub trait SampleSource: Send {
    fn next_frame(&mut self) -> [f32; 2];
}

/// Glicol engine with a block cursor, so callers can pull any frame count
pub struct Synth {
    engine: Engine<BLOCK_SIZE>,
    block: Vec<[f32; 2]>,
    cursor: usize,
}

impl Synth {
    pub fn new(sample_rate_hz: usize) -> Result<Self, AudioError> {
        Self::with_code(sample_rate_hz, GLICOL_COMPOSITION)
    }

    /// Engine running arbitrary Glicol code
    pub fn with_code(sample_rate_hz: usize, code: &str) -> Result<Self, AudioError> {
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(sample_rate_hz);
        engine.update_with_code(code);
        engine
            .update()
            .map_err(|e| AudioError::Synth(format!("{e:?}")))?;

        Ok(Self {
            engine,
            block: Vec::with_capacity(BLOCK_SIZE),
            cursor: 0,
        })
    }

    fn refill(&mut self) {
        let (buffers, _) = self.engine.next_block(vec![]);
        self.block.clear();
        for i in 0..BLOCK_SIZE {
            let left = buffers[0][i].clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT);
            let right = buffers[1][i].clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT);
            self.block.push([left, right]);
        }
        self.cursor = 0;
    }
}

impl SampleSource for Synth {
    fn next_frame(&mut self) -> [f32; 2] {
        if self.cursor >= self.block.len() {
            self.refill();
        }
        let frame = self.block[self.cursor];
        self.cursor += 1;
        frame
    }
}
