//! Deterministic audio for headless recording.
//!
//! Synthesis and analysis advance by exactly the frame duration, so the
//! beat-driven visuals line up with the written WAV file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::analysis::AudioAnalyzer;
use super::signal::AudioSignal;
use super::synthesis::{SampleSource, Synth};
use crate::error::AudioError;
use crate::params::{BeatConfig, FFTConfig};

/// Frame-stepped synthesis and analysis with an optional WAV sink
pub struct OfflineAudio<S = Synth> {
    source: S,
    analyzer: AudioAnalyzer,
    sample_rate_hz: usize,
    pending: Vec<f32>,
    /// Fractional samples owed from previous steps
    carry: f64,
    wav: Option<WavWriter<BufWriter<File>>>,
    samples_written: u64,
}

impl OfflineAudio<Synth> {
    /// Offline rendering of the built-in composition
    pub fn with_synth(fft: FFTConfig, beat: BeatConfig) -> Result<Self, AudioError> {
        let synth = Synth::new(fft.sample_rate_hz)?;
        Self::new(synth, fft, beat)
    }
}

impl<S: SampleSource> OfflineAudio<S> {
    pub fn new(source: S, fft: FFTConfig, beat: BeatConfig) -> Result<Self, AudioError> {
        let sample_rate_hz = fft.sample_rate_hz;
        Ok(Self {
            source,
            analyzer: AudioAnalyzer::new(fft, beat)?,
            sample_rate_hz,
            pending: Vec::new(),
            carry: 0.0,
            wav: None,
            samples_written: 0,
        })
    }

    /// Also write everything synthesized from now on to a stereo float WAV
    pub fn record_to(mut self, path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: self.sample_rate_hz as u32,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        self.wav = Some(WavWriter::create(path, spec)?);
        Ok(self)
    }

    /// Synthesize `dt` seconds and return the analysis at the end of it
    pub fn advance(&mut self, dt: f32) -> Result<AudioSignal, AudioError> {
        let exact = dt.max(0.0) as f64 * self.sample_rate_hz as f64 + self.carry;
        let count = exact.floor();
        self.carry = exact - count;

        for _ in 0..count as u64 {
            let [left, right] = self.source.next_frame();
            self.pending.push(left);
            if let Some(wav) = self.wav.as_mut() {
                wav.write_sample(left)?;
                wav.write_sample(right)?;
            }
            self.samples_written += 1;
        }

        Ok(self.analyzer.process(&mut self.pending))
    }

    /// Stereo frames synthesized so far
    pub fn frames_synthesized(&self) -> u64 {
        self.samples_written
    }

    /// Flush and close the WAV file, if any
    pub fn finish(self) -> Result<(), AudioError> {
        if let Some(wav) = self.wav {
            wav.finalize()?;
        }
        Ok(())
    }
}
