//! FFT band analysis and beat detection.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::signal::AudioSignal;
use crate::error::AudioError;
use crate::params::{BeatConfig, FFTConfig};

/// Buffers longer than this many windows are trimmed to the newest window
const MAX_BACKLOG_WINDOWS: usize = 8;

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Band magnitudes of one analysis window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandEnergies {
    /// Normalized mean magnitudes (about 1.0 for a full-scale sine in band)
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

/// Hann-windowed FFT producing per-band magnitudes
pub struct BandAnalyzer {
    config: FFTConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
}

impl BandAnalyzer {
    pub fn new(config: FFTConfig) -> Result<Self, AudioError> {
        config.validate()?;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| hann_window(i, config.fft_size))
            .collect();
        let spectrum = vec![Complex::new(0.0, 0.0); config.fft_size];

        Ok(Self {
            config,
            fft,
            window,
            spectrum,
        })
    }

    pub fn config(&self) -> &FFTConfig {
        &self.config
    }

    /// Analyze the first `fft_size` samples of `samples`
    pub fn analyze(&mut self, samples: &[f32]) -> BandEnergies {
        for (i, slot) in self.spectrum.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.spectrum);

        // A Hann-windowed sine of amplitude A peaks at A * N / 4
        let scale = 4.0 / self.config.fft_size as f32;
        let band = |bins: std::ops::Range<usize>| {
            let len = bins.len() as f32;
            self.spectrum[bins].iter().map(|c| c.norm()).sum::<f32>() / len * scale
        };

        BandEnergies {
            bass: band(self.config.bass_bins()),
            mid: band(self.config.mid_bins()),
            high: band(self.config.high_bins()),
        }
    }
}

/// Bass-energy onset detector with cooldown and a decaying pulse
#[derive(Debug, Clone)]
pub struct BeatDetector {
    config: BeatConfig,
    history: VecDeque<f32>,
    since_last: f32,
    beat: f32,
}

impl BeatDetector {
    pub fn new(config: BeatConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len),
            // Allow a beat on the very first qualifying tick
            since_last: config.cooldown_s,
            beat: 0.0,
            config,
        }
    }

    pub fn set_threshold(&mut self, ratio: f32) {
        self.config.threshold_ratio = ratio;
    }

    /// Current pulse value in [0, 1]
    pub fn beat(&self) -> f32 {
        self.beat
    }

    /// Feed one tick of bass energy covering `dt` seconds; true on a beat
    pub fn update(&mut self, energy: f32, dt: f32) -> bool {
        self.beat *= (-self.config.decay_per_s * dt).exp();
        self.since_last += dt;

        let detected = match self.average() {
            Some(avg) => {
                energy > self.config.energy_floor
                    && energy > avg * self.config.threshold_ratio
                    && self.since_last >= self.config.cooldown_s
            }
            None => false,
        };

        if detected {
            self.beat = 1.0;
            self.since_last = 0.0;
        }

        self.history.push_back(energy);
        while self.history.len() > self.config.history_len.max(1) {
            self.history.pop_front();
        }

        detected
    }

    fn average(&self) -> Option<f32> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history.iter().sum::<f32>() / self.history.len() as f32)
    }
}

/// Turns a stream of mono samples into [`AudioSignal`] snapshots
pub struct AudioAnalyzer {
    bands: BandAnalyzer,
    beats: BeatDetector,
    signal: AudioSignal,
}

impl AudioAnalyzer {
    pub fn new(fft: FFTConfig, beat: BeatConfig) -> Result<Self, AudioError> {
        Ok(Self {
            bands: BandAnalyzer::new(fft)?,
            beats: BeatDetector::new(beat),
            signal: AudioSignal::default(),
        })
    }

    pub fn signal(&self) -> AudioSignal {
        self.signal
    }

    pub fn set_beat_threshold(&mut self, ratio: f32) {
        self.beats.set_threshold(ratio);
    }

    /// Consume every complete window in `buffer` at 50% overlap.
    ///
    /// Each hop advances beat timing by its duration in samples, so results
    /// do not depend on how often this is called.
    pub fn process(&mut self, buffer: &mut Vec<f32>) -> AudioSignal {
        let config = self.bands.config();
        let size = config.fft_size;
        let hop = size / 2;
        let hop_dt = hop as f32 / config.sample_rate_hz as f32;
        let gain = config.band_gain;
        let smoothing = config.smoothing;

        // Fell behind: keep only the newest window
        if buffer.len() > size * MAX_BACKLOG_WINDOWS {
            let excess = buffer.len() - size;
            buffer.drain(..excess);
        }

        let mut detected = false;
        while buffer.len() >= size {
            let energies = self.bands.analyze(&buffer[..size]);
            buffer.drain(..hop);

            let approach = |level: f32, raw: f32| {
                let target = (raw * gain).clamp(0.0, 1.0);
                level + (target - level) * smoothing
            };
            self.signal.bass = approach(self.signal.bass, energies.bass);
            self.signal.mid = approach(self.signal.mid, energies.mid);
            self.signal.high = approach(self.signal.high, energies.high);

            detected |= self.beats.update(energies.bass, hop_dt);
        }

        self.signal.beat = self.beats.beat().clamp(0.0, 1.0);
        self.signal.beat_detected = detected;
        self.signal
    }
}
