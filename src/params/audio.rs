//! Audio analysis configuration and constants.

use std::ops::Range;

use crate::error::AudioError;

/// FFT analysis configuration with frequency band mappings
#[derive(Debug, Clone)]
pub struct FFTConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// FFT update interval (milliseconds)
    /// 20 ms = 50 Hz analysis rate, faster than most beats
    pub update_interval_ms: u64,

    /// Bass frequency range (Hz)
    pub bass_range_hz: (f32, f32),

    /// Mid frequency range (Hz)
    pub mid_range_hz: (f32, f32),

    /// High frequency range (Hz)
    pub high_range_hz: (f32, f32),

    /// Gain applied to normalized band magnitudes before clamping to [0, 1]
    pub band_gain: f32,

    /// Fraction of the gap to the new band level closed per analysis tick
    /// (1.0 = no smoothing)
    pub smoothing: f32,
}

impl Default for FFTConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 1024,
            update_interval_ms: 20,
            bass_range_hz: (20.0, 200.0),
            mid_range_hz: (200.0, 1000.0),
            high_range_hz: (1000.0, 4000.0),
            band_gain: 6.0,
            smoothing: 0.35,
        }
    }
}

impl FFTConfig {
    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Get FFT bin range for bass frequencies
    pub fn bass_bins(&self) -> Range<usize> {
        self.band_bins(self.bass_range_hz)
    }

    /// Get FFT bin range for mid frequencies
    pub fn mid_bins(&self) -> Range<usize> {
        self.band_bins(self.mid_range_hz)
    }

    /// Get FFT bin range for high frequencies
    pub fn high_bins(&self) -> Range<usize> {
        self.band_bins(self.high_range_hz)
    }

    /// Bin range for a band; never empty and never past Nyquist
    fn band_bins(&self, (lo, hi): (f32, f32)) -> Range<usize> {
        let nyquist = self.fft_size / 2;
        let start = self.hz_to_bin(lo).min(nyquist - 1);
        let end = self.hz_to_bin(hi).clamp(start + 1, nyquist);
        start..end
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), AudioError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 4 {
            return Err(AudioError::Config(format!(
                "FFT size must be a power of 2 and >= 4, got {}",
                self.fft_size
            )));
        }
        if self.sample_rate_hz == 0 {
            return Err(AudioError::Config("Sample rate must be > 0".to_string()));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(AudioError::Config(format!(
                "smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }
        Ok(())
    }
}

/// Beat detection tuning
#[derive(Debug, Clone)]
pub struct BeatConfig {
    /// Bass energy must exceed the rolling average by this ratio
    pub threshold_ratio: f32,

    /// Number of analysis ticks in the rolling average (~1 s at 50 Hz)
    pub history_len: usize,

    /// Minimum time between beats (seconds)
    pub cooldown_s: f32,

    /// Exponential decay rate of the beat scalar (1/seconds)
    pub decay_per_s: f32,

    /// Raw bass energy below this never counts as a beat (silence guard)
    pub energy_floor: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: 1.5,
            history_len: 50,
            cooldown_s: 0.15,
            decay_per_s: 6.0,
            energy_floor: 0.01,
        }
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    /// 128 samples = 2.9ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_config_hz_to_bin() {
        let config = FFTConfig::default();

        // At 44100 Hz sample rate and 1024 FFT size:
        // Bin resolution = 44100 / 1024 ≈ 43.07 Hz per bin
        assert_eq!(config.hz_to_bin(0.0), 0);
        assert_eq!(config.hz_to_bin(43.07), 1);
        assert_eq!(config.hz_to_bin(100.0), 2);
    }

    #[test]
    fn test_fft_config_band_ranges() {
        let config = FFTConfig::default();

        let bass = config.bass_bins();
        let mid = config.mid_bins();
        let high = config.high_bins();

        assert!(!bass.is_empty());
        assert!(bass.end <= 10);

        assert!(mid.start >= bass.end);
        assert!(mid.end <= 50);

        assert!(high.start >= mid.end);
        assert!(high.end <= 200);
    }

    #[test]
    fn test_band_bins_never_empty() {
        let config = FFTConfig {
            fft_size: 16,
            bass_range_hz: (20.0, 30.0),
            ..Default::default()
        };
        let bass = config.bass_bins();
        assert_eq!(bass.len(), 1);
        assert!(config.high_bins().end <= 8);
    }

    #[test]
    fn test_validate_rejects_non_power_of_two() {
        let config = FFTConfig {
            fft_size: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(FFTConfig::default().validate().is_ok());
    }
}
