//! Live playback with background analysis.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::analysis::AudioAnalyzer;
use super::signal::AudioSignal;
use super::synthesis::{SampleSource, Synth};
use crate::error::AudioError;
use crate::params::{BeatConfig, FFTConfig};

/// Lock that shrugs off poisoning; every guarded value stays usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Audio system managing synthesis and FFT analysis
pub struct AudioSystem {
    /// Latest analysis snapshot (thread-safe)
    signal: Arc<Mutex<AudioSignal>>,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    /// Beat threshold ratio as `f32` bits, picked up on the next analysis tick
    beat_threshold: Arc<AtomicU32>,

    running: Arc<AtomicBool>,
    analysis_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Start synthesis on the default output device
    pub fn new(fft_config: FFTConfig, beat_config: BeatConfig) -> Result<Self, AudioError> {
        let beat_threshold = Arc::new(AtomicU32::new(beat_config.threshold_ratio.to_bits()));
        let analyzer = AudioAnalyzer::new(fft_config.clone(), beat_config)?;
        let synth = Synth::new(fft_config.sample_rate_hz)?;

        // Shared state between audio callback and analysis thread
        let synth = Arc::new(Mutex::new(synth));
        let samples = Arc::new(Mutex::new(Vec::<f32>::new()));
        let signal = Arc::new(Mutex::new(AudioSignal::default()));

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("no audio output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;

        let channels = config.channels() as usize;
        log::info!(
            "audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate().0,
            channels
        );
        if config.sample_rate().0 as usize != fft_config.sample_rate_hz {
            log::warn!(
                "device rate {}Hz differs from synthesis rate {}Hz; pitch will shift",
                config.sample_rate().0,
                fft_config.sample_rate_hz
            );
        }

        let callback_synth = Arc::clone(&synth);
        let callback_samples = Arc::clone(&samples);
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut synth = lock(&callback_synth);
                    let mut samples = lock(&callback_samples);

                    for frame in data.chunks_mut(channels.max(1)) {
                        let [left, right] = synth.next_frame();
                        for (channel, out) in frame.iter_mut().enumerate() {
                            *out = if channel % 2 == 0 { left } else { right };
                        }
                        samples.push(left);
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        let running = Arc::new(AtomicBool::new(true));
        let analysis_thread = spawn_analysis_thread(
            analyzer,
            Duration::from_millis(fft_config.update_interval_ms),
            samples,
            Arc::clone(&signal),
            Arc::clone(&beat_threshold),
            Arc::clone(&running),
        );

        Ok(Self {
            signal,
            _stream: stream,
            beat_threshold,
            running,
            analysis_thread: Some(analysis_thread),
        })
    }

    /// Latest snapshot; never waits for fresh analysis
    pub fn signal(&self) -> AudioSignal {
        *lock(&self.signal)
    }

    /// Retune the running beat detector
    pub fn set_beat_threshold(&self, ratio: f32) {
        self.beat_threshold.store(ratio.to_bits(), Ordering::Relaxed);
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.analysis_thread.take() {
            if handle.join().is_err() {
                log::warn!("audio analysis thread panicked");
            }
        }
    }
}

/// Spawn the analysis thread
fn spawn_analysis_thread(
    mut analyzer: AudioAnalyzer,
    interval: Duration,
    samples: Arc<Mutex<Vec<f32>>>,
    signal: Arc<Mutex<AudioSignal>>,
    beat_threshold: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut pending = Vec::new();
        while running.load(Ordering::Relaxed) {
            thread::sleep(interval);

            // Hold the callback's lock only long enough to take its samples
            pending.append(&mut lock(&samples));
            analyzer.set_beat_threshold(f32::from_bits(beat_threshold.load(Ordering::Relaxed)));
            let latest = analyzer.process(&mut pending);
            *lock(&signal) = latest;
        }
    })
}
