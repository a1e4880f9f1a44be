//! Headless fixed-fps recording to numbered PNG frames and a WAV soundtrack.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::audio::{AudioSignal, OfflineAudio, SampleSource, Synth};
use crate::error::RecordError;
use crate::params::{BeatConfig, FFTConfig, RecordingConfig};
use crate::renderer::Renderer;

/// What a finished recording produced
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub frames: usize,
    pub frames_dir: PathBuf,
    pub audio_path: Option<PathBuf>,
    /// Frames whose audio snapshot carried a fresh beat
    pub beat_frames: Vec<usize>,
}

/// Offline soundtrack for `config`, writing a WAV when audio is enabled
pub fn soundtrack(
    config: &RecordingConfig,
    fft: FFTConfig,
    beat: BeatConfig,
) -> Result<Option<OfflineAudio<Synth>>, RecordError> {
    if !config.with_audio {
        return Ok(None);
    }
    fs::create_dir_all(&config.output_dir)?;
    let audio = OfflineAudio::with_synth(fft, beat)?.record_to(config.audio_path())?;
    Ok(Some(audio))
}

/// Render `config.duration_secs` of flight at `width` x `height`.
///
/// The camera and the soundtrack both advance by the fixed frame step after
/// each frame, so frame `n` sees exactly the audio up to `n * dt` and the
/// output does not depend on how long each frame took to render.
pub fn record<S: SampleSource>(
    renderer: &mut Renderer,
    width: u32,
    height: u32,
    config: &RecordingConfig,
    mut audio: Option<OfflineAudio<S>>,
) -> Result<RecordSummary, RecordError> {
    let frames_dir = PathBuf::from(config.frames_dir());
    fs::create_dir_all(&frames_dir)?;

    let total = config.total_frames();
    let dt = config.frame_dt();
    let started = Instant::now();
    log::info!(
        "recording {total} frames at {}x{} ({} fps) to {}",
        width,
        height,
        config.fps,
        config.output_dir
    );

    let mut signal = AudioSignal::silent();
    let mut beat_frames = Vec::new();
    for frame_num in 0..total {
        let time = frame_num as f32 * dt;
        if signal.beat_detected {
            beat_frames.push(frame_num);
        }

        let frame = renderer.render_frame(width, height, time, &signal);
        frame.save_png(config.frame_path(frame_num))?;
        renderer.advance(dt);
        if let Some(audio) = audio.as_mut() {
            signal = audio.advance(dt)?;
        }

        if (frame_num + 1) % config.fps.max(1) as usize == 0 {
            log::info!(
                "recorded {}/{} frames ({:.1}s elapsed)",
                frame_num + 1,
                total,
                started.elapsed().as_secs_f32()
            );
        }
    }

    let audio_path = match audio {
        Some(audio) => {
            audio.finish()?;
            config.with_audio.then(|| PathBuf::from(config.audio_path()))
        }
        None => None,
    };

    log::info!(
        "recording finished: {total} frames ({} on a beat) in {:.1}s",
        beat_frames.len(),
        started.elapsed().as_secs_f32()
    );

    Ok(RecordSummary {
        frames: total,
        frames_dir,
        audio_path,
        beat_frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{Lattice, LatticeSet};
    use crate::params::SceneParameters;

    struct Hum;

    /// Silence, then a steady bass tone from `onset` seconds on
    struct LateKick {
        onset: usize,
        index: usize,
    }

    impl SampleSource for LateKick {
        fn next_frame(&mut self) -> [f32; 2] {
            let i = self.index;
            self.index += 1;
            if i < self.onset {
                return [0.0, 0.0];
            }
            let s = (std::f32::consts::TAU * 80.0 * i as f32 / 44100.0).sin() * 0.5;
            [s, s]
        }
    }

    impl SampleSource for Hum {
        fn next_frame(&mut self) -> [f32; 2] {
            [0.1, -0.1]
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cloudtunnel-{name}-{}", std::process::id()))
    }

    fn small_renderer() -> Renderer {
        let params = SceneParameters {
            render_steps: 20,
            ..Default::default()
        };
        let lattices = LatticeSet::new(
            Lattice::white_noise(16, 1).unwrap(),
            Lattice::blue_noise(16, 2).unwrap(),
        );
        Renderer::new(params, lattices).unwrap()
    }

    #[test]
    fn test_records_numbered_frames_and_advances_camera() {
        let dir = scratch_dir("frames");
        let config = RecordingConfig {
            duration_secs: 0.1,
            output_dir: dir.to_string_lossy().into_owned(),
            fps: 30,
            with_audio: false,
        };
        let mut renderer = small_renderer();

        let summary = record::<Hum>(&mut renderer, 8, 6, &config, None).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.audio_path, None);
        for n in 0..3 {
            let img = image::open(config.frame_path(n)).unwrap();
            assert_eq!((img.width(), img.height()), (8, 6));
        }

        let expected_z = 3.0 * config.frame_dt() * renderer.params().cam_speed;
        assert!((renderer.camera().z - expected_z).abs() < 1e-5);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_records_soundtrack_alongside_frames() {
        let dir = scratch_dir("soundtrack");
        let config = RecordingConfig {
            duration_secs: 0.1,
            output_dir: dir.to_string_lossy().into_owned(),
            fps: 10,
            with_audio: true,
        };
        fs::create_dir_all(&dir).unwrap();
        let audio = OfflineAudio::new(Hum, FFTConfig::default(), BeatConfig::default())
            .unwrap()
            .record_to(config.audio_path())
            .unwrap();

        let mut renderer = small_renderer();
        let summary = record(&mut renderer, 4, 4, &config, Some(audio)).unwrap();
        assert_eq!(summary.frames, 1);

        let wav = hound::WavReader::open(config.audio_path()).unwrap();
        assert_eq!(wav.len(), 2 * 4410);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_beat_lands_on_the_frame_after_its_audio() {
        let dir = scratch_dir("beat");
        let config = RecordingConfig {
            duration_secs: 1.0,
            output_dir: dir.to_string_lossy().into_owned(),
            fps: 10,
            with_audio: false,
        };
        // Tone starts at 0.5s; frame 5 renders at 0.5s with audio up to 0.5s
        let source = LateKick {
            onset: 22050,
            index: 0,
        };
        let audio = OfflineAudio::new(source, FFTConfig::default(), BeatConfig::default()).unwrap();

        let mut renderer = small_renderer();
        let summary = record(&mut renderer, 4, 4, &config, Some(audio)).unwrap();
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.beat_frames.first(), Some(&6));
        fs::remove_dir_all(&dir).unwrap();
    }
}
