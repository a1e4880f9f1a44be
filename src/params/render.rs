//! Rendering, lattice and recording configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Internal resolution as a fraction of the window (0.1 - 1.0).
    /// The raymarcher runs on the CPU, so the live view defaults to a
    /// quarter-resolution framebuffer that the GPU stretches to the window.
    pub render_scale: f32,

    /// Side length of the white-noise lattice (texels)
    pub noise_lattice_size: usize,

    /// Side length of the blue-noise dither lattice (texels)
    pub dither_lattice_size: usize,

    /// Seed for both lattices
    pub lattice_seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            render_scale: 0.25,
            noise_lattice_size: 256,
            dither_lattice_size: 1024,
            lattice_seed: 42,
        }
    }
}

impl RenderConfig {
    /// Framebuffer size for a surface of `width` x `height` pixels
    pub fn framebuffer_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = self.render_scale.clamp(0.1, 1.0);
        (
            ((width as f32 * scale).round() as u32).max(1),
            ((height as f32 * scale).round() as u32).max(1),
        )
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,

    /// Write the offline soundtrack next to the frames
    pub with_audio: bool,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 30,
            with_audio: true,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Fixed time step between frames (seconds)
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Path of a single numbered frame
    pub fn frame_path(&self, frame_num: usize) -> String {
        format!("{}/frame_{:05}.png", self.frames_dir(), frame_num)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_size_scales_and_never_hits_zero() {
        let config = RenderConfig::default();
        assert_eq!(config.framebuffer_size(1280, 720), (320, 180));
        assert_eq!(config.framebuffer_size(1, 1), (1, 1));

        let full = RenderConfig {
            render_scale: 4.0,
            ..Default::default()
        };
        assert_eq!(full.framebuffer_size(640, 480), (640, 480));
    }

    #[test]
    fn test_recording_frame_count_and_paths() {
        let config = RecordingConfig::new(2.5);
        assert_eq!(config.total_frames(), 75);
        assert!((config.frame_dt() - 1.0 / 30.0).abs() < 1e-6);
        assert_eq!(config.frame_path(7), "recording/frames/frame_00007.png");
        assert_eq!(config.audio_path(), "recording/audio.wav");
    }
}
