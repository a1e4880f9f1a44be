//! Command-line argument parsing.

use clap::Parser;

use crate::density::DensityRevision;
use crate::error::ParamError;
use crate::noise::NoiseKernel;
use crate::params::{Preset, RecordingConfig, RenderConfig, SceneParameters};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "cloudtunnel")]
#[command(about = "Volumetric cloud tunnel flythrough", long_about = None)]
pub struct Args {
    /// Look preset: dreamy (default), sunset, storm, moonlight
    #[arg(long, value_name = "PRESET", default_value = "dreamy")]
    pub preset: Preset,

    /// Window width (pixels), also the recording width
    #[arg(long, value_name = "PIXELS", default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels), also the recording height
    #[arg(long, value_name = "PIXELS", default_value_t = 720)]
    pub height: u32,

    /// Internal resolution as a fraction of the window (live view only)
    #[arg(long, value_name = "SCALE", default_value_t = 0.25)]
    pub render_scale: f32,

    /// Raymarch iteration limit (1-300)
    #[arg(long, value_name = "STEPS")]
    pub steps: Option<u32>,

    /// Maximum ray travel distance
    #[arg(long, value_name = "UNITS")]
    pub draw_distance: Option<f32>,

    /// Disable multi-octave detail and distance-based LOD
    #[arg(long)]
    pub no_lod: bool,

    /// Enable lightning strikes
    #[arg(long)]
    pub lightning: bool,

    /// Trigger lightning from the audio beat (implies --lightning)
    #[arg(long)]
    pub audio_sync: bool,

    /// Probability that a lightning slot fires (0-1)
    #[arg(long, value_name = "P")]
    pub chance: Option<f32>,

    /// Lightning brightness multiplier
    #[arg(long, value_name = "X")]
    pub intensity: Option<f32>,

    /// First noise kernel: soft, billow, ink, liquid
    #[arg(long, value_name = "KERNEL")]
    pub noise_a: Option<NoiseKernel>,

    /// Second noise kernel: soft, billow, ink, liquid
    #[arg(long, value_name = "KERNEL")]
    pub noise_b: Option<NoiseKernel>,

    /// Blend between the two kernels (0 = A only, 1 = B only)
    #[arg(long, value_name = "MIX")]
    pub noise_mix: Option<f32>,

    /// Density revision: anchored or scroll
    #[arg(long, value_name = "REVISION")]
    pub revision: Option<DensityRevision>,

    /// Seed for the noise and dither lattices
    #[arg(long, value_name = "SEED", default_value_t = 42)]
    pub seed: u64,

    /// Record headless to PNG frames (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Recording frame rate
    #[arg(long, value_name = "FPS", default_value_t = 30)]
    pub fps: u32,

    /// Recording output directory
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output: String,

    /// No audio playback or soundtrack
    #[arg(long)]
    pub no_audio: bool,
}

impl Args {
    /// Validated parameters for the selected preset
    pub fn build_params(&self) -> Result<SceneParameters, ParamError> {
        self.params_for(self.preset)
    }

    /// `preset` merged onto [`Args::base_params`], clamped and validated.
    ///
    /// Presets and CLI overrides touch disjoint fields, so the overrides
    /// survive any preset switch.
    pub fn params_for(&self, preset: Preset) -> Result<SceneParameters, ParamError> {
        let params = preset.apply(self.base_params()).clamped();
        params.validate()?;
        Ok(params)
    }

    /// Default record with the CLI overrides, before any preset
    pub fn base_params(&self) -> SceneParameters {
        let mut params = SceneParameters::default();

        if let Some(steps) = self.steps {
            params.render_steps = steps;
        }
        if let Some(draw_distance) = self.draw_distance {
            params.draw_distance = draw_distance;
        }
        if self.no_lod {
            params.use_lod = false;
        }
        if self.lightning || self.audio_sync {
            params.lightning_enabled = true;
        }
        if self.audio_sync {
            params.lightning_audio_sync = true;
        }
        if let Some(chance) = self.chance {
            params.lightning_chance = chance;
        }
        if let Some(intensity) = self.intensity {
            params.lightning_intensity = intensity;
        }
        if let Some(kernel) = self.noise_a {
            params.noise_a = kernel;
        }
        if let Some(kernel) = self.noise_b {
            params.noise_b = kernel;
        }
        if let Some(mix) = self.noise_mix {
            params.noise_mix = mix;
        }
        if let Some(revision) = self.revision {
            params.density_revision = revision;
        }
        params
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            render_scale: self.render_scale,
            lattice_seed: self.seed,
            ..Default::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| RecordingConfig {
            duration_secs: duration.max(0.0),
            output_dir: self.output.clone(),
            fps: self.fps.max(1),
            with_audio: !self.no_audio,
        })
    }
}
