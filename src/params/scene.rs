//! Per-frame scene parameters with documented defaults and boundary checks.

use glam::Vec3;

use crate::density::DensityRevision;
use crate::error::ParamError;
use crate::noise::NoiseKernel;

/// Hard cap on raymarch iterations; `render_steps` is clamped to this
pub const MAX_RENDER_STEPS: u32 = 300;

/// Immutable per-frame snapshot of every tunable the renderer reads.
///
/// Colors are linear-light triples. Angles are radians, distances are world
/// units along the tunnel (the default tunnel is 1.7 units in radius).
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParameters {
    // === Camera ===
    /// Forward speed along the path (units per second)
    pub cam_speed: f32,

    /// Focal length of the pinhole camera (larger = narrower view)
    pub cam_fov: f32,

    /// Roll amplitude (radians)
    pub cam_roll_amp: f32,

    /// Roll frequency (radians per unit of depth)
    pub cam_roll_freq: f32,

    /// How far ahead on the path the camera looks (units)
    pub cam_look_ahead: f32,

    // === Tunnel shape ===
    pub tunnel_radius: f32,
    pub path_amp_x: f32,
    pub path_freq_x: f32,
    pub path_amp_y: f32,
    pub path_freq_y: f32,

    // === Vortex ===
    /// Rotation rate of the cloud field (radians per second)
    pub vortex_speed: f32,

    /// Extra rotation per unit of depth ahead of the camera (radians per unit)
    pub vortex_twist: f32,

    // === Clouds ===
    /// Spatial frequency of the base shape noise
    pub noise_scale_base: f32,

    /// Spatial frequency of the first detail octave
    pub noise_scale_detail: f32,

    /// Multiplier applied to the noise term of the density function
    pub cloud_density: f32,

    /// Exponential fog rate toward the background color
    pub fog_density: f32,

    /// Enables multi-octave detail and distance-based octave reduction
    pub use_lod: bool,

    /// Raymarch iteration limit, at most [`MAX_RENDER_STEPS`]
    pub render_steps: u32,

    /// Maximum ray travel distance (units)
    pub draw_distance: f32,

    // === Sun ===
    /// Depth offset of the sun anchor ahead of the camera on the path
    pub sun_path_offset: f32,
    pub sun_glow_pow: f32,
    pub sun_core_pow: f32,
    pub sun_glare_pow: f32,

    // === Colors (linear) ===
    pub background: Vec3,
    pub light_color_1: Vec3,
    pub light_color_2: Vec3,
    pub cloud_base: Vec3,
    pub cloud_shadow: Vec3,
    pub sun_glow: Vec3,
    pub sun_core: Vec3,
    pub sun_glare: Vec3,
    pub lightning_color: Vec3,

    // === Lightning ===
    pub lightning_enabled: bool,

    /// Probability that a time slot produces a strike
    pub lightning_chance: f32,
    pub lightning_intensity: f32,

    /// Trigger strikes from the audio beat instead of the random slot test
    pub lightning_audio_sync: bool,

    /// Bass energy ratio over the rolling average that counts as a beat
    pub beat_threshold: f32,

    // === Noise selection ===
    pub noise_a: NoiseKernel,
    pub noise_b: NoiseKernel,

    /// Blend factor between kernel A (0) and kernel B (1)
    pub noise_mix: f32,

    pub density_revision: DensityRevision,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            cam_speed: 2.5,
            cam_fov: 1.8,
            cam_roll_amp: 0.2,
            cam_roll_freq: 0.1,
            cam_look_ahead: 1.0,

            tunnel_radius: 1.7,
            path_amp_x: 2.5,
            path_freq_x: 0.2,
            path_amp_y: 2.5,
            path_freq_y: 0.15,

            vortex_speed: 0.3,
            vortex_twist: 0.1,

            noise_scale_base: 0.3,
            noise_scale_detail: 0.7,
            cloud_density: 3.0,
            fog_density: 0.03,
            use_lod: true,
            render_steps: 150,
            draw_distance: 80.0,

            sun_path_offset: 15.0,
            sun_glow_pow: 100.0,
            sun_core_pow: 80.0,
            sun_glare_pow: 8.0,

            background: Vec3::new(0.4, 0.5, 0.6),
            light_color_1: Vec3::new(0.65, 0.65, 0.75),
            light_color_2: Vec3::new(1.0, 1.0, 0.95),
            cloud_base: Vec3::new(0.9, 0.9, 1.0),
            cloud_shadow: Vec3::new(0.1, 0.1, 0.2),
            sun_glow: Vec3::ONE,
            sun_core: Vec3::ONE,
            sun_glare: Vec3::new(1.0, 0.8, 0.7),
            lightning_color: Vec3::ONE,

            lightning_enabled: false,
            lightning_chance: 0.5,
            lightning_intensity: 1.0,
            lightning_audio_sync: false,
            beat_threshold: 1.5,

            noise_a: NoiseKernel::Soft,
            noise_b: NoiseKernel::Soft,
            noise_mix: 0.0,
            density_revision: DensityRevision::Anchored,
        }
    }
}

impl SceneParameters {
    /// Pull bounded fields into their legal ranges.
    ///
    /// Colors go to [0, 1] per channel, probabilities and the noise mix to
    /// [0, 1], and `render_steps` to [1, MAX_RENDER_STEPS]. NaN color
    /// channels collapse to 0; NaN scalars are left for
    /// [`validate`](Self::validate) to reject.
    pub fn clamped(mut self) -> Self {
        for color in self.colors_mut() {
            *color = color.clamp(Vec3::ZERO, Vec3::ONE);
        }
        self.lightning_chance = self.lightning_chance.clamp(0.0, 1.0);
        self.noise_mix = self.noise_mix.clamp(0.0, 1.0);
        self.render_steps = self.render_steps.clamp(1, MAX_RENDER_STEPS);
        self
    }

    /// Reject parameters the core cannot render meaningfully.
    pub fn validate(&self) -> Result<(), ParamError> {
        for (field, value) in self.scalars() {
            if !value.is_finite() {
                return Err(ParamError::NonFinite { field, value });
            }
        }

        for (field, value) in [
            ("tunnel_radius", self.tunnel_radius),
            ("cam_fov", self.cam_fov),
            ("noise_scale_base", self.noise_scale_base),
            ("noise_scale_detail", self.noise_scale_detail),
            ("draw_distance", self.draw_distance),
            ("sun_glow_pow", self.sun_glow_pow),
            ("sun_core_pow", self.sun_core_pow),
            ("sun_glare_pow", self.sun_glare_pow),
            ("beat_threshold", self.beat_threshold),
        ] {
            if value <= 0.0 {
                return Err(ParamError::NonPositive { field, value });
            }
        }

        for (field, value) in [
            ("cloud_density", self.cloud_density),
            ("fog_density", self.fog_density),
            ("lightning_intensity", self.lightning_intensity),
        ] {
            if value < 0.0 {
                return Err(ParamError::Negative { field, value });
            }
        }

        for (field, color) in self.colors() {
            for value in color.to_array() {
                if !value.is_finite() {
                    return Err(ParamError::NonFinite { field, value });
                }
                if !(0.0..=1.0).contains(&value) {
                    return Err(ParamError::OutOfRange {
                        field,
                        value,
                        min: 0.0,
                        max: 1.0,
                    });
                }
            }
        }

        for (field, value) in [
            ("lightning_chance", self.lightning_chance),
            ("noise_mix", self.noise_mix),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        if self.render_steps == 0 || self.render_steps > MAX_RENDER_STEPS {
            return Err(ParamError::OutOfRange {
                field: "render_steps",
                value: self.render_steps as f32,
                min: 1.0,
                max: MAX_RENDER_STEPS as f32,
            });
        }

        Ok(())
    }

    fn scalars(&self) -> [(&'static str, f32); 26] {
        [
            ("cam_speed", self.cam_speed),
            ("cam_fov", self.cam_fov),
            ("cam_roll_amp", self.cam_roll_amp),
            ("cam_roll_freq", self.cam_roll_freq),
            ("cam_look_ahead", self.cam_look_ahead),
            ("tunnel_radius", self.tunnel_radius),
            ("path_amp_x", self.path_amp_x),
            ("path_freq_x", self.path_freq_x),
            ("path_amp_y", self.path_amp_y),
            ("path_freq_y", self.path_freq_y),
            ("vortex_speed", self.vortex_speed),
            ("vortex_twist", self.vortex_twist),
            ("noise_scale_base", self.noise_scale_base),
            ("noise_scale_detail", self.noise_scale_detail),
            ("cloud_density", self.cloud_density),
            ("fog_density", self.fog_density),
            ("draw_distance", self.draw_distance),
            ("sun_path_offset", self.sun_path_offset),
            ("sun_glow_pow", self.sun_glow_pow),
            ("sun_core_pow", self.sun_core_pow),
            ("sun_glare_pow", self.sun_glare_pow),
            ("lightning_chance", self.lightning_chance),
            ("lightning_intensity", self.lightning_intensity),
            ("beat_threshold", self.beat_threshold),
            ("noise_mix", self.noise_mix),
            ("render_steps", self.render_steps as f32),
        ]
    }

    fn colors(&self) -> [(&'static str, Vec3); 9] {
        [
            ("background", self.background),
            ("light_color_1", self.light_color_1),
            ("light_color_2", self.light_color_2),
            ("cloud_base", self.cloud_base),
            ("cloud_shadow", self.cloud_shadow),
            ("sun_glow", self.sun_glow),
            ("sun_core", self.sun_core),
            ("sun_glare", self.sun_glare),
            ("lightning_color", self.lightning_color),
        ]
    }

    fn colors_mut(&mut self) -> [&mut Vec3; 9] {
        [
            &mut self.background,
            &mut self.light_color_1,
            &mut self.light_color_2,
            &mut self.cloud_base,
            &mut self.cloud_shadow,
            &mut self.sun_glow,
            &mut self.sun_core,
            &mut self.sun_glare,
            &mut self.lightning_color,
        ]
    }
}
