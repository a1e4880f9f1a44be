//! Front-to-back volumetric raymarch through the cloud field.

use glam::{IVec2, Vec3, Vec4, Vec4Swizzles};

use crate::density::{DensitySource, FULL_DETAIL_OCTAVES, SHADOW_OCTAVES};
use crate::lattice::Lattice;
use crate::lightning::LightningField;
use crate::noise::NoiseSource;
use crate::params::{SceneParameters, MAX_RENDER_STEPS};

/// Largest start offset drawn from the dither lattice
const START_JITTER: f32 = 0.1;

const MIN_STEP: f32 = 0.1;
const STEP_GROWTH: f32 = 0.08;

/// Samples at or below this density are treated as empty air
const INSIDE_EPSILON: f32 = 0.01;

/// Distance toward the sun for the shadow probe
const SHADOW_PROBE: f32 = 0.6;

/// Accumulated alpha past which the ray stops
const OPAQUE_ALPHA: f32 = 0.96;

/// Distance thresholds and the octave budget beyond each
const LOD_BANDS: [(f32, u32); 4] = [(5.0, 4), (15.0, 3), (30.0, 2), (60.0, 1)];

/// Step length at travel distance `t`
#[inline]
pub fn step_size(t: f32) -> f32 {
    (STEP_GROWTH * t).max(MIN_STEP)
}

/// Octave budget at travel distance `t`
pub fn lod_octaves(t: f32, use_lod: bool) -> u32 {
    if !use_lod {
        return FULL_DETAIL_OCTAVES;
    }
    LOD_BANDS
        .iter()
        .filter(|(threshold, _)| t > *threshold)
        .map(|(_, octaves)| *octaves)
        .last()
        .unwrap_or(FULL_DETAIL_OCTAVES)
}

/// Why a ray stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Ran out of iterations
    StepLimit,

    /// Travelled past the draw distance
    DrawDistance,

    /// Accumulated enough opacity
    Opaque,
}

/// Outcome of one ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchResult {
    /// Premultiplied RGBA accumulator, clamped to [0, 1]
    pub color: Vec4,

    /// Iterations consumed
    pub steps: u32,

    /// Travel distance when the ray stopped
    pub distance: f32,

    pub termination: Termination,
}

/// Marches rays through a density source with lighting and lightning
pub struct Raymarcher<'a, D, N> {
    params: &'a SceneParameters,
    density: D,
    lightning: LightningField<N>,
    dither: &'a Lattice,
    time: f32,
}

impl<'a, D: DensitySource, N: NoiseSource> Raymarcher<'a, D, N> {
    pub fn new(
        params: &'a SceneParameters,
        density: D,
        lightning: LightningField<N>,
        dither: &'a Lattice,
        time: f32,
    ) -> Self {
        Self {
            params,
            density,
            lightning,
            dither,
            time,
        }
    }

    /// March from `origin` along unit direction `dir`.
    ///
    /// `background` is what fog blends toward; `pixel` picks the dither
    /// texel for the start offset.
    pub fn march(
        &self,
        origin: Vec3,
        dir: Vec3,
        background: Vec3,
        pixel: IVec2,
        sun_dir: Vec3,
    ) -> MarchResult {
        let limit = self.params.render_steps.min(MAX_RENDER_STEPS);
        let mut t = START_JITTER * self.dither.fetch(pixel).x;
        let mut sum = Vec4::ZERO;
        let mut steps = 0;
        let mut termination = Termination::StepLimit;

        while steps < limit {
            steps += 1;
            let dt = step_size(t);
            let pos = origin + t * dir;

            let den = self
                .density
                .density(pos, lod_octaves(t, self.params.use_lod));
            if den > INSIDE_EPSILON {
                let sample = self.shade(pos, den, t, dt, background, sun_dir);
                sum += sample * (1.0 - sum.w);
            }

            t += dt;
            if sum.w > OPAQUE_ALPHA {
                termination = Termination::Opaque;
                break;
            }
            if t > self.params.draw_distance {
                termination = Termination::DrawDistance;
                break;
            }
        }

        MarchResult {
            color: sum.clamp(Vec4::ZERO, Vec4::ONE),
            steps,
            distance: t,
            termination,
        }
    }

    /// Premultiplied color of one cloud sample
    fn shade(&self, pos: Vec3, den: f32, t: f32, dt: f32, background: Vec3, sun_dir: Vec3) -> Vec4 {
        let p = self.params;

        // Shadows never need fine detail
        let toward_sun = self.density.density(pos + SHADOW_PROBE * sun_dir, SHADOW_OCTAVES);
        let diffuse = ((den - toward_sun) / 0.5).clamp(0.0, 1.0);

        let strike = self.lightning.strike(pos, self.time);

        let mut light = p.light_color_1 * 1.1 + 0.8 * p.light_color_2 * diffuse;
        light += p.lightning_color * strike.glow * p.lightning_intensity * 5.0;

        let mut rgb = p.cloud_base.lerp(p.cloud_shadow, den) * light;
        // Emissive, ignores shadowing
        rgb += p.lightning_color * strike.core * p.lightning_intensity * 10.0;

        let fog = 1.0 - (-p.fog_density * t).exp2();
        rgb = rgb.lerp(background, fog);

        let alpha = (den * 8.0 * dt).min(1.0);
        (rgb * alpha).extend(alpha)
    }
}

/// Composite a march result over an opaque background color
#[inline]
pub fn composite(background: Vec3, result: &MarchResult) -> Vec3 {
    background * (1.0 - result.color.w) + result.color.xyz()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseField;

    struct Uniform(f32);

    impl DensitySource for Uniform {
        fn density(&self, _p: Vec3, _octaves: u32) -> f32 {
            self.0
        }
    }

    fn march_uniform(params: &SceneParameters, density: f32, dither: &Lattice) -> MarchResult {
        let noise_lattice = Lattice::constant(4, 0.5).unwrap();
        let noise = NoiseField::from_params(&noise_lattice, params, 0.0);
        let lightning = LightningField::new(params, noise, 0.0);
        let marcher = Raymarcher::new(params, Uniform(density), lightning, dither, 0.0);
        marcher.march(Vec3::ZERO, Vec3::Z, params.background, IVec2::new(3, 7), Vec3::Z)
    }

    #[test]
    fn test_empty_space_is_transparent_and_stops_at_draw_distance() {
        let params = SceneParameters {
            render_steps: MAX_RENDER_STEPS,
            ..Default::default()
        };
        let dither = Lattice::blue_noise(16, 1).unwrap();
        let result = march_uniform(&params, 0.0, &dither);

        assert_eq!(result.color, Vec4::ZERO);
        assert_eq!(result.termination, Termination::DrawDistance);
        // At most one step past the draw distance
        let last_step = step_size(result.distance / (1.0 + STEP_GROWTH));
        assert!(result.distance > params.draw_distance);
        assert!(result.distance - params.draw_distance <= last_step + 1e-4);
    }

    #[test]
    fn test_thin_haze_below_epsilon_is_skipped() {
        let params = SceneParameters::default();
        let dither = Lattice::constant(4, 0.0).unwrap();
        let result = march_uniform(&params, INSIDE_EPSILON, &dither);
        assert_eq!(result.color.w, 0.0);
    }

    #[test]
    fn test_dense_cloud_exits_early_when_opaque() {
        let params = SceneParameters::default();
        let dither = Lattice::constant(4, 0.0).unwrap();
        let result = march_uniform(&params, 1.0, &dither);

        assert_eq!(result.termination, Termination::Opaque);
        assert!(result.color.w > OPAQUE_ALPHA);
        assert!(result.steps < 10);
        assert!(result.color.max_element() <= 1.0);
    }

    #[test]
    fn test_step_limit_is_respected() {
        let params = SceneParameters {
            render_steps: 3,
            ..Default::default()
        };
        let dither = Lattice::constant(4, 0.0).unwrap();
        let result = march_uniform(&params, 0.0, &dither);
        assert_eq!(result.termination, Termination::StepLimit);
        assert_eq!(result.steps, 3);
        assert!((result.distance - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_dither_offsets_the_start() {
        let params = SceneParameters {
            render_steps: 1,
            ..Default::default()
        };
        let dither = Lattice::constant(4, 1.0).unwrap();
        let result = march_uniform(&params, 0.0, &dither);
        assert!((result.distance - (START_JITTER + MIN_STEP)).abs() < 1e-6);
    }

    #[test]
    fn test_step_size_grows_with_distance() {
        assert_eq!(step_size(0.0), MIN_STEP);
        assert_eq!(step_size(1.0), MIN_STEP);
        assert!((step_size(50.0) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_lod_bands() {
        assert_eq!(lod_octaves(1.0, true), 5);
        assert_eq!(lod_octaves(5.5, true), 4);
        assert_eq!(lod_octaves(20.0, true), 3);
        assert_eq!(lod_octaves(45.0, true), 2);
        assert_eq!(lod_octaves(61.0, true), 1);
        assert_eq!(lod_octaves(61.0, false), FULL_DETAIL_OCTAVES);
    }

    #[test]
    fn test_composite_over_background() {
        let result = MarchResult {
            color: Vec4::new(0.2, 0.1, 0.0, 0.5),
            steps: 1,
            distance: 1.0,
            termination: Termination::StepLimit,
        };
        let out = composite(Vec3::ONE, &result);
        assert!((out - Vec3::new(0.7, 0.6, 0.5)).length() < 1e-6);
    }
}
