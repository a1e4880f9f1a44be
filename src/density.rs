//! Cloud density around the tunnel path.
//!
//! Density is zero inside the tube and grows past the wall, with the noise
//! term pushing the wall in and out. The vortex rotates the sampling domain
//! around the path. Every phase term is anchored to the integrated camera
//! state, so changing speed or twist mid-flight never makes the field jump.

use std::fmt;
use std::str::FromStr;

use glam::{Mat2, Vec2, Vec3, Vec3Swizzles};

use crate::camera::CameraState;
use crate::noise::{lerp, NoiseSource};
use crate::params::SceneParameters;
use crate::path::PathModel;

/// Octave budget that disables the empty-space early-out
pub const UNLIMITED_OCTAVES: u32 = 10;

/// Budget the raymarcher uses near the camera
pub const FULL_DETAIL_OCTAVES: u32 = 5;

/// Budget for the shadow probe toward the sun
pub const SHADOW_OCTAVES: u32 = 1;

/// Oscillating depth parallax of the vortex (radians per unit of depth)
const DEPTH_PARALLAX_STRENGTH: f32 = 0.015;

/// Reference scales for the camera-anchored z phase. Fixed so that editing
/// the live noise scales only rescales the offset ahead of the camera.
const REF_SCALE_BASE: f32 = 0.3;
const REF_SCALE_DETAIL: f32 = 0.7;

/// Rate at which the cloud phase drifts against the camera (units per second)
const CLOUD_DRIFT_RATE: f32 = 0.5;

/// Below this approximate density the detail octaves cannot produce cloud
const EMPTY_SPACE_CUTOFF: f32 = -0.5;

/// Detail octaves as (weight, frequency multiplier)
const DETAIL_OCTAVES: [(f32, f32); 4] = [(0.5, 1.0), (0.25, 2.25), (0.125, 5.0), (0.0625, 10.0)];

/// Per-octave scroll velocity for [`DensityRevision::DifferentialScroll`]
const DETAIL_SCROLL: [Vec3; 4] = [
    Vec3::ZERO,
    Vec3::new(0.05, 0.0, 0.15),
    Vec3::new(-0.08, 0.04, 0.3),
    Vec3::new(0.1, -0.06, 0.45),
];

/// Which revision of the detail layering to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DensityRevision {
    /// Detail octaves share the camera-anchored phase
    #[default]
    Anchored,

    /// Each finer octave also scrolls with time at its own rate, so small
    /// wisps slide across the larger shapes
    DifferentialScroll,
}

impl DensityRevision {
    pub fn name(self) -> &'static str {
        match self {
            DensityRevision::Anchored => "anchored",
            DensityRevision::DifferentialScroll => "scroll",
        }
    }
}

impl fmt::Display for DensityRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DensityRevision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anchored" => Ok(DensityRevision::Anchored),
            "scroll" | "differential-scroll" => Ok(DensityRevision::DifferentialScroll),
            _ => Err(format!(
                "unknown density revision '{s}' (expected anchored or scroll)"
            )),
        }
    }
}

/// Scalar density with a caller-chosen octave budget
pub trait DensitySource {
    /// Density in [0, 1] at `p`
    fn density(&self, p: Vec3, octaves: u32) -> f32;
}

/// Tunnel-shaped cloud field for one frame
#[derive(Debug, Clone)]
pub struct DensityField<N> {
    noise: N,
    path: PathModel,
    cam_z: f32,
    vortex_phase: f32,
    time: f32,
    tunnel_radius: f32,
    vortex_twist: f32,
    noise_scale_base: f32,
    noise_scale_detail: f32,
    cloud_density: f32,
    use_lod: bool,
    revision: DensityRevision,
}

impl<N: NoiseSource> DensityField<N> {
    pub fn new(params: &SceneParameters, camera: CameraState, noise: N, time: f32) -> Self {
        Self {
            noise,
            path: PathModel::new(params),
            cam_z: camera.z,
            vortex_phase: camera.vortex_phase,
            time,
            tunnel_radius: params.tunnel_radius,
            vortex_twist: params.vortex_twist,
            noise_scale_base: params.noise_scale_base,
            noise_scale_detail: params.noise_scale_detail,
            cloud_density: params.cloud_density,
            use_lod: params.use_lod,
            revision: params.density_revision,
        }
    }

    /// Vortex rotation at depth `z`
    pub fn twist_angle(&self, z: f32) -> f32 {
        let depth = z - self.cam_z;
        // sin(phase) keeps the parallax bounded: far clouds lead and lag the
        // rotation instead of spiralling further every turn
        let parallax = self.vortex_phase.sin() * depth * DEPTH_PARALLAX_STRENGTH;
        -self.vortex_phase + parallax + depth * self.vortex_twist
    }

    fn detail_octave(&self, twisted: Vec2, phase_z: f32, index: usize) -> f32 {
        let (weight, freq) = DETAIL_OCTAVES[index];
        let mut q = Vec3::new(
            twisted.x * self.noise_scale_detail * freq,
            twisted.y * self.noise_scale_detail * freq,
            phase_z * freq,
        );
        if self.revision == DensityRevision::DifferentialScroll {
            q += DETAIL_SCROLL[index] * self.time;
        }
        weight * self.noise.evaluate(q)
    }
}

impl<N: NoiseSource> DensitySource for DensityField<N> {
    fn density(&self, p: Vec3, octaves: u32) -> f32 {
        let rel = p - self.path.at(p.z);
        let tunnel_dist = rel.xy().length();
        let wall = tunnel_dist - self.tunnel_radius;

        // Clockwise by the twist angle
        let twisted = Mat2::from_angle(-self.twist_angle(p.z)) * rel.xy();

        let depth = p.z - self.cam_z;
        let anchor = self.cam_z - self.time * CLOUD_DRIFT_RATE;

        let base_z = anchor * REF_SCALE_BASE + depth * self.noise_scale_base;
        let q_base = (twisted * self.noise_scale_base).extend(base_z);
        let g = 0.5 + 0.5 * self.noise.evaluate(q_base);

        // Clearly empty air: detail noise cannot lift this above zero
        let approx = wall + g * 0.5 * self.cloud_density;
        if approx < EMPTY_SPACE_CUTOFF && octaves < UNLIMITED_OCTAVES {
            return wall.clamp(0.0, 1.0);
        }

        let detail_z = anchor * REF_SCALE_DETAIL + depth * self.noise_scale_detail;
        let mut detail = self.detail_octave(twisted, detail_z, 0);
        if self.use_lod {
            for index in 1..DETAIL_OCTAVES.len() {
                if octaves > index as u32 {
                    detail += self.detail_octave(twisted, detail_z, index);
                }
            }
        }

        // Sparse base regions erode toward empty even where detail is high
        let blended = lerp(detail * 0.1 - 0.5, detail, g * g);

        (wall + blended * self.cloud_density).clamp(0.0, 1.0)
    }
}

impl<D: DensitySource + ?Sized> DensitySource for &D {
    fn density(&self, p: Vec3, octaves: u32) -> f32 {
        (**self).density(p, octaves)
    }
}
