//! Lattice-backed noise kernels and the two-kernel blend.
//!
//! Every kernel reads the white-noise lattice through the same smoothed
//! value-noise lookup; they differ in how they move through and reshape the
//! sampling domain. All kernels return values in [-1, 1].

use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3, Vec3Swizzles};

use crate::lattice::Lattice;
use crate::params::SceneParameters;

/// Skew between z-slices in the lattice lookup (texels per unit of depth)
const SLICE_OFFSET: Vec2 = Vec2::new(37.0, 239.0);

/// Mix factors at or below this evaluate kernel A only
pub const MIX_A_ONLY: f32 = 0.01;

/// Mix factors at or above this evaluate kernel B only
pub const MIX_B_ONLY: f32 = 0.99;

/// Anything that maps a 3-D coordinate to a scalar noise value
pub trait NoiseSource {
    fn evaluate(&self, coord: Vec3) -> f32;
}

/// Noise kernel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseKernel {
    /// Smoothed value noise with slow lateral drift
    #[default]
    Soft,

    /// Rectified value noise for puffy, creased clouds
    Billow,

    /// Thresholded coarse noise with an empty core around the tunnel axis
    Ink,

    /// Value noise sampled through a drifting domain warp
    Liquid,
}

impl NoiseKernel {
    pub const ALL: [NoiseKernel; 4] = [
        NoiseKernel::Soft,
        NoiseKernel::Billow,
        NoiseKernel::Ink,
        NoiseKernel::Liquid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NoiseKernel::Soft => "soft",
            NoiseKernel::Billow => "billow",
            NoiseKernel::Ink => "ink",
            NoiseKernel::Liquid => "liquid",
        }
    }

    /// Evaluate this kernel at `x` for elapsed time `time` (seconds)
    #[inline]
    pub fn evaluate(self, lattice: &Lattice, x: Vec3, time: f32) -> f32 {
        match self {
            NoiseKernel::Soft => soft(lattice, x, time),
            NoiseKernel::Billow => billow(lattice, x, time),
            NoiseKernel::Ink => ink(lattice, x, time),
            NoiseKernel::Liquid => liquid(lattice, x, time),
        }
    }
}

impl fmt::Display for NoiseKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseKernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        match lowered.as_str() {
            "1" => Ok(NoiseKernel::Soft),
            "2" => Ok(NoiseKernel::Billow),
            "3" | "cells" => Ok(NoiseKernel::Ink),
            "4" => Ok(NoiseKernel::Liquid),
            _ => NoiseKernel::ALL
                .into_iter()
                .find(|kernel| kernel.name() == lowered)
                .ok_or_else(|| {
                    format!("unknown noise kernel '{s}' (expected soft, billow, ink or liquid)")
                }),
        }
    }
}

/// Smoothed value noise in [0, 1].
///
/// The integer z-slice selects a skewed offset into the lattice; the two
/// channels of the bilinear sample are interpolated across the slice.
#[inline]
pub fn lattice_value(lattice: &Lattice, x: Vec3) -> f32 {
    let p = x.floor();
    let f = x - p;
    let f = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let uv = p.xy() + SLICE_OFFSET * p.z + f.xy();
    let texel = lattice.sample_texels(uv);
    lerp(texel.y, texel.x, f.z)
}

fn soft(lattice: &Lattice, x: Vec3, time: f32) -> f32 {
    let q = x + Vec3::new(time * 0.05, time * 0.02, 0.0);
    lattice_value(lattice, q) * 2.0 - 1.0
}

fn billow(lattice: &Lattice, x: Vec3, time: f32) -> f32 {
    let q = x + Vec3::new(0.0, 0.0, time * 0.1);
    let n = lattice_value(lattice, q) * 2.0 - 1.0;
    1.0 - 2.0 * n.abs()
}

fn ink(lattice: &Lattice, x: Vec3, time: f32) -> f32 {
    let mask = smoothstep(0.2, 0.8, x.xy().length());

    // Slow coordinate distortion so blobs squish and drift instead of pulsing
    let drift = Vec3::new(
        (x.z * 0.5 + time * 0.2).sin() * 0.3,
        (x.z * 0.3 + time * 0.15).cos() * 0.3,
        time * 0.15,
    );
    let n = lattice_value(lattice, x * 0.6 + drift);
    let blob = smoothstep(0.35, 0.65, n);

    (blob * 2.0 - 1.0) * mask - (1.0 - mask)
}

fn liquid(lattice: &Lattice, x: Vec3, time: f32) -> f32 {
    let warp_coord = x * 0.5 + Vec3::new(time * 0.1, -time * 0.1, time * 0.2);
    let warp = lattice_value(lattice, warp_coord) * 2.0 - 1.0;

    let q = x + Vec3::new(warp * 4.0, warp * 2.0, 0.0);
    lattice_value(lattice, q) * 2.0 - 1.0
}

/// Blend two lazily evaluated kernels.
///
/// Near the ends of the mix range only one side is evaluated at all.
#[inline]
pub fn blend(mix: f32, a: impl FnOnce() -> f32, b: impl FnOnce() -> f32) -> f32 {
    if mix <= MIX_A_ONLY {
        return a();
    }
    if mix >= MIX_B_ONLY {
        return b();
    }
    lerp(a(), b(), mix)
}

/// Two kernels over one lattice at a fixed point in time
#[derive(Debug, Clone, Copy)]
pub struct NoiseField<'a> {
    lattice: &'a Lattice,
    kernel_a: NoiseKernel,
    kernel_b: NoiseKernel,
    mix: f32,
    time: f32,
}

impl<'a> NoiseField<'a> {
    pub fn new(
        lattice: &'a Lattice,
        kernel_a: NoiseKernel,
        kernel_b: NoiseKernel,
        mix: f32,
        time: f32,
    ) -> Self {
        Self {
            lattice,
            kernel_a,
            kernel_b,
            mix,
            time,
        }
    }

    /// Field configured from the scene's kernel pair and blend factor
    pub fn from_params(lattice: &'a Lattice, params: &SceneParameters, time: f32) -> Self {
        Self::new(lattice, params.noise_a, params.noise_b, params.noise_mix, time)
    }
}

impl NoiseSource for NoiseField<'_> {
    #[inline]
    fn evaluate(&self, coord: Vec3) -> f32 {
        blend(
            self.mix,
            || self.kernel_a.evaluate(self.lattice, coord, self.time),
            || self.kernel_b.evaluate(self.lattice, coord, self.time),
        )
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for &N {
    #[inline]
    fn evaluate(&self, coord: Vec3) -> f32 {
        (**self).evaluate(coord)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite step matching the shading-language builtin, including
/// reversed edges (`edge0 > edge1` yields a falling step)
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn lattice() -> Lattice {
        Lattice::white_noise(64, 11).unwrap()
    }

    fn sample_points() -> impl Iterator<Item = Vec3> {
        (0..200).map(|i| {
            let f = i as f32;
            Vec3::new((f * 0.731).sin() * 3.0, (f * 0.377).cos() * 3.0, f * 0.213 - 10.0)
        })
    }

    #[test]
    fn test_kernels_stay_in_signed_unit_range() {
        let lattice = lattice();
        for kernel in NoiseKernel::ALL {
            for p in sample_points() {
                let n = kernel.evaluate(&lattice, p, 3.7);
                assert!((-1.0..=1.0).contains(&n), "{kernel} gave {n} at {p}");
            }
        }
    }

    #[test]
    fn test_lattice_value_of_constant_lattice() {
        let flat = Lattice::constant(16, 0.25).unwrap();
        for p in sample_points() {
            assert!((lattice_value(&flat, p) - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ink_is_empty_on_the_axis() {
        let lattice = lattice();
        for z in [0.0, 5.5, -12.0] {
            let n = NoiseKernel::Ink.evaluate(&lattice, Vec3::new(0.05, -0.05, z), 1.0);
            assert_eq!(n, -1.0);
        }
    }

    #[test]
    fn test_billow_is_creased_at_mid_value() {
        // lattice value 0.5 -> n = 0 -> billow peaks at 1
        let flat = Lattice::constant(8, 0.5).unwrap();
        assert_eq!(NoiseKernel::Billow.evaluate(&flat, Vec3::ONE, 0.0), 1.0);
    }

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        let lattice = lattice();
        let time = 2.0;
        for p in sample_points() {
            let a = NoiseKernel::Billow.evaluate(&lattice, p, time);
            let b = NoiseKernel::Liquid.evaluate(&lattice, p, time);
            let field = |mix| {
                NoiseField::new(&lattice, NoiseKernel::Billow, NoiseKernel::Liquid, mix, time)
                    .evaluate(p)
            };
            assert_eq!(field(0.0), a);
            assert_eq!(field(1.0), b);
            assert!((field(0.5) - (a + b) * 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_blend_skips_unused_kernel() {
        let a_calls = Cell::new(0);
        let b_calls = Cell::new(0);
        let a = || {
            a_calls.set(a_calls.get() + 1);
            1.0
        };
        let b = || {
            b_calls.set(b_calls.get() + 1);
            -1.0
        };

        assert_eq!(blend(0.005, a, b), 1.0);
        assert_eq!((a_calls.get(), b_calls.get()), (1, 0));

        assert_eq!(blend(0.995, a, b), -1.0);
        assert_eq!((a_calls.get(), b_calls.get()), (1, 1));

        assert_eq!(blend(0.25, a, b), 0.5);
        assert_eq!((a_calls.get(), b_calls.get()), (2, 2));
    }

    #[test]
    fn test_smoothstep_handles_reversed_edges() {
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(1.0, 0.3, 0.2), 1.0);
        assert_eq!(smoothstep(1.0, 0.3, 1.0), 0.0);
    }

    #[test]
    fn test_kernel_parsing() {
        assert_eq!("liquid".parse::<NoiseKernel>(), Ok(NoiseKernel::Liquid));
        assert_eq!("3".parse::<NoiseKernel>(), Ok(NoiseKernel::Ink));
        assert_eq!("Cells".parse::<NoiseKernel>(), Ok(NoiseKernel::Ink));
        assert!("perlin".parse::<NoiseKernel>().is_err());
    }
}
