//! Tileable RGBA lattices backing the noise kernels and the ray dither.
//!
//! Both lattices are square grids of four independent channels in [0, 1],
//! addressed with wraparound so any coordinate is a legal lookup.

use std::sync::Arc;

use glam::{IVec2, Vec2, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::LatticeError;
use crate::params::RenderConfig;

/// Square tileable texture of RGBA texels
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    size: usize,
    texels: Vec<Vec4>,
}

impl Lattice {
    /// Wrap existing texel data (row-major, `size * size` entries)
    pub fn from_texels(size: usize, texels: Vec<Vec4>) -> Result<Self, LatticeError> {
        if size == 0 {
            return Err(LatticeError::ZeroSize);
        }
        if texels.len() != size * size {
            return Err(LatticeError::TexelCount {
                expected: size * size,
                actual: texels.len(),
            });
        }
        Ok(Self { size, texels })
    }

    /// Lattice where every channel of every texel is `value`
    pub fn constant(size: usize, value: f32) -> Result<Self, LatticeError> {
        Self::from_texels(size, vec![Vec4::splat(value); size * size])
    }

    /// Independent uniform white noise per channel
    pub fn white_noise(size: usize, seed: u64) -> Result<Self, LatticeError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let texels = (0..size * size)
            .map(|_| Vec4::new(rng.gen(), rng.gen(), rng.gen(), rng.gen()))
            .collect();
        Self::from_texels(size, texels)
    }

    /// High-pass filtered white noise.
    ///
    /// Subtracting a 3x3 box blur removes low-frequency clumps; the result is
    /// re-centered on 0.5 and clamped back into [0, 1].
    pub fn blue_noise(size: usize, seed: u64) -> Result<Self, LatticeError> {
        let white = Self::white_noise(size, seed)?;
        let n = size as i32;
        let mut texels = Vec::with_capacity(size * size);

        for y in 0..n {
            for x in 0..n {
                let mut sum = Vec4::ZERO;
                for ky in -1..=1 {
                    for kx in -1..=1 {
                        sum += white.fetch(IVec2::new(x + kx, y + ky));
                    }
                }
                let blurred = sum / 9.0;
                let high_pass = white.fetch(IVec2::new(x, y)) - blurred + Vec4::splat(0.5);
                texels.push(high_pass.clamp(Vec4::ZERO, Vec4::ONE));
            }
        }

        Self::from_texels(size, texels)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Nearest texel at an integer coordinate, wrapped into the lattice
    pub fn fetch(&self, coord: IVec2) -> Vec4 {
        let n = self.size as i32;
        let x = coord.x.rem_euclid(n) as usize;
        let y = coord.y.rem_euclid(n) as usize;
        self.texels[y * self.size + x]
    }

    /// Bilinear sample in texel space, wrapped.
    ///
    /// Texel centers sit on integer coordinates, so `sample_texels(IVec2)`
    /// equals `fetch` and halfway points average their neighbours.
    pub fn sample_texels(&self, pos: Vec2) -> Vec4 {
        let base = pos.floor();
        let f = pos - base;
        let n = self.size as f32;
        // Reduce before converting so huge coordinates stay in i32 range
        let i = IVec2::new(base.x.rem_euclid(n) as i32, base.y.rem_euclid(n) as i32);

        let a = self.fetch(i);
        let b = self.fetch(i + IVec2::X);
        let c = self.fetch(i + IVec2::Y);
        let d = self.fetch(i + IVec2::ONE);

        a.lerp(b, f.x).lerp(c.lerp(d, f.x), f.y)
    }
}

/// The two lattices a renderer samples, shared read-only across threads
#[derive(Debug, Clone)]
pub struct LatticeSet {
    /// White-noise lattice for the noise kernels
    pub noise: Arc<Lattice>,

    /// Blue-noise lattice for the per-pixel start offset
    pub dither: Arc<Lattice>,
}

impl LatticeSet {
    pub fn new(noise: Lattice, dither: Lattice) -> Self {
        Self {
            noise: Arc::new(noise),
            dither: Arc::new(dither),
        }
    }

    /// Generate both lattices from the render configuration
    pub fn generate(config: &RenderConfig) -> Result<Self, LatticeError> {
        let noise = Lattice::white_noise(config.noise_lattice_size, config.lattice_seed)?;
        // Different stream so the dither is independent of the noise lattice
        let dither = Lattice::blue_noise(
            config.dither_lattice_size,
            config.lattice_seed.wrapping_add(0x9E37_79B9),
        )?;
        Ok(Self::new(noise, dither))
    }
}
