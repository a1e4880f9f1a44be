//! Frame rendering: camera, sun, raymarch, tonemap.
//!
//! The renderer owns the scene parameters, the camera integrator, and the
//! lattices. Frames are shaded in parallel across rows; nothing a pixel reads
//! is written during a frame.

use std::path::Path;

use glam::{IVec2, Vec2, Vec3, Vec4};
use image::{ImageBuffer, Rgba};
use rayon::prelude::*;

use crate::audio::AudioSignal;
use crate::camera::{CameraFrame, CameraIntegrator, CameraState};
use crate::density::DensityField;
use crate::error::ParamError;
use crate::lattice::{Lattice, LatticeSet};
use crate::lightning::LightningField;
use crate::noise::{smoothstep, NoiseField};
use crate::params::SceneParameters;
use crate::path::PathModel;
use crate::raymarch::{composite, MarchResult, Raymarcher};

/// Display gamma exponent (inverse of 2.2)
const DISPLAY_GAMMA: f32 = 0.4545;

/// Gamma-encoded RGBA pixels, row 0 at the top
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    /// Tightly packed RGBA8 bytes, row 0 first
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| {
                let c = (p.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
                [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
            })
            .collect()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let bytes = self.to_rgba8();
        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(self.width, self.height);
        for (dst, src) in img.pixels_mut().zip(bytes.chunks_exact(4)) {
            *dst = Rgba([src[0], src[1], src[2], src[3]]);
        }
        img.save(path)
    }
}

/// Smooth shoulder then display gamma, per channel
pub fn tonemap(color: Vec3) -> Vec3 {
    let curve = |c: f32| smoothstep(0.0, 1.0, c).powf(DISPLAY_GAMMA);
    Vec3::new(curve(color.x), curve(color.y), curve(color.z))
}

/// Everything one frame needs, shared read-only by every pixel
pub struct FrameContext<'a> {
    params: &'a SceneParameters,
    camera: CameraFrame,
    sun_dir: Vec3,
    resolution: Vec2,
    marcher: Raymarcher<'a, DensityField<NoiseField<'a>>, NoiseField<'a>>,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        params: &'a SceneParameters,
        camera: CameraState,
        lattices: &'a LatticeSet,
        width: u32,
        height: u32,
        time: f32,
        audio: &AudioSignal,
    ) -> Self {
        let frame = CameraFrame::new(params, camera);
        let sun_anchor = PathModel::new(params).at(camera.z + params.sun_path_offset);
        let sun_dir = (sun_anchor - frame.origin).normalize();

        let noise_lattice: &'a Lattice = &lattices.noise;
        let noise = NoiseField::from_params(noise_lattice, params, time);
        let density = DensityField::new(params, camera, noise, time);
        let lightning = LightningField::new(params, noise, audio.beat);
        let marcher = Raymarcher::new(params, density, lightning, &lattices.dither, time);

        Self {
            params,
            camera: frame,
            sun_dir,
            resolution: Vec2::new(width as f32, height as f32),
            marcher,
        }
    }

    pub fn sun_dir(&self) -> Vec3 {
        self.sun_dir
    }

    /// Ray direction through the center of pixel (`x`, `row`), rows top-down
    pub fn ray_direction(&self, x: u32, row: u32) -> Vec3 {
        let frag = Vec2::new(x as f32 + 0.5, self.resolution.y - row as f32 - 0.5);
        let screen = (2.0 * frag - self.resolution) / self.resolution.y;
        self.camera.basis.ray_direction(screen, self.params.cam_fov)
    }

    /// Linear color before tonemapping, plus the raw march result
    pub fn trace(&self, x: u32, row: u32) -> (Vec3, MarchResult) {
        let p = self.params;
        let dir = self.ray_direction(x, row);
        let pixel = IVec2::new(x as i32, self.resolution.y as i32 - 1 - row as i32);

        let sun = self.sun_dir.dot(dir).clamp(0.0, 1.0);
        let sky = p.background
            + 0.4 * p.sun_glow * sun.powf(p.sun_glow_pow)
            + p.sun_core * sun.powf(p.sun_core_pow);

        let result = self.marcher.march(self.camera.origin, dir, sky, pixel, self.sun_dir);
        let color = composite(sky, &result) + 0.2 * p.sun_glare * sun.powf(p.sun_glare_pow);
        (color, result)
    }

    /// Final display color of one pixel
    pub fn shade(&self, x: u32, row: u32) -> Vec4 {
        tonemap(self.trace(x, row).0).extend(1.0)
    }
}

/// Owns scene state across frames
pub struct Renderer {
    params: SceneParameters,
    integrator: CameraIntegrator,
    lattices: LatticeSet,
}

impl Renderer {
    /// Create a renderer; parameters are clamped and validated first
    pub fn new(params: SceneParameters, lattices: LatticeSet) -> Result<Self, ParamError> {
        let params = params.clamped();
        params.validate()?;
        Ok(Self {
            params,
            integrator: CameraIntegrator::new(),
            lattices,
        })
    }

    pub fn params(&self) -> &SceneParameters {
        &self.params
    }

    /// Replace the parameters. The camera keeps its integrated position.
    pub fn set_params(&mut self, params: SceneParameters) -> Result<(), ParamError> {
        let params = params.clamped();
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Swap both lattices at once; no frame can be in flight under `&mut self`
    pub fn replace_lattices(&mut self, lattices: LatticeSet) {
        self.lattices = lattices;
    }

    /// Integrate the camera over `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.integrator.advance(&self.params, dt);
    }

    pub fn camera(&self) -> CameraState {
        self.integrator.state()
    }

    pub fn restart(&mut self) {
        self.integrator.restart();
    }

    pub fn frame_context(
        &self,
        width: u32,
        height: u32,
        time: f32,
        audio: &AudioSignal,
    ) -> FrameContext<'_> {
        FrameContext::new(
            &self.params,
            self.integrator.state(),
            &self.lattices,
            width,
            height,
            time,
            audio,
        )
    }

    /// Render a full frame at `time` seconds
    pub fn render_frame(&self, width: u32, height: u32, time: f32, audio: &AudioSignal) -> Framebuffer {
        let mut frame = Framebuffer::new(width, height);
        if width == 0 || height == 0 {
            return frame;
        }

        let ctx = self.frame_context(width, height, time, audio);
        frame
            .pixels
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(row, pixels)| {
                for (x, out) in pixels.iter_mut().enumerate() {
                    *out = ctx.shade(x as u32, row as u32);
                }
            });

        log::debug!(
            "rendered {}x{} at t={:.2}s, camera z={:.2}",
            width,
            height,
            time,
            self.integrator.state().z
        );
        frame
    }
}
