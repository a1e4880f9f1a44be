//! Tunnel centerline as a function of depth.

use glam::Vec3;

use crate::params::SceneParameters;

/// Sinusoidal centerline shared by the density field, camera, and sun anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathModel {
    pub amp_x: f32,
    pub freq_x: f32,
    pub amp_y: f32,
    pub freq_y: f32,
}

impl PathModel {
    pub fn new(params: &SceneParameters) -> Self {
        Self {
            amp_x: params.path_amp_x,
            freq_x: params.path_freq_x,
            amp_y: params.path_amp_y,
            freq_y: params.path_freq_y,
        }
    }

    /// Centerline point at depth `z`
    #[inline]
    pub fn at(&self, z: f32) -> Vec3 {
        Vec3::new(
            (z * self.freq_x).sin() * self.amp_x,
            (z * self.freq_y).cos() * self.amp_y,
            z,
        )
    }
}
