//! Camera motion along the tunnel path.
//!
//! Position and vortex phase are integrated over frame time instead of being
//! derived from absolute time, so speed and twist edits take effect smoothly.

use glam::{Vec2, Vec3};

use crate::params::SceneParameters;
use crate::path::PathModel;

/// Integrated camera state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraState {
    /// Depth along the path (world units)
    pub z: f32,

    /// Accumulated vortex rotation (radians)
    pub vortex_phase: f32,
}

/// Single owner of [`CameraState`], advanced once per frame tick
#[derive(Debug, Clone, Default)]
pub struct CameraIntegrator {
    state: CameraState,
}

impl CameraIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a known state
    pub fn with_state(state: CameraState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Advance by `dt` seconds at the current speed and vortex rate
    pub fn advance(&mut self, params: &SceneParameters, dt: f32) {
        self.state.z += params.cam_speed * dt;
        self.state.vortex_phase += params.vortex_speed * dt;
    }

    /// Back to the path origin
    pub fn restart(&mut self) {
        self.state = CameraState::default();
    }
}

/// Orthonormal camera frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl CameraBasis {
    /// Frame looking from `origin` toward `target`, rolled by `roll` radians
    pub fn look_at(origin: Vec3, target: Vec3, roll: f32) -> Self {
        let forward = (target - origin).normalize();
        let roll_up = Vec3::new(roll.sin(), roll.cos(), 0.0);
        let right = forward.cross(roll_up).normalize();
        let up = right.cross(forward).normalize();
        Self { right, up, forward }
    }

    /// Direction through `screen` (y-up, height-normalized) for focal length `focal`
    pub fn ray_direction(&self, screen: Vec2, focal: f32) -> Vec3 {
        (screen.x * self.right + screen.y * self.up + focal * self.forward).normalize()
    }
}

/// Everything the renderer needs about the viewpoint for one frame
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame {
    pub origin: Vec3,
    pub target: Vec3,
    pub roll: f32,
    pub basis: CameraBasis,
}

impl CameraFrame {
    pub fn new(params: &SceneParameters, state: CameraState) -> Self {
        let path = PathModel::new(params);
        let origin = path.at(state.z);
        let target = path.at(state.z + params.cam_look_ahead);
        let roll = params.cam_roll_amp * (state.z * params.cam_roll_freq).sin();

        Self {
            origin,
            target,
            roll,
            basis: CameraBasis::look_at(origin, target, roll),
        }
    }
}
