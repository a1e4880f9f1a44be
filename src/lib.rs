//! Cloudtunnel library - procedural volumetric cloud tunnel renderer

pub mod audio;
pub mod camera;
pub mod cli;
pub mod density;
pub mod display;
pub mod error;
pub mod lattice;
pub mod lightning;
pub mod noise;
pub mod params;
pub mod path;
pub mod raymarch;
pub mod recording;
pub mod renderer;
