//! Parameter definitions with units and documented semantics.
//!
//! All tunables live here with:
//! - Units (world units, seconds, Hz, radians)
//! - Documented defaults and ranges
//! - Validation at the boundary so the rendering core can assume finite input

mod audio;
mod presets;
mod render;
mod scene;

// Re-export all types
pub use audio::{audio_constants, BeatConfig, FFTConfig};
pub use presets::{srgb, Preset};
pub use render::{RecordingConfig, RenderConfig};
pub use scene::{SceneParameters, MAX_RENDER_STEPS};
