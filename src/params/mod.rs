//! Parameter definitions with units and documented semantics.
//!
//! All tunable numbers live here with:
//! - Units (scene units, degrees, radians, seconds)
//! - Documented ranges and meanings
//! - Defaults reproducing the demo scene

mod render;
mod surface;
mod waves;

// Re-export all types
pub use render::{default_lights, CameraParams, DirectionalLight, Material, RenderConfig, NUM_LIGHTS};
pub use surface::SurfaceConfig;
pub use waves::WaveParameter;
