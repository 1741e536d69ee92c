//! Rendering, lighting and camera configuration.

use bytemuck::{Pod, Zeroable};

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (radians)
    pub fov_y: f32,

    /// Near clipping plane (scene units)
    pub near_plane: f32,

    /// Far clipping plane (scene units)
    pub far_plane: f32,

    /// Clear color behind the surface
    pub clear_color: [f64; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_y: std::f32::consts::FRAC_PI_3,
            near_plane: 1.0,
            far_plane: 1000.0,
            clear_color: [0.753, 0.753, 0.753, 1.0], // silver
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

/// Surface material. Layout matches `Material` in ocean.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Material {
    pub ambient: [f32; 4],
    /// Alpha channel is the surface opacity
    pub diffuse: [f32; 4],
    /// Alpha channel is the specular power
    pub specular: [f32; 4],
    pub reflect: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0.5, 0.5, 0.5, 1.0],
            diffuse: [1.0, 1.0, 1.0, 0.5],
            specular: [0.8, 0.8, 0.8, 32.0],
            reflect: [0.0; 4],
        }
    }
}

/// Directional light. Layout matches `DirectionalLight` in ocean.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DirectionalLight {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// xyz = direction the light travels, w unused
    pub direction: [f32; 4],
}

/// Number of directional lights the shading pipeline consumes.
pub const NUM_LIGHTS: usize = 4;

/// Four dim lights from the upper corners of the scene.
pub fn default_lights() -> [DirectionalLight; NUM_LIGHTS] {
    let base = DirectionalLight {
        ambient: [0.15, 0.15, 0.15, 1.0],
        diffuse: [0.25, 0.25, 0.25, 1.0],
        specular: [0.1, 0.1, 0.1, 1.0],
        direction: [-0.577, -0.577, 0.577, 0.0],
    };
    let corners = [
        [-0.577, -0.577, 0.577, 0.0],
        [0.577, -0.577, 0.577, 0.0],
        [0.577, -0.577, -0.577, 0.0],
        [-0.577, -0.577, -0.577, 0.0],
    ];
    corners.map(|direction| DirectionalLight { direction, ..base })
}

/// Third-person orbit camera parameters
#[derive(Debug, Clone)]
pub struct CameraParams {
    /// Point the camera orbits (scene units)
    pub target: [f32; 3],

    /// Initial distance from target
    pub distance: f32,

    /// Closest allowed distance
    pub min_distance: f32,

    /// Farthest allowed distance
    pub max_distance: f32,

    /// Initial pitch above the horizon (radians)
    pub pitch: f32,

    /// Radians of rotation per pixel of mouse motion
    pub rotate_sensitivity: f32,

    /// Distance change per scroll line
    pub zoom_step: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            target: [0.0, 2.5, 0.0],
            distance: 20.0,
            min_distance: 10.0,
            max_distance: 90.0,
            pitch: std::f32::consts::FRAC_PI_4,
            rotate_sensitivity: 0.005,
            zoom_step: 1.0,
        }
    }
}
