//! Third-person orbit camera around the ocean surface.

use glam::{Mat4, Vec3};

use crate::params::{CameraParams, RenderConfig};
use crate::rendering::ViewState;

/// Keeps the camera off the horizon and away from the pole
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.05;
const MIN_PITCH: f32 = 0.05;

/// Camera orbiting a fixed target on a sphere of variable radius
pub struct OrbitCamera {
    params: CameraParams,
    /// Rotation around +Y (radians); PI looks from -Z toward +Z
    yaw: f32,
    /// Elevation above the horizon (radians)
    pitch: f32,
    distance: f32,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
}

impl OrbitCamera {
    pub fn new(params: CameraParams) -> Self {
        let pitch = params.pitch.clamp(MIN_PITCH, PITCH_LIMIT);
        let distance = params
            .distance
            .clamp(params.min_distance, params.max_distance);
        Self {
            params,
            yaw: std::f32::consts::PI,
            pitch,
            distance,
            dragging: false,
            last_cursor: None,
        }
    }

    pub fn target(&self) -> Vec3 {
        Vec3::from_array(self.params.target)
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Eye position on the orbit sphere
    pub fn eye(&self) -> Vec3 {
        let horizontal = self.distance * self.pitch.cos();
        self.target()
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.distance * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    /// Start or stop a rotate drag (left mouse button)
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
        if !dragging {
            self.last_cursor = None;
        }
    }

    /// Feed a cursor position; rotates while dragging
    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        if self.dragging {
            if let Some((last_x, last_y)) = self.last_cursor {
                self.rotate((x - last_x) as f32, (y - last_y) as f32);
            }
        }
        self.last_cursor = Some((x, y));
    }

    /// Rotate by a mouse delta in pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.params.rotate_sensitivity;
        self.pitch = (self.pitch + dy * self.params.rotate_sensitivity).clamp(MIN_PITCH, PITCH_LIMIT);
    }

    /// Zoom by scroll lines; positive moves closer
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance - lines * self.params.zoom_step)
            .clamp(self.params.min_distance, self.params.max_distance);
    }

    /// View-projection matrix and eye position for the current frame
    pub fn view_state(&self, render_config: &RenderConfig, aspect_ratio: f32) -> ViewState {
        let eye = self.eye();
        let view = Mat4::look_at_rh(eye, self.target(), Vec3::Y);
        let proj = Mat4::perspective_rh(
            render_config.fov_y,
            aspect_ratio,
            render_config.near_plane,
            render_config.far_plane,
        );
        ViewState {
            view_proj: proj * view,
            eye,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_eye_distance_and_height() {
        let camera = OrbitCamera::new(CameraParams::default());
        let offset = camera.eye() - camera.target();
        assert!((offset.length() - 20.0).abs() < 1e-4);
        // Pitch PI/4 puts the eye as high above the target as it is away horizontally
        let horizontal = Vec3::new(offset.x, 0.0, offset.z).length();
        assert!((offset.y - horizontal).abs() < 1e-4);
        // Initially behind the surface on -Z
        assert!(offset.z < 0.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = OrbitCamera::new(CameraParams::default());
        camera.zoom(1000.0);
        assert_eq!(camera.distance(), 10.0);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance(), 90.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = OrbitCamera::new(CameraParams::default());
        camera.rotate(0.0, 1.0e6);
        assert!(camera.pitch() <= PITCH_LIMIT);
        camera.rotate(0.0, -1.0e6);
        assert!(camera.pitch() >= MIN_PITCH);
        assert!(camera.eye().y > camera.target().y);
    }

    #[test]
    fn test_drag_rotates_only_while_pressed() {
        let mut camera = OrbitCamera::new(CameraParams::default());
        let yaw = camera.yaw();

        camera.cursor_moved(0.0, 0.0);
        camera.cursor_moved(100.0, 0.0);
        assert_eq!(camera.yaw(), yaw);

        camera.set_dragging(true);
        camera.cursor_moved(100.0, 0.0);
        camera.cursor_moved(200.0, 0.0);
        assert!((camera.yaw() - (yaw - 100.0 * 0.005)).abs() < 1e-5);
    }

    #[test]
    fn test_view_state_is_finite() {
        let camera = OrbitCamera::new(CameraParams::default());
        let config = RenderConfig::default();
        let state = camera.view_state(&config, config.aspect_ratio());

        assert_ne!(state.view_proj, Mat4::IDENTITY);
        assert!(state.view_proj.to_cols_array().iter().all(|v| v.is_finite()));
        // Target projects inside the view volume
        let clip = state.view_proj * camera.target().extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
