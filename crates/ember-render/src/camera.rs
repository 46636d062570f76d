//! Orbit camera

use ember_core::Ray;
use glam::{Mat4, Vec3};

/// A perspective camera orbiting a target point
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position, derived from the orbit parameters
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Width / height
    pub aspect: f32,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle in radians
    pub yaw: f32,
    /// Vertical angle in radians
    pub pitch: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0,
            near: 0.1,
            far: 500.0,
            aspect: 16.0 / 9.0,
            distance: 12.0,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: std::f32::consts::FRAC_PI_6,
        };
        camera.update_orbit();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the position from target, distance, yaw and pitch
    pub fn update_orbit(&mut self) {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.position = self.target + offset * self.distance;
    }

    /// Rotate around the target
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        // Keep clear of the poles where the up vector degenerates
        self.pitch = (self.pitch + delta_pitch).clamp(-1.55, 1.55);
        self.update_orbit();
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(1.0, 200.0);
        self.update_orbit();
    }

    /// Move the target in the camera's screen plane
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = self.forward();
        let right = forward.cross(self.up).normalize_or_zero();
        let up = right.cross(forward);
        self.target += right * dx + up * dy;
        self.update_orbit();
    }

    /// Unit vector from the camera toward the target
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect.max(1e-3), self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn inverse_view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix().inverse()
    }

    /// World-space ray through a pixel, origin at the top left
    pub fn ray_from_screen(&self, x: f32, y: f32, width: f32, height: f32) -> Ray {
        Ray::from_screen(x, y, width, height, &self.inverse_view_projection_matrix())
    }
}
