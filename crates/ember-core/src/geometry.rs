//! Ray, line, sphere and triangle math
//!
//! Every function here is total over its documented domain: degenerate input
//! falls back to a well-defined answer instead of failing. Direction vectors
//! are expected to be normalized by the caller and are never normalized here.

use glam::{Mat4, Vec3, Vec4};

/// Tolerance for determinant and parallelism checks
pub const EPSILON: f32 = 1e-6;

/// A ray in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at distance `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Create a ray from screen coordinates using an inverse view-projection matrix.
    /// `screen_x`, `screen_y` are in physical pixels with the origin at the top left.
    ///
    /// The pixel is unprojected at NDC depth 0 and 1, the near and far planes
    /// of a wgpu-style projection. The ray starts on the near plane.
    pub fn from_screen(
        screen_x: f32,
        screen_y: f32,
        viewport_width: f32,
        viewport_height: f32,
        inv_view_proj: &Mat4,
    ) -> Self {
        let ndc_x = 2.0 * screen_x / viewport_width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * screen_y / viewport_height.max(1.0);

        // wgpu clip depth runs from 0 (near) to 1 (far)
        let near = unproject(inv_view_proj, Vec4::new(ndc_x, ndc_y, 0.0, 1.0));
        let far = unproject(inv_view_proj, Vec4::new(ndc_x, ndc_y, 1.0, 1.0));

        let dir = far - near;
        let direction = if dir.length_squared() > 1e-16 {
            dir.normalize()
        } else {
            Vec3::NEG_Z
        };

        Self {
            origin: near,
            direction,
        }
    }

    /// Transform the ray by an affine matrix. The direction is transformed as a
    /// vector and left unnormalized, so `t` values stay comparable across spaces.
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction),
        }
    }
}

fn unproject(inv_view_proj: &Mat4, clip: Vec4) -> Vec3 {
    let p = *inv_view_proj * clip;
    let w = if p.w.abs() < 1e-8 { 1e-8 } else { p.w };
    p.truncate() / w
}

/// Point on the line `line_point + s * line_dir` closest to the ray.
///
/// Solves the two-line closest-approach normal equations. Near-parallel input
/// projects the ray origin onto the line instead, and a degenerate line
/// direction returns `line_point`.
pub fn closest_point_on_line(
    ray_origin: Vec3,
    ray_dir: Vec3,
    line_point: Vec3,
    line_dir: Vec3,
) -> Vec3 {
    let a = line_dir.dot(line_dir);
    if a < EPSILON {
        return line_point;
    }

    let b = line_dir.dot(ray_dir);
    let c = ray_dir.dot(ray_dir);
    let w0 = line_point - ray_origin;
    let d = line_dir.dot(w0);
    let e = ray_dir.dot(w0);

    let denom = a * c - b * b;
    if denom.abs() < EPSILON {
        let s = (ray_origin - line_point).dot(line_dir) / a;
        return line_point + line_dir * s;
    }

    let s = (b * e - c * d) / denom;
    line_point + line_dir * s
}

/// Nearest non-negative intersection distance with a sphere, if any.
pub fn intersect_ray_sphere(
    origin: Vec3,
    dir: Vec3,
    center: Vec3,
    radius_squared: f32,
) -> Option<f32> {
    let oc = origin - center;
    let a = dir.dot(dir);
    if a < EPSILON {
        return None;
    }
    let half_b = oc.dot(dir);
    let c = oc.dot(oc) - radius_squared;

    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t0 = (-half_b - sqrt_d) / a;
    let t1 = (-half_b + sqrt_d) / a;

    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

/// Möller–Trumbore ray/triangle test. Two-sided; returns the hit distance.
pub fn intersect_ray_triangle(origin: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - v0;
    let u = tvec.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = tvec.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}
