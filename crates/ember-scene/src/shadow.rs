//! Scene-fitted shadow frustums for directional lights
//!
//! The frustum is recomputed from the current entity positions every frame.
//! Bounds come from positions only, not mesh extents, so very large meshes
//! near the edge of the scene can be clipped.

use glam::{Mat4, Vec3};

/// Default shadow map resolution
pub const DEFAULT_SHADOW_RESOLUTION: u32 = 2048;

/// Growth factor applied to the largest scene dimension
pub const EXTENT_FIT_FACTOR: f32 = 0.6;

/// Height added above the highest entity for the shadow cull plane
pub const CULL_HEIGHT_MARGIN: f32 = 2.0;

/// Shadow settings shared by all directional lights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowConfig {
    pub resolution: u32,
    /// Frustum half-size never shrinks below this
    pub min_half_size: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_SHADOW_RESOLUTION,
            min_half_size: 20.0,
            near: 1.0,
            far: 60.0,
        }
    }
}

/// Axis-aligned bounds over entity positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SceneBounds {
    /// Bounds of a set of points, or `None` if there are none
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Half the diagonal: distance from the center to any corner
    pub fn radius(&self) -> f32 {
        self.size().length() * 0.5
    }
}

/// Height above which fragments skip shadow lookups
pub fn cull_height(bounds: Option<&SceneBounds>, fallback_y: f32) -> f32 {
    bounds.map_or(fallback_y, |b| b.max.y) + CULL_HEIGHT_MARGIN
}

/// Orthographic light camera fitted to the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrustum {
    pub center: Vec3,
    pub half_size: f32,
    pub eye: Vec3,
    pub near: f32,
    pub far: f32,
    /// `projection * view`
    pub light_space: Mat4,
}

/// Fit an orthographic frustum around the given positions.
///
/// With no positions the frustum centers on `fallback_center` (the light's
/// own position). Near and far come from the config; far only grows when the
/// eye distance plus the bounds radius exceeds it.
pub fn fit_shadow_frustum(
    positions: impl IntoIterator<Item = Vec3>,
    fallback_center: Vec3,
    light_direction: Vec3,
    config: &ShadowConfig,
) -> ShadowFrustum {
    let bounds = SceneBounds::from_positions(positions);
    let (center, max_dimension, radius) = match &bounds {
        Some(b) => (b.center(), b.max_dimension(), b.radius()),
        None => (fallback_center, 0.0, 0.0),
    };

    let half_size = config.min_half_size.max(max_dimension * EXTENT_FIT_FACTOR);

    let mut dir = light_direction.normalize_or_zero();
    if dir == Vec3::ZERO {
        dir = Vec3::NEG_Y;
    }
    let eye = center - dir * (2.0 * half_size);

    // A light pointing straight up or down makes +Y a degenerate up vector
    let up = if dir.dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };

    let near = config.near;
    // Configured far, pushed out only when the far side of the scene lies beyond it
    let far = config.far.max(2.0 * half_size + radius);
    let view = Mat4::look_at_rh(eye, center, up);
    let projection = Mat4::orthographic_rh(-half_size, half_size, -half_size, half_size, near, far);

    ShadowFrustum {
        center,
        half_size,
        eye,
        near,
        far,
        light_space: projection * view,
    }
}

/// Shadow state owned by a directional light
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub config: ShadowConfig,
    frustum: Option<ShadowFrustum>,
}

impl Shadow {
    pub fn new(config: ShadowConfig) -> Self {
        Self {
            config,
            frustum: None,
        }
    }

    /// Refit against the current scene and store the result
    pub fn fit(
        &mut self,
        positions: impl IntoIterator<Item = Vec3>,
        light_position: Vec3,
        light_direction: Vec3,
    ) -> &ShadowFrustum {
        self.frustum.insert(fit_shadow_frustum(
            positions,
            light_position,
            light_direction,
            &self.config,
        ))
    }

    /// The most recent fit, if the light has been fitted since creation
    pub fn frustum(&self) -> Option<&ShadowFrustum> {
        self.frustum.as_ref()
    }

    pub fn light_space_matrix(&self) -> Mat4 {
        self.frustum.map_or(Mat4::IDENTITY, |f| f.light_space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn empty_scene_centers_on_light_position() {
        let config = ShadowConfig::default();
        let light_pos = Vec3::new(10.0, 10.0, 10.0);
        let f = fit_shadow_frustum(std::iter::empty(), light_pos, Vec3::new(-1.0, -1.0, -1.0), &config);
        assert_eq!(f.center, light_pos);
        assert_eq!(f.half_size, config.min_half_size);
    }

    #[test]
    fn small_scene_keeps_minimum_half_size() {
        let config = ShadowConfig::default();
        let positions = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 0.0)];
        let f = fit_shadow_frustum(positions, Vec3::ZERO, Vec3::NEG_Y, &config);
        assert_eq!(f.half_size, 20.0);
        assert!((f.center - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn large_scene_grows_frustum_and_places_eye_at_twice_half_size() {
        let config = ShadowConfig::default();
        let e = 50.0;
        let positions = [Vec3::new(-e, -e, -e), Vec3::new(e, e, e), Vec3::new(3.0, 0.0, 0.0)];
        let dir = Vec3::new(1.0, -2.0, 0.5);
        let f = fit_shadow_frustum(positions, Vec3::ZERO, dir, &config);

        assert!(f.half_size >= 0.6 * e);
        assert!((f.half_size - 0.6 * 2.0 * e).abs() < 1e-4);
        let distance = (f.eye - f.center).length();
        assert!((distance - 2.0 * f.half_size).abs() < 1e-3);
        // Eye sits opposite the light direction
        assert!((f.eye - f.center).normalize().dot(dir.normalize()) < -0.999);
    }

    #[test]
    fn scene_corners_land_inside_light_clip_space() {
        let config = ShadowConfig::default();
        let e = 40.0;
        let positions = [Vec3::splat(-e), Vec3::splat(e)];
        let f = fit_shadow_frustum(positions, Vec3::ZERO, Vec3::new(-1.0, -1.0, -1.0), &config);
        for p in positions {
            let clip = f.light_space * Vec4::new(p.x, p.y, p.z, 1.0);
            assert!(clip.x.abs() <= 1.0 + 1e-4, "{clip:?}");
            assert!(clip.y.abs() <= 1.0 + 1e-4, "{clip:?}");
            assert!((0.0..=1.0).contains(&clip.z), "{clip:?}");
        }
    }

    #[test]
    fn configured_far_is_kept_for_small_scenes() {
        let config = ShadowConfig::default();
        let f = fit_shadow_frustum([Vec3::ZERO, Vec3::ONE], Vec3::ZERO, Vec3::NEG_Y, &config);
        assert_eq!(f.near, config.near);
        assert_eq!(f.far, config.far);

        let empty = fit_shadow_frustum(std::iter::empty(), Vec3::ZERO, Vec3::NEG_Y, &config);
        assert_eq!(empty.far, config.far);
    }

    #[test]
    fn far_grows_to_cover_large_scenes() {
        let config = ShadowConfig::default();
        let e = 40.0;
        let bounds = SceneBounds::from_positions([Vec3::splat(-e), Vec3::splat(e)]).unwrap();
        let f = fit_shadow_frustum([Vec3::splat(-e), Vec3::splat(e)], Vec3::ZERO, Vec3::NEG_Y, &config);
        assert!(f.far > config.far);
        assert!((f.far - (2.0 * f.half_size + bounds.radius())).abs() < 1e-3);
    }

    #[test]
    fn straight_down_light_is_well_formed() {
        let f = fit_shadow_frustum([Vec3::ZERO], Vec3::ZERO, Vec3::NEG_Y, &ShadowConfig::default());
        assert!(f.light_space.is_finite());
        assert!((f.eye - Vec3::new(0.0, 40.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn cull_height_adds_margin() {
        let bounds = SceneBounds::from_positions([Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO]);
        assert_eq!(cull_height(bounds.as_ref(), 100.0), 3.0 + CULL_HEIGHT_MARGIN);
        assert_eq!(cull_height(None, 7.0), 7.0 + CULL_HEIGHT_MARGIN);
    }

    #[test]
    fn shadow_keeps_last_fit() {
        let mut shadow = Shadow::new(ShadowConfig::default());
        assert!(shadow.frustum().is_none());
        assert_eq!(shadow.light_space_matrix(), Mat4::IDENTITY);
        let lsm = shadow.fit([Vec3::ONE], Vec3::ZERO, Vec3::NEG_Y).light_space;
        assert_eq!(shadow.light_space_matrix(), lsm);
    }
}
