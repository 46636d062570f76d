//! Mouse picking
//!
//! A click resolves in priority order: gizmo axis of the selected entity,
//! then entity meshes, then light markers. The first category with any hit
//! wins, nearest hit within it. A miss clears the selection.

use crate::gizmo::{gizmo_axes, AxisGrab, GizmoAxis};
use crate::store::EntityStore;
use ember_core::geometry::EPSILON;
use ember_core::{intersect_ray_sphere, intersect_ray_triangle, EntityId, Ray};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Picking and dragging tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickConfig {
    /// Gizmo axis length from the entity origin
    pub axis_length: f32,
    /// Half-width of the camera-facing quad around each axis
    pub axis_half_width: f32,
    /// Radius of the sphere around each light
    pub light_radius: f32,
    /// Axis drags smaller than this are ignored
    pub drag_deadzone: f32,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            axis_length: crate::gizmo::AXIS_LENGTH,
            axis_half_width: 0.12,
            light_radius: 0.5,
            drag_deadzone: 1e-4,
        }
    }
}

/// Outcome of a click
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickResult {
    /// A gizmo axis of the selected entity was grabbed
    Axis(AxisGrab),
    Entity { id: EntityId, distance: f32 },
    Light { index: usize, distance: f32 },
    Nothing,
}

/// Any vector perpendicular to `v`
fn any_perpendicular(v: Vec3) -> Vec3 {
    let helper = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    v.cross(helper).normalize_or_zero()
}

/// Corners of the quad around an axis, widened across the ray. An axis
/// seen end-on is widened along an arbitrary perpendicular instead.
fn axis_quad(axis: &GizmoAxis, ray_direction: Vec3, half_width: f32) -> [Vec3; 4] {
    let dir = axis.direction();
    let mut side = dir.cross(ray_direction);
    if side.length_squared() < EPSILON {
        side = any_perpendicular(dir);
    }
    let half = side.normalize_or_zero() * half_width;
    [
        axis.start - half,
        axis.start + half,
        axis.end + half,
        axis.end - half,
    ]
}

/// Test the gizmo axes of the selected entity. Each axis is widened into a
/// quad that faces the ray so thin axes stay clickable from any angle.
pub fn pick_gizmo_axis(store: &EntityStore, ray: &Ray, config: &PickConfig) -> Option<AxisGrab> {
    let entity = store.selected_entity()?;
    let origin = entity.position();

    let mut best: Option<(f32, AxisGrab)> = None;
    for axis in gizmo_axes(origin, config.axis_length) {
        let dir = axis.direction();
        let corners = axis_quad(&axis, ray.direction, config.axis_half_width);
        let hit = [[0, 1, 2], [0, 2, 3]]
            .iter()
            .filter_map(|[a, b, c]| {
                intersect_ray_triangle(ray.origin, ray.direction, corners[*a], corners[*b], corners[*c])
            })
            .reduce(f32::min);

        if let Some(t) = hit {
            if best.as_ref().map_or(true, |(d, _)| t < *d) {
                let point = ray.at(t);
                best = Some((
                    t,
                    AxisGrab {
                        entity: entity.id(),
                        axis: axis.axis,
                        start: axis.start,
                        end: axis.end,
                        initial_proj: (point - axis.start).dot(dir),
                        initial_position: origin,
                    },
                ));
            }
        }
    }

    best.map(|(_, grab)| grab)
}

/// Exact per-triangle entity picking. The ray is taken into each entity's
/// local space; hit distances are compared in world space.
pub fn pick_entity(store: &EntityStore, ray: &Ray) -> Option<(EntityId, f32)> {
    let mut best: Option<(EntityId, f32)> = None;

    for entity in store.entities() {
        let model = entity.model_matrix();
        if model.determinant().abs() < EPSILON {
            continue;
        }
        let local = ray.transformed(&model.inverse());

        let nearest = entity
            .mesh()
            .triangles()
            .filter_map(|[v0, v1, v2]| intersect_ray_triangle(local.origin, local.direction, v0, v1, v2))
            .reduce(f32::min);

        if let Some(t) = nearest {
            let world_hit = model.transform_point3(local.at(t));
            let distance = world_hit.distance(ray.origin);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((entity.id(), distance));
            }
        }
    }

    best
}

/// Pick the nearest light marker sphere
pub fn pick_light(store: &EntityStore, ray: &Ray, radius: f32) -> Option<(usize, f32)> {
    let radius_squared = radius * radius;
    store
        .lights()
        .iter()
        .enumerate()
        .filter_map(|(i, light)| {
            intersect_ray_sphere(ray.origin, ray.direction, light.position, radius_squared)
                .map(|t| (i, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Resolve a click and update the selection to match
pub fn pick(store: &mut EntityStore, ray: &Ray, config: &PickConfig) -> PickResult {
    if let Some(grab) = pick_gizmo_axis(store, ray, config) {
        log::debug!("Grabbed {:?} axis of {}", grab.axis, grab.entity);
        return PickResult::Axis(grab);
    }

    if let Some((id, distance)) = pick_entity(store, ray) {
        store.select_entity(id);
        return PickResult::Entity { id, distance };
    }

    if let Some((index, distance)) = pick_light(store, ray, config.light_radius) {
        store.select_light(index);
        return PickResult::Light { index, distance };
    }

    store.clear_selection();
    PickResult::Nothing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Light, LightKind};
    use crate::gizmo::Axis;
    use crate::store::Selection;

    fn ray_down_z(x: f32, y: f32) -> Ray {
        Ray::new(Vec3::new(x, y, 10.0), Vec3::NEG_Z)
    }

    #[test]
    fn pick_entity_hits_cube() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        let hit = pick_entity(&store, &ray_down_z(0.0, 0.0));
        let (picked, distance) = hit.expect("cube should be hit");
        assert_eq!(picked, id);
        assert!((distance - 9.5).abs() < 1e-4);
    }

    #[test]
    fn pick_entity_is_exact_not_bounding_box() {
        let mut store = EntityStore::new();
        store.add_entity("Sphere", "ball");
        // Inside the bounding box corner but outside the sphere
        assert!(pick_entity(&store, &ray_down_z(0.45, 0.45)).is_none());
        assert!(pick_entity(&store, &ray_down_z(0.1, 0.1)).is_some());
    }

    #[test]
    fn pick_entity_respects_transform() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        if let Some(e) = store.entity_mut(id) {
            e.transform.position = Vec3::new(5.0, 0.0, 0.0);
            e.transform.scale = Vec3::splat(2.0);
        }
        assert!(pick_entity(&store, &ray_down_z(0.0, 0.0)).is_none());
        let (_, distance) = pick_entity(&store, &ray_down_z(5.9, 0.0)).expect("scaled cube");
        assert!((distance - 9.0).abs() < 1e-4);
    }

    #[test]
    fn nearest_entity_wins() {
        let mut store = EntityStore::new();
        let far = store.add_entity("Cube", "far");
        let near = store.add_entity("Cube", "near");
        if let Some(e) = store.entity_mut(far) {
            e.transform.position = Vec3::new(0.0, 0.0, -5.0);
        }
        if let Some(e) = store.entity_mut(near) {
            e.transform.position = Vec3::new(0.0, 0.0, 3.0);
        }
        assert_eq!(pick_entity(&store, &ray_down_z(0.0, 0.0)).map(|p| p.0), Some(near));
    }

    #[test]
    fn zero_scale_entity_is_skipped() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "flat");
        if let Some(e) = store.entity_mut(id) {
            e.transform.scale = Vec3::ZERO;
        }
        assert!(pick_entity(&store, &ray_down_z(0.0, 0.0)).is_none());
    }

    #[test]
    fn pick_light_uses_marker_radius() {
        let mut store = EntityStore::new();
        store.add_light(Light::point(Vec3::new(3.0, 0.0, 0.0), Vec3::ONE, 1.0));
        assert!(pick_light(&store, &ray_down_z(3.4, 0.0), 0.5).is_some());
        assert!(pick_light(&store, &ray_down_z(3.6, 0.0), 0.5).is_none());
    }

    #[test]
    fn gizmo_axis_needs_a_selection() {
        let mut store = EntityStore::new();
        store.add_entity("Cube", "box");
        let ray = ray_down_z(0.9, 0.0);
        assert!(pick_gizmo_axis(&store, &ray, &PickConfig::default()).is_none());
    }

    #[test]
    fn gizmo_axis_is_picked_before_entity() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        store.select_entity(id);
        // Passes through the X axis quad at x = 0.3, which is also over the cube
        let ray = ray_down_z(0.3, 0.05);
        match pick(&mut store, &ray, &PickConfig::default()) {
            PickResult::Axis(grab) => {
                assert_eq!(grab.axis, Axis::X);
                assert_eq!(grab.entity, id);
                assert!((grab.initial_proj - 0.3).abs() < 1e-4);
                assert_eq!(grab.initial_position, Vec3::ZERO);
            }
            other => panic!("expected axis grab, got {other:?}"),
        }
        assert_eq!(store.selection(), Selection::Entity(id));
    }

    #[test]
    fn gizmo_axis_parallel_to_ray_falls_back() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        store.select_entity(id);
        // Looking straight down the Z axis: the Z quad is edge-on, X still wins
        let grab = pick_gizmo_axis(&store, &ray_down_z(0.3, 0.02), &PickConfig::default())
            .expect("X axis should be hit");
        assert_eq!(grab.axis, Axis::X);
        assert!((grab.initial_proj - 0.3).abs() < 1e-4);

        // Beside the X and Y quads, nothing is hit
        assert!(pick_gizmo_axis(&store, &ray_down_z(-0.3, -0.3), &PickConfig::default()).is_none());
    }

    #[test]
    fn any_perpendicular_is_unit_and_orthogonal() {
        for v in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(0.6, 0.0, 0.8), Vec3::NEG_X] {
            let p = any_perpendicular(v);
            assert!((p.length() - 1.0).abs() < 1e-5, "{v:?} -> {p:?}");
            assert!(p.dot(v).abs() < 1e-5, "{v:?} -> {p:?}");
        }
    }

    #[test]
    fn end_on_axis_gets_a_full_width_quad() {
        let axis = gizmo_axes(Vec3::ZERO, 1.0)[2];
        assert_eq!(axis.axis, Axis::Z);
        let corners = axis_quad(&axis, Vec3::NEG_Z, 0.12);
        let width = corners[1] - corners[0];
        let length = corners[3] - corners[0];
        assert!((width.length() - 0.24).abs() < 1e-5);
        assert!(width.dot(Vec3::Z).abs() < 1e-5);
        assert!((length.length() - 1.0).abs() < 1e-5);
        assert!(width.cross(length).length() > 0.2);
    }

    #[test]
    fn entity_beats_light() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        store.add_light(Light::point(Vec3::new(0.0, 0.0, 3.0), Vec3::ONE, 1.0));
        let result = pick(&mut store, &ray_down_z(0.0, 0.0), &PickConfig::default());
        assert!(matches!(result, PickResult::Entity { id: picked, .. } if picked == id));
    }

    #[test]
    fn light_click_selects_light_and_deselects_entity() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        store.select_entity(id);
        let light = store.add_light_of_kind(LightKind::Point);
        if let Some(l) = store.light_mut(light) {
            l.position = Vec3::new(10.0, 10.0, 0.0);
        }
        let result = pick(&mut store, &ray_down_z(10.0, 10.0), &PickConfig::default());
        assert!(matches!(result, PickResult::Light { index, .. } if index == light));
        assert_eq!(store.selection(), Selection::Light(light));
    }

    #[test]
    fn miss_clears_selection() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        store.select_entity(id);
        let result = pick(&mut store, &ray_down_z(50.0, 50.0), &PickConfig::default());
        assert_eq!(result, PickResult::Nothing);
        assert_eq!(store.selection(), Selection::None);
    }
}
