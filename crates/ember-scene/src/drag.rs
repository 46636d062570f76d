//! Drag controller for gizmo axes and free camera-plane moves
//!
//! Axis drags move along the grabbed axis only, measured against the grab
//! snapshot. Free drags move an entity or light within the plane through its
//! position facing the camera.

use crate::gizmo::{Axis, AxisGrab};
use crate::store::EntityStore;
use ember_core::geometry::EPSILON;
use ember_core::{closest_point_on_line, EntityId, Ray};
use glam::Vec3;

/// What a free drag moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Entity(EntityId),
    Light(usize),
}

/// Free drag snapshot: the camera-facing plane and where it was first hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneDrag {
    pub target: DragTarget,
    pub normal: Vec3,
    pub initial_hit: Vec3,
    pub initial_position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Axis grabbed, mouse not yet moved
    Grabbed(AxisGrab),
    Dragging(AxisGrab),
    Free(PlaneDrag),
}

/// New entity position for an axis drag with the given ray.
///
/// The deadzone snaps tiny deltas back to the grab position so sub-pixel
/// mouse noise cannot drift the entity.
pub fn axis_drag_position(grab: &AxisGrab, ray: &Ray, deadzone: f32) -> Vec3 {
    let dir = grab.direction();
    let point = closest_point_on_line(ray.origin, ray.direction, grab.start, dir);
    let current_proj = (point - grab.start).dot(dir);
    let delta = current_proj - grab.initial_proj;
    if delta.abs() < deadzone {
        grab.initial_position
    } else {
        grab.initial_position + dir * delta
    }
}

/// Intersect a ray with a plane, or `None` when they are parallel
fn ray_plane_intersect(ray: &Ray, point: Vec3, normal: Vec3) -> Option<Vec3> {
    let denom = ray.direction.dot(normal);
    if denom.abs() <= EPSILON {
        return None;
    }
    let t = (point - ray.origin).dot(normal) / denom;
    Some(ray.at(t))
}

/// New position for a free drag, or `None` if the ray misses the plane
pub fn plane_drag_position(drag: &PlaneDrag, ray: &Ray) -> Option<Vec3> {
    let hit = ray_plane_intersect(ray, drag.initial_hit, drag.normal)?;
    Some(drag.initial_position + (hit - drag.initial_hit))
}

/// Tracks one drag at a time between mouse down and mouse up
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
    deadzone: f32,
}

impl DragController {
    pub fn new(deadzone: f32) -> Self {
        Self {
            state: DragState::Idle,
            deadzone,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != DragState::Idle
    }

    /// The axis currently held, for highlighting
    pub fn grabbed_axis(&self) -> Option<Axis> {
        match &self.state {
            DragState::Grabbed(grab) | DragState::Dragging(grab) => Some(grab.axis),
            _ => None,
        }
    }

    pub fn grab(&mut self, grab: AxisGrab) {
        self.state = DragState::Grabbed(grab);
    }

    /// Start a free drag in the plane through `position` facing the camera
    pub fn begin_plane_drag(&mut self, target: DragTarget, ray: &Ray, position: Vec3, camera_forward: Vec3) {
        let normal = camera_forward.normalize_or_zero();
        if normal == Vec3::ZERO {
            return;
        }
        let initial_hit = ray_plane_intersect(ray, position, normal).unwrap_or(position);
        self.state = DragState::Free(PlaneDrag {
            target,
            normal,
            initial_hit,
            initial_position: position,
        });
    }

    /// Compute the dragged position for this ray without touching the scene
    pub fn update(&mut self, ray: &Ray) -> Option<(DragTarget, Vec3)> {
        match self.state {
            DragState::Idle => None,
            DragState::Grabbed(grab) | DragState::Dragging(grab) => {
                self.state = DragState::Dragging(grab);
                let position = axis_drag_position(&grab, ray, self.deadzone);
                Some((DragTarget::Entity(grab.entity), position))
            }
            DragState::Free(drag) => plane_drag_position(&drag, ray).map(|p| (drag.target, p)),
        }
    }

    /// Update and write the new position into the store. A drag whose target
    /// has disappeared is cancelled.
    pub fn apply(&mut self, store: &mut EntityStore, ray: &Ray) -> bool {
        let Some((target, position)) = self.update(ray) else {
            return false;
        };
        let slot = match target {
            DragTarget::Entity(id) => store.entity_mut(id).map(|e| &mut e.transform.position),
            DragTarget::Light(i) => store.light_mut(i).map(|l| &mut l.position),
        };
        match slot {
            Some(slot) => {
                *slot = position;
                true
            }
            None => {
                log::debug!("Drag target {:?} no longer exists", target);
                self.release();
                false
            }
        }
    }

    /// Mouse up: return to idle
    pub fn release(&mut self) {
        self.state = DragState::Idle;
    }
}
