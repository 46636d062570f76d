//! Translate gizmo: three axis arrows drawn at the selected entity
//!
//! The gizmo has no persistent state of its own. Axes are recomputed from the
//! selected entity's position whenever they are picked or drawn.

use crate::mesh::{create_cone, create_cylinder, MeshData};
use ember_core::EntityId;
use glam::Vec3;

/// Length of each axis from the entity origin
pub const AXIS_LENGTH: f32 = 1.1;
/// Size of the arrow head
pub const ARROW_SIZE: f32 = 0.225;
pub const SHAFT_RADIUS: f32 = 0.02;
pub const ARROW_SEGMENTS: u32 = 16;
/// Color of the axis being dragged
pub const GRABBED_AXIS_COLOR: [f32; 3] = [1.0, 1.0, 0.0];

/// One of the three world axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn direction(&self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    pub fn color(&self) -> [f32; 3] {
        match self {
            Axis::X => [1.0, 0.0, 0.0],
            Axis::Y => [0.0, 1.0, 0.0],
            Axis::Z => [0.0, 0.0, 1.0],
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// An axis segment in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoAxis {
    pub axis: Axis,
    pub start: Vec3,
    pub end: Vec3,
}

impl GizmoAxis {
    pub fn direction(&self) -> Vec3 {
        self.axis.direction()
    }
}

/// The three axes rooted at `origin`
pub fn gizmo_axes(origin: Vec3, length: f32) -> [GizmoAxis; 3] {
    Axis::ALL.map(|axis| GizmoAxis {
        axis,
        start: origin,
        end: origin + axis.direction() * length,
    })
}

/// Snapshot taken when an axis is grabbed. Dragging is computed against this
/// snapshot so the gizmo moving with the entity cannot feed back into the drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisGrab {
    pub entity: EntityId,
    pub axis: Axis,
    pub start: Vec3,
    pub end: Vec3,
    /// Scalar projection of the grab point along the axis, relative to `start`
    pub initial_proj: f32,
    pub initial_position: Vec3,
}

impl AxisGrab {
    pub fn direction(&self) -> Vec3 {
        self.axis.direction()
    }
}

/// Arrow mesh for one axis: a thin cylinder shaft capped by a cone
pub fn arrow_mesh(axis: &GizmoAxis, color: [f32; 3]) -> MeshData {
    let dir = axis.direction();
    let color = [color[0], color[1], color[2], 1.0];
    let shaft_end = axis.end - dir * (ARROW_SIZE * 0.2);
    let tip = shaft_end + dir * ARROW_SIZE;

    let mut mesh = create_cylinder(axis.start, shaft_end, SHAFT_RADIUS, ARROW_SEGMENTS, color);
    mesh.append(&create_cone(shaft_end, tip, ARROW_SIZE * 0.5, ARROW_SEGMENTS, color));
    mesh
}

/// Arrow meshes for all three axes, highlighting the grabbed one
pub fn gizmo_mesh(origin: Vec3, grabbed: Option<Axis>) -> MeshData {
    let mut mesh = MeshData::default();
    for axis in gizmo_axes(origin, AXIS_LENGTH) {
        let color = if grabbed == Some(axis.axis) {
            GRABBED_AXIS_COLOR
        } else {
            axis.axis.color()
        };
        mesh.append(&arrow_mesh(&axis, color));
    }
    mesh
}
