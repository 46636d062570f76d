//! Ember Core - Foundational types for the Ember scene editor
//!
//! This crate provides the pieces every other Ember crate builds on:
//! - Geometry primitives (closest point between lines, ray/sphere, ray/triangle)
//! - `Ray` construction from screen coordinates
//! - `Transform` with Euler-degree rotation
//! - `EntityId` - Stable entity handles
//! - Error types and Result alias

mod error;
pub mod geometry;
mod id;
mod transform;

pub use error::{EmberError, Result};
pub use geometry::{closest_point_on_line, intersect_ray_sphere, intersect_ray_triangle, Ray};
pub use id::EntityId;
pub use transform::Transform;

/// Re-exported so downstream crates agree on one math library version
pub use glam::{Mat4, Vec3, Vec4};
