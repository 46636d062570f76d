//! Ember Scene - Scene model and interaction for the Ember editor
//!
//! Everything here is GPU-free:
//! - `EntityStore` - Entities, lights and the exclusive selection
//! - Procedural meshes for the five object kinds
//! - Picking (gizmo axes, exact mesh hits, light markers) and dragging
//! - Shadow frustum fitting for directional lights
//! - JSON scene loading and saving

pub mod drag;
mod editor;
pub mod entity;
pub mod format;
pub mod gizmo;
pub mod loader;
pub mod mesh;
pub mod picking;
pub mod saver;
pub mod shadow;
mod store;

pub use drag::{DragController, DragState, DragTarget};
pub use editor::Editor;
pub use entity::{Entity, Light, LightKind};
pub use format::SceneFile;
pub use gizmo::{Axis, AxisGrab};
pub use loader::{load_scene, load_scene_string};
pub use mesh::{MeshData, MeshKind, MeshVertex};
pub use picking::{pick, PickConfig, PickResult};
pub use saver::{save_scene, save_scene_string};
pub use shadow::{SceneBounds, Shadow, ShadowConfig, ShadowFrustum};
pub use store::{EntityStore, Selection};
