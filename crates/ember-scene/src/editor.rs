//! Editor session: the store plus the mouse interaction state around it

use crate::drag::{DragController, DragTarget};
use crate::entity::LightKind;
use crate::gizmo::Axis;
use crate::mesh::MeshKind;
use crate::picking::{pick, PickConfig, PickResult};
use crate::store::EntityStore;
use crate::{loader, saver};
use ember_core::{EntityId, Ray, Result};
use glam::Vec3;
use std::path::Path;

/// Ties picking and dragging to an entity store
#[derive(Debug, Default)]
pub struct Editor {
    pub store: EntityStore,
    pub pick_config: PickConfig,
    drag: DragController,
}

impl Editor {
    pub fn new(store: EntityStore, pick_config: PickConfig) -> Self {
        Self {
            store,
            pick_config,
            drag: DragController::new(pick_config.drag_deadzone),
        }
    }

    /// Mouse down. Grabs a gizmo axis, or selects and starts a free drag.
    pub fn mouse_down(&mut self, ray: &Ray, camera_forward: Vec3) -> PickResult {
        self.drag.release();
        let result = pick(&mut self.store, ray, &self.pick_config);
        match result {
            PickResult::Axis(grab) => self.drag.grab(grab),
            PickResult::Entity { id, .. } => {
                if let Some(position) = self.store.entity(id).map(|e| e.position()) {
                    self.drag
                        .begin_plane_drag(DragTarget::Entity(id), ray, position, camera_forward);
                }
            }
            PickResult::Light { index, .. } => {
                if let Some(position) = self.store.light(index).map(|l| l.position) {
                    self.drag
                        .begin_plane_drag(DragTarget::Light(index), ray, position, camera_forward);
                }
            }
            PickResult::Nothing => {}
        }
        result
    }

    /// Mouse move with the button held. Returns true if something moved.
    pub fn mouse_move(&mut self, ray: &Ray) -> bool {
        self.drag.apply(&mut self.store, ray)
    }

    pub fn mouse_up(&mut self) {
        self.drag.release();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn grabbed_axis(&self) -> Option<Axis> {
        self.drag.grabbed_axis()
    }

    /// Add an auto-named object at the origin and select it
    pub fn add_object(&mut self, kind: MeshKind) -> EntityId {
        let id = self.store.spawn(kind);
        self.store.select_entity(id);
        log::info!("Added {}", self.store.entity(id).map_or("object", |e| e.name.as_str()));
        id
    }

    /// Add a light above the origin and select it
    pub fn add_light(&mut self, kind: LightKind) -> usize {
        let index = self.store.add_light_of_kind(kind);
        if let Some(light) = self.store.light_mut(index) {
            light.position = Vec3::new(0.0, 5.0, 0.0);
            if kind == LightKind::Directional {
                light.direction = Vec3::new(-0.5, -1.0, -0.3);
            }
        }
        self.store.select_light(index);
        log::info!("Added {} {}", kind, EntityStore::light_name(index));
        index
    }

    pub fn delete_selected(&mut self) -> bool {
        self.drag.release();
        self.store.remove_selected()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.drag.release();
        loader::load_scene(path, &mut self.store)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        saver::save_scene(path, &self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Selection;

    fn ray_at(x: f32, y: f32) -> Ray {
        Ray::new(Vec3::new(x, y, 10.0), Vec3::NEG_Z)
    }

    #[test]
    fn click_select_then_gizmo_drag() {
        let mut editor = Editor::new(EntityStore::new(), PickConfig::default());
        let id = editor.add_object(MeshKind::Cube);
        editor.store.clear_selection();

        // First click selects the cube
        let result = editor.mouse_down(&ray_at(0.0, -0.3), Vec3::NEG_Z);
        assert!(matches!(result, PickResult::Entity { .. }));
        editor.mouse_up();

        // Second click lands on the X axis
        let result = editor.mouse_down(&ray_at(0.6, 0.02), Vec3::NEG_Z);
        assert!(matches!(result, PickResult::Axis(_)));
        assert_eq!(editor.grabbed_axis(), Some(Axis::X));
        assert!(editor.mouse_move(&ray_at(1.6, 0.4)));
        editor.mouse_up();
        assert!(!editor.is_dragging());

        let pos = editor.store.entity(id).map(|e| e.position()).unwrap_or(Vec3::NAN);
        assert!((pos - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-4, "{pos:?}");
    }

    #[test]
    fn free_drag_moves_entity_in_camera_plane() {
        let mut editor = Editor::new(EntityStore::new(), PickConfig::default());
        let id = editor.add_object(MeshKind::Sphere);
        editor.store.clear_selection();

        editor.mouse_down(&ray_at(0.0, 0.0), Vec3::NEG_Z);
        assert!(editor.mouse_move(&ray_at(3.0, 1.0)));
        let pos = editor.store.entity(id).map(|e| e.position()).unwrap_or(Vec3::NAN);
        assert!((pos - Vec3::new(3.0, 1.0, 0.0)).length() < 1e-4, "{pos:?}");
    }

    #[test]
    fn clicking_empty_space_deselects() {
        let mut editor = Editor::default();
        editor.add_object(MeshKind::Cube);
        assert!(matches!(editor.mouse_down(&ray_at(40.0, 40.0), Vec3::NEG_Z), PickResult::Nothing));
        assert_eq!(editor.store.selection(), Selection::None);
        assert!(!editor.mouse_move(&ray_at(41.0, 40.0)));
    }

    #[test]
    fn delete_selected_light() {
        let mut editor = Editor::default();
        editor.add_light(LightKind::Directional);
        assert!(editor.delete_selected());
        assert_eq!(editor.store.light_count(), 0);
        assert!(!editor.delete_selected());
    }
}
