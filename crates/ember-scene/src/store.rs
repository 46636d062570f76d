//! The entity store: every entity and light in the scene plus the selection

use crate::entity::{Entity, Light, LightKind};
use crate::mesh::MeshKind;
use crate::shadow::{cull_height, SceneBounds, ShadowConfig};
use ember_core::EntityId;
use glam::Vec3;
use std::collections::HashMap;

/// What the user currently has selected. At most one thing at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Entity(EntityId),
    Light(usize),
}

/// Owns all entities and lights. Entities keep insertion order.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
    lights: Vec<Light>,
    selection: Selection,
    next_id: u64,
    name_counters: HashMap<MeshKind, u32>,
    shadow_config: ShadowConfig,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadow_config(shadow_config: ShadowConfig) -> Self {
        Self {
            shadow_config,
            ..Self::default()
        }
    }

    pub fn shadow_config(&self) -> ShadowConfig {
        self.shadow_config
    }

    /// Apply new shadow settings to the store and every directional light
    pub fn set_shadow_config(&mut self, config: ShadowConfig) {
        self.shadow_config = config;
        for shadow in self.lights.iter_mut().filter_map(Light::shadow_mut) {
            shadow.config = config;
        }
    }

    // --- Entities ---

    /// Add an entity by type name. Unknown names create a cube.
    pub fn add_entity(&mut self, type_name: &str, name: impl Into<String>) -> EntityId {
        self.add_entity_of_kind(MeshKind::from_name(type_name), name)
    }

    pub fn add_entity_of_kind(&mut self, kind: MeshKind, name: impl Into<String>) -> EntityId {
        self.next_id += 1;
        let id = EntityId::from_raw(self.next_id);
        let name = name.into();
        self.note_object_name(&name);
        log::debug!("Added {} '{}' as {}", kind, name, id);
        self.entities.push(Entity::new(id, name, kind));
        id
    }

    /// Add an entity named `Kind_N`, with N counting up per kind
    pub fn spawn(&mut self, kind: MeshKind) -> EntityId {
        let name = self.next_object_name(kind);
        self.add_entity_of_kind(kind, name)
    }

    pub fn next_object_name(&mut self, kind: MeshKind) -> String {
        let counter = self.name_counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{}_{}", kind, counter)
    }

    /// Keep the auto-name counters ahead of any `Kind_N` name already in use
    fn note_object_name(&mut self, name: &str) {
        let Some((prefix, number)) = name.rsplit_once('_') else {
            return;
        };
        let (Some(kind), Ok(n)) = (
            MeshKind::ALL.into_iter().find(|k| k.name() == prefix),
            number.parse::<u32>(),
        ) else {
            return;
        };
        let counter = self.name_counters.entry(kind).or_insert(0);
        *counter = (*counter).max(n);
    }

    /// Remove an entity. Unknown ids are a no-op. Clears the selection if
    /// the removed entity was selected.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id() == id)?;
        if self.selection == Selection::Entity(id) {
            self.selection = Selection::None;
        }
        let entity = self.entities.remove(index);
        log::debug!("Removed entity '{}' ({})", entity.name, id);
        Some(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.entities.iter().map(Entity::position)
    }

    // --- Lights ---

    /// Add a light and return its index
    pub fn add_light(&mut self, mut light: Light) -> usize {
        if let Some(shadow) = light.shadow_mut() {
            shadow.config = self.shadow_config;
        }
        self.lights.push(light);
        self.lights.len() - 1
    }

    /// Add a default light of the given type
    pub fn add_light_of_kind(&mut self, kind: LightKind) -> usize {
        self.add_light(Light::with_shadow_config(kind, self.shadow_config))
    }

    /// Remove a light by index. A selection of a later light shifts down
    /// with it; a selection of the removed light is cleared.
    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        if index >= self.lights.len() {
            return None;
        }
        match self.selection {
            Selection::Light(i) if i == index => self.selection = Selection::None,
            Selection::Light(i) if i > index => self.selection = Selection::Light(i - 1),
            _ => {}
        }
        Some(self.lights.remove(index))
    }

    pub fn light(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Display name for a light, `Light_i` by index
    pub fn light_name(index: usize) -> String {
        format!("Light_{}", index)
    }

    // --- Selection ---

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Select an entity, deselecting any light. Returns false if the id is unknown.
    pub fn select_entity(&mut self, id: EntityId) -> bool {
        if self.entity(id).is_none() {
            return false;
        }
        self.selection = Selection::Entity(id);
        true
    }

    /// Select a light, deselecting any entity. Returns false if out of range.
    pub fn select_light(&mut self, index: usize) -> bool {
        if index >= self.lights.len() {
            return false;
        }
        self.selection = Selection::Light(index);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected_entity_id(&self) -> Option<EntityId> {
        match self.selection {
            Selection::Entity(id) => Some(id),
            _ => None,
        }
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        self.selected_entity_id().and_then(|id| self.entity(id))
    }

    pub fn selected_light_index(&self) -> Option<usize> {
        match self.selection {
            Selection::Light(i) => Some(i),
            _ => None,
        }
    }

    /// Remove whatever is selected. Returns true if something was removed.
    pub fn remove_selected(&mut self) -> bool {
        match self.selection {
            Selection::Entity(id) => self.remove_entity(id).is_some(),
            Selection::Light(i) => self.remove_light(i).is_some(),
            Selection::None => false,
        }
    }

    /// Remove every entity and light. Ids are never reused.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.lights.clear();
        self.selection = Selection::None;
        self.name_counters.clear();
    }

    // --- Shadows ---

    pub fn bounds(&self) -> Option<SceneBounds> {
        SceneBounds::from_positions(self.entity_positions())
    }

    /// Height above which fragments skip the shadow lookup for the given light
    pub fn shadow_cull_height(&self, light_index: usize) -> f32 {
        let fallback = self.lights.get(light_index).map_or(0.0, |l| l.position.y);
        cull_height(self.bounds().as_ref(), fallback)
    }

    /// Refit every directional light's shadow frustum to the current entities
    pub fn update_shadows(&mut self) {
        let positions: Vec<Vec3> = self.entity_positions().collect();
        for light in &mut self.lights {
            let (position, direction) = (light.position, light.direction);
            if let Some(shadow) = light.shadow_mut() {
                shadow.fit(positions.iter().copied(), position, direction);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_lookup() {
        let mut store = EntityStore::new();
        let a = store.add_entity("Sphere", "Ball");
        let b = store.add_entity("Teapot", "Mystery");
        assert_ne!(a, b);
        assert_eq!(store.entity(a).map(|e| e.kind()), Some(MeshKind::Sphere));
        assert_eq!(store.entity(b).map(|e| e.kind()), Some(MeshKind::Cube));
        assert_eq!(store.find_by_name("Ball").map(|e| e.id()), Some(a));
        assert_eq!(store.entity_count(), 2);
    }

    #[test]
    fn entities_keep_insertion_order() {
        let mut store = EntityStore::new();
        for name in ["a", "b", "c"] {
            store.add_entity("Cube", name);
        }
        let names: Vec<&str> = store.entities().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn spawn_names_count_per_kind() {
        let mut store = EntityStore::new();
        let a = store.spawn(MeshKind::Cube);
        let b = store.spawn(MeshKind::Cube);
        let c = store.spawn(MeshKind::Sphere);
        assert_eq!(store.entity(a).map(|e| e.name.as_str()), Some("Cube_1"));
        assert_eq!(store.entity(b).map(|e| e.name.as_str()), Some("Cube_2"));
        assert_eq!(store.entity(c).map(|e| e.name.as_str()), Some("Sphere_1"));
    }

    #[test]
    fn spawn_skips_names_already_taken() {
        let mut store = EntityStore::new();
        store.add_entity("Cube", "Cube_3");
        store.add_entity("Sphere", "Cube_7");
        store.add_entity("Plane", "Plane_x");
        store.add_entity("Cylinder", "Pyramid_2");
        let cube = store.spawn(MeshKind::Cube);
        let plane = store.spawn(MeshKind::Plane);
        let pyramid = store.spawn(MeshKind::Pyramid);
        assert_eq!(store.entity(cube).map(|e| e.name.as_str()), Some("Cube_8"));
        assert_eq!(store.entity(plane).map(|e| e.name.as_str()), Some("Plane_1"));
        assert_eq!(store.entity(pyramid).map(|e| e.name.as_str()), Some("Pyramid_3"));
    }

    #[test]
    fn removing_selected_entity_clears_selection() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        assert!(store.select_entity(id));
        assert!(store.remove_entity(id).is_some());
        assert_eq!(store.selection(), Selection::None);
        assert!(store.selected_entity().is_none());
    }

    #[test]
    fn removing_unknown_entity_is_noop() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        store.select_entity(id);
        assert!(store.remove_entity(EntityId::from_raw(999)).is_none());
        assert_eq!(store.selection(), Selection::Entity(id));
        assert_eq!(store.entity_count(), 1);
    }

    #[test]
    fn removing_other_entity_keeps_selection() {
        let mut store = EntityStore::new();
        let a = store.add_entity("Cube", "a");
        let b = store.add_entity("Cube", "b");
        store.select_entity(a);
        store.remove_entity(b);
        assert_eq!(store.selected_entity_id(), Some(a));
    }

    #[test]
    fn selection_is_exclusive() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        let light = store.add_light_of_kind(LightKind::Point);
        store.select_entity(id);
        store.select_light(light);
        assert_eq!(store.selection(), Selection::Light(light));
        assert!(store.selected_entity_id().is_none());
        store.select_entity(id);
        assert!(store.selected_light_index().is_none());
    }

    #[test]
    fn selecting_missing_things_fails() {
        let mut store = EntityStore::new();
        assert!(!store.select_entity(EntityId::from_raw(5)));
        assert!(!store.select_light(0));
        assert_eq!(store.selection(), Selection::None);
    }

    #[test]
    fn removing_light_shifts_later_selection() {
        let mut store = EntityStore::new();
        for _ in 0..3 {
            store.add_light_of_kind(LightKind::Point);
        }
        store.select_light(2);
        store.remove_light(0);
        assert_eq!(store.selection(), Selection::Light(1));
        store.remove_light(1);
        assert_eq!(store.selection(), Selection::None);
    }

    #[test]
    fn directional_lights_get_store_shadow_config() {
        let config = ShadowConfig {
            resolution: 512,
            ..ShadowConfig::default()
        };
        let mut store = EntityStore::with_shadow_config(config);
        let i = store.add_light(Light::new(LightKind::Directional));
        assert_eq!(store.light(i).and_then(|l| l.shadow()).map(|s| s.config.resolution), Some(512));
    }

    #[test]
    fn update_shadows_tracks_entity_positions() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "box");
        let light = store.add_light_of_kind(LightKind::Directional);
        store.update_shadows();
        let before = store.light(light).and_then(|l| l.shadow()).and_then(|s| s.frustum()).map(|f| f.center);
        assert_eq!(before, Some(Vec3::ZERO));

        if let Some(e) = store.entity_mut(id) {
            e.transform.position = Vec3::new(5.0, 0.0, 0.0);
        }
        store.update_shadows();
        let after = store.light(light).and_then(|l| l.shadow()).and_then(|s| s.frustum()).map(|f| f.center);
        assert_eq!(after, Some(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn clear_empties_everything_but_never_reuses_ids() {
        let mut store = EntityStore::new();
        let first = store.add_entity("Cube", "a");
        store.add_light_of_kind(LightKind::Point);
        store.select_entity(first);
        store.clear();
        assert_eq!(store.entity_count(), 0);
        assert_eq!(store.light_count(), 0);
        assert_eq!(store.selection(), Selection::None);
        let second = store.add_entity("Cube", "b");
        assert_ne!(first, second);
    }

    #[test]
    fn remove_selected_handles_both_kinds() {
        let mut store = EntityStore::new();
        let id = store.add_entity("Cube", "a");
        store.add_light_of_kind(LightKind::Point);
        store.select_entity(id);
        assert!(store.remove_selected());
        store.select_light(0);
        assert!(store.remove_selected());
        assert!(!store.remove_selected());
        assert_eq!(store.entity_count() + store.light_count(), 0);
    }
}
