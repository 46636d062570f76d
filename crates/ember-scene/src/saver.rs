//! Scene saving to JSON files

use crate::format::{LightDef, ObjectDef, SceneFile};
use crate::store::EntityStore;
use ember_core::{EmberError, Result};
use std::fs;
use std::path::Path;

/// Save the store to a scene file
pub fn save_scene<P: AsRef<Path>>(path: P, store: &EntityStore) -> Result<()> {
    let content = save_scene_string(store)?;
    fs::write(path.as_ref(), content)?;
    log::info!(
        "Saved {} objects and {} lights to {}",
        store.entity_count(),
        store.light_count(),
        path.as_ref().display()
    );
    Ok(())
}

/// Save the store to a pretty-printed JSON string
pub fn save_scene_string(store: &EntityStore) -> Result<String> {
    let scene_file = store_to_scene_file(store);
    serde_json::to_string_pretty(&scene_file).map_err(|e| EmberError::SerializeError(e.to_string()))
}

/// Convert the store to a SceneFile, entities in insertion order
pub fn store_to_scene_file(store: &EntityStore) -> SceneFile {
    let objects = store
        .entities()
        .iter()
        .map(|e| ObjectDef {
            name: e.name.clone(),
            kind: e.kind().name().to_string(),
            position: e.transform.position.to_array(),
            rotation: e.transform.rotation.to_array(),
            scale: e.transform.scale.to_array(),
            texture_path: e.texture_path.clone().unwrap_or_default(),
        })
        .collect();

    let lights = store
        .lights()
        .iter()
        .map(|l| LightDef {
            kind: l.kind().name().to_string(),
            position: l.position.to_array(),
            direction: l.direction.to_array(),
            color: l.color.to_array(),
            intensity: l.intensity,
        })
        .collect();

    SceneFile { objects, lights }
}
