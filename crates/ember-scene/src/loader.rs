//! Scene loading from JSON files
//!
//! Loading is tolerant: a malformed field is logged and replaced by its
//! default, and an unknown object type becomes a cube. Only input that is not
//! JSON at all is an error, and in that case the store is left untouched.

use crate::entity::{Light, LightKind};
use crate::mesh::MeshKind;
use crate::store::EntityStore;
use ember_core::{EmberError, Result, Transform};
use glam::Vec3;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a scene file, replacing the contents of the store
pub fn load_scene<P: AsRef<Path>>(path: P, store: &mut EntityStore) -> Result<()> {
    let content = fs::read_to_string(path.as_ref())?;
    load_scene_string(&content, store)?;
    log::info!(
        "Loaded {} objects and {} lights from {}",
        store.entity_count(),
        store.light_count(),
        path.as_ref().display()
    );
    Ok(())
}

struct ObjectRecord {
    name: String,
    kind: MeshKind,
    transform: Transform,
    texture_path: Option<String>,
}

/// Load a scene from a JSON string, replacing the contents of the store
pub fn load_scene_string(content: &str, store: &mut EntityStore) -> Result<()> {
    let root: Value = serde_json::from_str(content).map_err(|e| EmberError::ParseError(e.to_string()))?;
    if !root.is_object() {
        return Err(EmberError::ParseError("scene root must be a JSON object".to_string()));
    }

    let objects: Vec<ObjectRecord> = records(&root, "objects").iter().filter_map(parse_object).collect();
    let lights: Vec<Light> = records(&root, "lights").iter().filter_map(parse_light).collect();

    store.clear();
    for object in objects {
        let id = store.add_entity_of_kind(object.kind, object.name);
        if let Some(entity) = store.entity_mut(id) {
            entity.transform = object.transform;
            entity.texture_path = object.texture_path;
        }
    }
    for light in lights {
        store.add_light(light);
    }
    Ok(())
}

fn records<'a>(root: &'a Value, key: &str) -> &'a [Value] {
    match root.get(key) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            log::warn!("Scene field '{}' is not an array, ignoring it", key);
            &[]
        }
        None => &[],
    }
}

fn parse_object(value: &Value) -> Option<ObjectRecord> {
    if !value.is_object() {
        log::warn!("Skipping object record that is not a JSON object");
        return None;
    }
    let name = string_field(value, "name").unwrap_or_else(|| "Object".to_string());
    let kind = MeshKind::from_name(&string_field(value, "type").unwrap_or_else(|| "Cube".to_string()));
    let transform = Transform {
        position: vec3_field(value, "position", Vec3::ZERO),
        rotation: vec3_field(value, "rotation", Vec3::ZERO),
        scale: vec3_field(value, "scale", Vec3::ONE),
    };
    let texture_path = string_field(value, "texturePath").filter(|p| !p.is_empty());

    Some(ObjectRecord {
        name,
        kind,
        transform,
        texture_path,
    })
}

fn parse_light(value: &Value) -> Option<Light> {
    if !value.is_object() {
        log::warn!("Skipping light record that is not a JSON object");
        return None;
    }
    let kind = match string_field(value, "type") {
        Some(name) => LightKind::from_name(&name).unwrap_or_else(|| {
            log::warn!("Unknown light type '{}', using Point", name);
            LightKind::Point
        }),
        None => LightKind::Point,
    };

    let mut light = Light::new(kind);
    light.position = vec3_field(value, "position", Vec3::ZERO);
    light.direction = vec3_field(value, "direction", Vec3::NEG_Y);
    light.color = vec3_field(value, "color", Vec3::ONE);
    light.intensity = match value.get("intensity").map(|v| v.as_f64().map(|f| f as f32)) {
        None => 1.0,
        Some(Some(i)) if i > 0.0 && i.is_finite() => i,
        Some(Some(i)) => {
            log::warn!("Light intensity {} is not positive, using 1.0", i);
            1.0
        }
        Some(None) => {
            log::warn!("Light intensity is not a number, using 1.0");
            1.0
        }
    };
    Some(light)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        _ => {
            log::warn!("Field '{}' is not a string, using default", key);
            None
        }
    }
}

/// Read a `[x, y, z]` field. Missing or malformed values fall back to `default`.
fn vec3_field(value: &Value, key: &str, default: Vec3) -> Vec3 {
    let Some(field) = value.get(key) else {
        return default;
    };
    match extract_vec3(field) {
        Some(v) => Vec3::from_array(v),
        None => {
            log::warn!("Field '{}' is not a 3-number array, using default", key);
            default
        }
    }
}

fn extract_vec3(value: &Value) -> Option<[f32; 3]> {
    let arr = value.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let x = arr[0].as_f64()? as f32;
    let y = arr[1].as_f64()? as f32;
    let z = arr[2].as_f64()? as f32;
    Some([x, y, z])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saver::{save_scene, save_scene_string};
    use crate::store::Selection;

    #[test]
    fn test_load_scene_string() {
        let json = r#"{
            "objects": [
                {"name": "Ball", "type": "Sphere", "position": [1, 2, 3],
                 "rotation": [0, 45, 0], "scale": [2, 2, 2], "texturePath": "brick.png"}
            ],
            "lights": [
                {"type": "Directional", "position": [0, 10, 0], "color": [1, 0.9, 0.8], "intensity": 0.7}
            ]
        }"#;
        let mut store = EntityStore::new();
        load_scene_string(json, &mut store).unwrap();

        let ball = store.find_by_name("Ball").unwrap();
        assert_eq!(ball.kind(), MeshKind::Sphere);
        assert_eq!(ball.transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ball.transform.rotation, Vec3::new(0.0, 45.0, 0.0));
        assert_eq!(ball.texture_path.as_deref(), Some("brick.png"));

        let light = store.light(0).unwrap();
        assert_eq!(light.kind(), LightKind::Directional);
        assert!(light.shadow().is_some());
        assert_eq!(light.intensity, 0.7);
        assert_eq!(light.direction, Vec3::NEG_Y);
    }

    #[test]
    fn test_unknown_type_becomes_cube() {
        let mut store = EntityStore::new();
        load_scene_string(r#"{"objects":[{"name":"x","type":"Teapot"}]}"#, &mut store).unwrap();
        assert_eq!(store.find_by_name("x").unwrap().kind(), MeshKind::Cube);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let mut store = EntityStore::new();
        load_scene_string(r#"{"objects":[{"type":"Plane"}],"lights":[{}]}"#, &mut store).unwrap();
        let e = &store.entities()[0];
        assert_eq!(e.transform, Transform::IDENTITY);
        assert!(e.texture_path.is_none());
        let l = store.light(0).unwrap();
        assert_eq!(l.kind(), LightKind::Point);
        assert_eq!(l.color, Vec3::ONE);
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let json = r#"{"objects":[{"name":"a","type":"Cube","position":[1,2],"scale":"big"}]}"#;
        let mut store = EntityStore::new();
        load_scene_string(json, &mut store).unwrap();
        let e = store.find_by_name("a").unwrap();
        assert_eq!(e.transform.position, Vec3::ZERO);
        assert_eq!(e.transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_non_positive_intensity_falls_back() {
        let json = r#"{"lights":[
            {"type":"Point","intensity":-3.0},
            {"type":"Point","intensity":0},
            {"type":"Point","intensity":"bright"},
            {"type":"Point","intensity":2.5}
        ]}"#;
        let mut store = EntityStore::new();
        load_scene_string(json, &mut store).unwrap();
        let intensities: Vec<f32> = store.lights().iter().map(|l| l.intensity).collect();
        assert_eq!(intensities, vec![1.0, 1.0, 1.0, 2.5]);
    }

    #[test]
    fn test_spawn_after_load_skips_loaded_names() {
        let json = r#"{"objects":[
            {"name":"Cube_1","type":"Cube"},
            {"name":"Cube_4","type":"Sphere"},
            {"name":"Sphere_2","type":"Sphere"}
        ]}"#;
        let mut store = EntityStore::new();
        load_scene_string(json, &mut store).unwrap();

        let cube = store.spawn(MeshKind::Cube);
        assert_eq!(store.entity(cube).unwrap().name, "Cube_5");
        let sphere = store.spawn(MeshKind::Sphere);
        assert_eq!(store.entity(sphere).unwrap().name, "Sphere_3");
        let plane = store.spawn(MeshKind::Plane);
        assert_eq!(store.entity(plane).unwrap().name, "Plane_1");
    }

    #[test]
    fn test_load_replaces_existing_scene() {
        let mut store = EntityStore::new();
        let old = store.add_entity("Cube", "old");
        store.select_entity(old);
        store.add_light_of_kind(LightKind::Point);

        load_scene_string(r#"{"objects":[{"name":"new","type":"Sphere"}]}"#, &mut store).unwrap();
        assert!(store.find_by_name("old").is_none());
        assert_eq!(store.entity_count(), 1);
        assert_eq!(store.light_count(), 0);
        assert_eq!(store.selection(), Selection::None);
    }

    #[test]
    fn test_invalid_json_leaves_store_untouched() {
        let mut store = EntityStore::new();
        store.add_entity("Cube", "keep");
        assert!(load_scene_string("{ not json", &mut store).is_err());
        assert!(load_scene_string("[1, 2, 3]", &mut store).is_err());
        assert!(store.find_by_name("keep").is_some());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut store = EntityStore::new();
        for kind in MeshKind::ALL {
            let id = store.spawn(kind);
            if let Some(e) = store.entity_mut(id) {
                e.transform.position = Vec3::new(0.1, -2.5, 3.25);
                e.transform.rotation = Vec3::new(10.0, 20.0, 30.0);
                e.transform.scale = Vec3::new(1.0, 0.5, 2.0);
            }
        }
        if let Some(e) = store.find_by_name("Sphere_1").map(|e| e.id()) {
            if let Some(e) = store.entity_mut(e) {
                e.texture_path = Some("textures/checker.png".to_string());
            }
        }
        store.add_light(Light::directional(Vec3::new(-1.0, -1.0, 0.3), Vec3::new(1.0, 0.9, 0.8), 0.8));
        store.add_light(Light::point(Vec3::new(2.0, 3.0, 4.0), Vec3::new(0.2, 0.4, 1.0), 1.5));

        let json = save_scene_string(&store).unwrap();
        let mut loaded = EntityStore::new();
        load_scene_string(&json, &mut loaded).unwrap();

        assert_eq!(loaded.entity_count(), store.entity_count());
        for (a, b) in store.entities().iter().zip(loaded.entities()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.transform, b.transform);
            assert_eq!(a.texture_path, b.texture_path);
        }
        assert_eq!(loaded.lights(), store.lights());
    }

    #[test]
    fn test_saved_json_uses_file_field_names() {
        let mut store = EntityStore::new();
        store.add_entity("Cube", "box");
        store.add_light_of_kind(LightKind::Point);
        let value: Value = serde_json::from_str(&save_scene_string(&store).unwrap()).unwrap();
        let object = &value["objects"][0];
        assert_eq!(object["type"], "Cube");
        assert_eq!(object["texturePath"], "");
        assert_eq!(value["lights"][0]["type"], "Point");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("ember_scene_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scene.json");

        let mut store = EntityStore::new();
        store.add_entity("Pyramid", "tip");
        save_scene(&path, &store).unwrap();

        let mut loaded = EntityStore::new();
        load_scene(&path, &mut loaded).unwrap();
        assert_eq!(loaded.find_by_name("tip").map(|e| e.kind()), Some(MeshKind::Pyramid));

        assert!(load_scene(dir.join("missing.json"), &mut loaded).is_err());
        assert_eq!(loaded.entity_count(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
