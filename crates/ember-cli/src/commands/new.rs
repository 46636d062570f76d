//! Starter scene command

use anyhow::{Context, Result};
use ember_scene::{save_scene, EntityStore, Light, MeshKind};
use glam::Vec3;
use std::path::Path;

pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let store = starter_scene();
    save_scene(path, &store).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created scene: {}", path.display());
    println!(
        "  {} objects, {} lights",
        store.entity_count(),
        store.light_count()
    );
    println!();
    println!("Next steps:");
    println!("  ember inspect {}", path.display());
    println!("  ember edit {} --watch", path.display());

    Ok(())
}

/// Ground plane, a cube and a sphere under one directional and one point light
pub fn starter_scene() -> EntityStore {
    let mut store = EntityStore::new();

    let ground = store.add_entity_of_kind(MeshKind::Plane, "Ground");
    let cube = store.spawn(MeshKind::Cube);
    let sphere = store.spawn(MeshKind::Sphere);

    if let Some(entity) = store.entity_mut(ground) {
        entity.transform.scale = Vec3::new(10.0, 1.0, 10.0);
    }
    if let Some(entity) = store.entity_mut(cube) {
        entity.transform.position = Vec3::new(-1.5, 0.5, 0.0);
        entity.transform.rotation = Vec3::new(0.0, 30.0, 0.0);
    }
    if let Some(entity) = store.entity_mut(sphere) {
        entity.transform.position = Vec3::new(1.5, 1.0, 0.5);
    }

    store.add_light(Light::directional(
        Vec3::new(-0.5, -1.0, -0.3),
        Vec3::new(1.0, 0.97, 0.9),
        0.9,
    ));
    store.add_light(Light::point(
        Vec3::new(2.0, 3.0, 2.0),
        Vec3::new(1.0, 0.8, 0.6),
        1.0,
    ));

    store
}
