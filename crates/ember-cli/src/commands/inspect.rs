//! Scene inspection command

use super::load_store;
use crate::config::EmberConfig;
use anyhow::Result;
use ember_scene::{EntityStore, LightKind};
use glam::Vec3;
use std::path::Path;

pub fn run(scene: &Path, config: &EmberConfig) -> Result<()> {
    let mut store = load_store(scene, config)?;
    store.update_shadows();
    print!("{}", report(&store));
    Ok(())
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

/// Human-readable summary of a store whose shadows have been fitted
pub fn report(store: &EntityStore) -> String {
    let mut out = String::new();

    out.push_str(&format!("Objects: {}\n", store.entity_count()));
    for entity in store.entities() {
        out.push_str(&format!(
            "  {:<16} {:<9} pos {} rot {} scale {}",
            entity.name,
            entity.kind().to_string(),
            fmt_vec3(entity.transform.position),
            fmt_vec3(entity.transform.rotation),
            fmt_vec3(entity.transform.scale),
        ));
        if let Some(texture) = &entity.texture_path {
            out.push_str(&format!(" texture {}", texture));
        }
        out.push('\n');
    }

    out.push_str(&format!("Lights: {}\n", store.light_count()));
    for (index, light) in store.lights().iter().enumerate() {
        let placement = match light.kind() {
            LightKind::Directional => format!("dir {}", fmt_vec3(light.direction)),
            LightKind::Point => format!("pos {}", fmt_vec3(light.position)),
        };
        out.push_str(&format!(
            "  {:<16} {:<11} {} color {} intensity {:.2}\n",
            EntityStore::light_name(index),
            light.kind().to_string(),
            placement,
            fmt_vec3(light.color),
            light.intensity,
        ));
        if let Some(frustum) = light.shadow().and_then(|s| s.frustum()) {
            out.push_str(&format!(
                "    shadow: center {} half-size {:.2} eye {} far {:.1} cull height {:.2}\n",
                fmt_vec3(frustum.center),
                frustum.half_size,
                fmt_vec3(frustum.eye),
                frustum.far,
                store.shadow_cull_height(index),
            ));
        }
    }

    match store.bounds() {
        Some(bounds) => out.push_str(&format!(
            "Bounds: min {} max {}\n",
            fmt_vec3(bounds.min),
            fmt_vec3(bounds.max)
        )),
        None => out.push_str("Bounds: empty scene\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_scene::Light;

    #[test]
    fn report_lists_frustum_for_directional_lights() {
        let mut store = EntityStore::new();
        store.add_entity("Cube", "Box");
        store.add_light(Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0));
        store.add_light(Light::point(Vec3::new(0.0, 3.0, 0.0), Vec3::ONE, 1.0));
        store.update_shadows();

        let text = report(&store);
        assert!(text.contains("Objects: 1"));
        assert!(text.contains("Box"));
        assert!(text.contains("Lights: 2"));
        assert!(text.contains("Light_0"));
        assert!(text.contains("half-size 20.00"));
        assert_eq!(text.matches("shadow:").count(), 1);
        assert!(text.contains("Bounds: min"));
    }

    #[test]
    fn report_handles_empty_scene() {
        let text = report(&EntityStore::new());
        assert!(text.contains("Objects: 0"));
        assert!(text.contains("Bounds: empty scene"));
    }
}
