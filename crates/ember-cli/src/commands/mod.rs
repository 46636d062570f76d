//! CLI command implementations

pub mod edit;
pub mod inspect;
pub mod new;
pub mod pick;
pub mod render;

use crate::config::EmberConfig;
use anyhow::{Context, Result};
use clap::Args;
use ember_render::Camera;
use ember_scene::{load_scene, EntityStore};
use glam::Vec3;
use std::path::Path;

/// Orbit camera placement shared by `pick` and `render`
#[derive(Args, Debug, Clone, Default)]
pub struct CameraArgs {
    /// Camera orbit distance
    #[arg(long)]
    pub distance: Option<f32>,

    /// Camera horizontal angle in degrees
    #[arg(long)]
    pub yaw: Option<f32>,

    /// Camera vertical angle in degrees
    #[arg(long)]
    pub pitch: Option<f32>,

    /// Camera look-at point (comma-separated x,y,z)
    #[arg(long, value_parser = parse_vec3)]
    pub target: Option<[f32; 3]>,

    /// Field of view in degrees
    #[arg(long)]
    pub fov: Option<f32>,
}

impl CameraArgs {
    pub fn build(&self, aspect: f32) -> Camera {
        let mut camera = Camera::new();
        camera.aspect = aspect;
        if let Some(d) = self.distance {
            camera.distance = d;
        }
        if let Some(y) = self.yaw {
            camera.yaw = y.to_radians();
        }
        if let Some(p) = self.pitch {
            camera.pitch = p.to_radians();
        }
        if let Some(t) = self.target {
            camera.target = Vec3::from_array(t);
        }
        if let Some(f) = self.fov {
            camera.fov = f;
        }
        camera.update_orbit();
        camera
    }
}

pub fn parse_vec3(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 comma-separated values, got {}", parts.len()));
    }
    let x: f32 = parts[0].trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y: f32 = parts[1].trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    let z: f32 = parts[2].trim().parse().map_err(|e| format!("invalid z: {}", e))?;
    Ok([x, y, z])
}

/// Load a scene into a fresh store using the configured shadow settings
pub fn load_store(path: &Path, config: &EmberConfig) -> Result<EntityStore> {
    let mut store = EntityStore::with_shadow_config(config.render.shadow_config());
    load_scene(path, &mut store)
        .with_context(|| format!("Failed to load scene {}", path.display()))?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vec3() {
        assert_eq!(parse_vec3("1, 2.5,-3").unwrap(), [1.0, 2.5, -3.0]);
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,x,3").is_err());
    }

    #[test]
    fn camera_args_override_defaults() {
        let args = CameraArgs {
            distance: Some(20.0),
            yaw: Some(0.0),
            pitch: Some(0.0),
            target: Some([0.0, 1.0, 0.0]),
            fov: None,
        };
        let camera = args.build(2.0);
        assert_eq!(camera.aspect, 2.0);
        assert!((camera.position - Vec3::new(0.0, 1.0, 20.0)).length() < 1e-4);
    }
}
