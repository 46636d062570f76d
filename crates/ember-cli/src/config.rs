//! `ember.toml` loading and command-line overrides

use anyhow::{Context, Result};
use ember_core::EmberError;
use ember_render::{RenderConfig, ShadingMode};
use ember_scene::PickConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the CLI reads from a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmberConfig {
    pub render: RenderConfig,
    pub picking: PickConfig,
}

/// Flags that override the config file
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub unlit: bool,
    pub no_shadows: bool,
    pub no_grid: bool,
}

impl EmberConfig {
    pub fn from_toml(content: &str) -> ember_core::Result<Self> {
        toml::from_str(content).map_err(|e| EmberError::ConfigError(e.to_string()))
    }

    /// Load from a file, or defaults when no path is given. A relative
    /// shader path resolves against the config file's directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        if let (Some(shader), Some(dir)) = (&config.render.unlit_shader_path, path.parent()) {
            if shader.is_relative() {
                config.render.unlit_shader_path = Some(dir.join(shader));
            }
        }

        log::info!("Loaded config {}", path.display());
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if overrides.unlit {
            self.render.shading = ShadingMode::Unlit;
        }
        if overrides.no_shadows {
            self.render.shadows = false;
        }
        if overrides.no_grid {
            self.render.show_grid = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(EmberConfig::from_toml("").unwrap(), EmberConfig::default());
    }

    #[test]
    fn sections_parse() {
        let config = EmberConfig::from_toml(
            r#"
[render]
shading = "unlit"
shadow_min_half_size = 35.0
outline_color = [0.0, 1.0, 0.0]

[picking]
light_radius = 0.75
"#,
        )
        .unwrap();
        assert_eq!(config.render.shading, ShadingMode::Unlit);
        assert_eq!(config.render.shadow_min_half_size, 35.0);
        assert_eq!(config.render.outline_color, [0.0, 1.0, 0.0]);
        assert_eq!(config.picking.light_radius, 0.75);
        assert_eq!(config.picking.axis_half_width, 0.12);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = EmberConfig::from_toml("[render\nshading = 3").unwrap_err();
        assert!(matches!(err, EmberError::ConfigError(_)));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = EmberConfig::default();
        config.apply(Overrides {
            unlit: true,
            no_shadows: true,
            no_grid: false,
        });
        assert_eq!(config.render.shading, ShadingMode::Unlit);
        assert!(!config.render.shadows);
        assert!(config.render.show_grid);
    }

    #[test]
    fn missing_file_is_error() {
        let path = std::env::temp_dir().join(format!("ember_missing_{}.toml", uuid::Uuid::new_v4()));
        assert!(EmberConfig::load(Some(&path)).is_err());
        assert_eq!(EmberConfig::load(None).unwrap(), EmberConfig::default());
    }

    #[test]
    fn shader_path_resolves_next_to_config() {
        let dir = std::env::temp_dir().join(format!("ember_config_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ember.toml");
        std::fs::write(&path, "[render]\nunlit_shader_path = \"shaders/flat.wgsl\"\n").unwrap();

        let config = EmberConfig::load(Some(&path)).unwrap();
        assert_eq!(
            config.render.unlit_shader_path,
            Some(dir.join(PathBuf::from("shaders/flat.wgsl")))
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
