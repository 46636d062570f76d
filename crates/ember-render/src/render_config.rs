//! Per-frame render settings, loadable from TOML

use ember_scene::ShadowConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which pipeline entities are drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    #[default]
    Lit,
    Unlit,
}

impl ShadingMode {
    pub fn toggled(self) -> Self {
        match self {
            ShadingMode::Lit => ShadingMode::Unlit,
            ShadingMode::Unlit => ShadingMode::Lit,
        }
    }
}

/// Settings the renderer reads every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub shading: ShadingMode,
    /// WGSL file for the unlit pipeline, reloaded when it changes
    pub unlit_shader_path: Option<PathBuf>,
    pub shadows: bool,
    pub shadow_resolution: u32,
    pub shadow_min_half_size: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub show_grid: bool,
    pub show_gizmos: bool,
    /// Wireframe color of the selected entity
    pub outline_color: [f32; 3],
    pub clear_color: [f32; 3],
    pub ambient: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let shadow = ShadowConfig::default();
        Self {
            shading: ShadingMode::Lit,
            unlit_shader_path: None,
            shadows: true,
            shadow_resolution: shadow.resolution,
            shadow_min_half_size: shadow.min_half_size,
            shadow_near: shadow.near,
            shadow_far: shadow.far,
            show_grid: true,
            show_gizmos: true,
            outline_color: [1.0, 0.6, 0.0],
            clear_color: [0.12, 0.12, 0.14],
            ambient: 0.15,
        }
    }
}

impl RenderConfig {
    /// Frustum-fit settings for the entity store
    pub fn shadow_config(&self) -> ShadowConfig {
        ShadowConfig {
            resolution: self.shadow_resolution,
            min_half_size: self.shadow_min_half_size,
            near: self.shadow_near,
            far: self.shadow_far,
        }
    }

    pub fn toggle_shading(&mut self) -> ShadingMode {
        self.shading = self.shading.toggled();
        self.shading
    }

    pub fn is_lit(&self) -> bool {
        self.shading == ShadingMode::Lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shadow_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.shadow_config(), ShadowConfig::default());
        assert!(config.is_lit());
        assert!(config.shadows);
        assert_eq!(config.outline_color, [1.0, 0.6, 0.0]);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: RenderConfig = toml::from_str(
            r#"
shading = "unlit"
shadow_resolution = 1024
show_grid = false
"#,
        )
        .unwrap();
        assert_eq!(config.shading, ShadingMode::Unlit);
        assert_eq!(config.shadow_resolution, 1024);
        assert!(!config.show_grid);
        assert!(config.show_gizmos);
        assert_eq!(config.shadow_min_half_size, 20.0);
    }

    #[test]
    fn toggle_flips_between_modes() {
        let mut config = RenderConfig::default();
        assert_eq!(config.toggle_shading(), ShadingMode::Unlit);
        assert_eq!(config.toggle_shading(), ShadingMode::Lit);
    }

    #[test]
    fn shader_path_round_trips() {
        let config = RenderConfig {
            unlit_shader_path: Some(PathBuf::from("shaders/flat.wgsl")),
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        let back: RenderConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
