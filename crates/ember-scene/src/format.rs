//! JSON scene file format
//!
//! ```json
//! {
//!   "objects": [{ "name": "Cube_1", "type": "Cube", "position": [0, 0, 0],
//!                 "rotation": [0, 0, 0], "scale": [1, 1, 1], "texturePath": "" }],
//!   "lights":  [{ "type": "Directional", "position": [0, 5, 0],
//!                 "direction": [0, -1, 0], "color": [1, 1, 1], "intensity": 1.0 }]
//! }
//! ```

use serde::Serialize;

/// Top-level scene file
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneFile {
    pub objects: Vec<ObjectDef>,
    pub lights: Vec<LightDef>,
}

/// One entity record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: [f32; 3],
    /// Euler angles in degrees
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    /// Empty when the object has no texture
    pub texture_path: String,
}

/// One light record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightDef {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl SceneFile {
    pub fn new() -> Self {
        Self::default()
    }
}
