//! Scene entities and lights

use crate::mesh::{MeshData, MeshKind};
use crate::shadow::{Shadow, ShadowConfig};
use ember_core::{EntityId, Transform};
use glam::{Mat4, Vec3};
use std::fmt;

/// A renderable object with a procedural mesh
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub name: String,
    kind: MeshKind,
    pub transform: Transform,
    /// Optional albedo texture, loaded lazily by the renderer
    pub texture_path: Option<String>,
    mesh: MeshData,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: String, kind: MeshKind) -> Self {
        Self {
            id,
            name,
            kind,
            transform: Transform::default(),
            texture_path: None,
            mesh: kind.build_mesh(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> MeshKind {
        self.kind
    }

    /// Local-space mesh. Immutable after creation.
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
}

impl LightKind {
    pub fn name(&self) -> &'static str {
        match self {
            LightKind::Directional => "Directional",
            LightKind::Point => "Point",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Directional" => Some(LightKind::Directional),
            "Point" => Some(LightKind::Point),
            _ => None,
        }
    }
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A light source. Directional lights always own a shadow; point lights never do.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    kind: LightKind,
    pub position: Vec3,
    /// Used by directional lights only
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    shadow: Option<Shadow>,
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self::with_shadow_config(kind, ShadowConfig::default())
    }

    pub fn with_shadow_config(kind: LightKind, config: ShadowConfig) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
            shadow: Self::shadow_for(kind, config),
        }
    }

    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction,
            color,
            intensity,
            ..Self::new(LightKind::Directional)
        }
    }

    pub fn point(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            ..Self::new(LightKind::Point)
        }
    }

    fn shadow_for(kind: LightKind, config: ShadowConfig) -> Option<Shadow> {
        match kind {
            LightKind::Directional => Some(Shadow::new(config)),
            LightKind::Point => None,
        }
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Change the light type, creating or dropping the shadow to match
    pub fn set_kind(&mut self, kind: LightKind) {
        if self.kind == kind {
            return;
        }
        let config = self
            .shadow
            .as_ref()
            .map_or_else(ShadowConfig::default, |s| s.config);
        self.kind = kind;
        self.shadow = Self::shadow_for(kind, config);
    }

    pub fn shadow(&self) -> Option<&Shadow> {
        self.shadow.as_ref()
    }

    pub fn shadow_mut(&mut self) -> Option<&mut Shadow> {
        self.shadow.as_mut()
    }
}
