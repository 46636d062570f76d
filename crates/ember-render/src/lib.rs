//! Ember Render - wgpu renderer for Ember scenes
//!
//! Draws an `EntityStore` lit or unlit, with one shadow map per directional
//! light fitted to the scene each frame, a wireframe outline on the selected
//! entity, and gizmo arrows plus light markers drawn on top.

mod camera;
mod context;
mod gpu_mesh;
mod headless;
mod pipeline;
mod primitives;
pub mod render_config;
mod scene_renderer;
pub mod shader_cache;
pub mod shadow;
mod texture_cache;

pub use camera::Camera;
pub use context::{DepthBuffer, RenderContext, RenderError};
pub use gpu_mesh::{GpuMesh, MeshCache};
pub use headless::HeadlessContext;
pub use pipeline::{
    light_overflow, DirectionalLight, LightUniforms, MaterialUniforms, PointLight, RenderPipeline,
    TransformUniforms, BUILTIN_UNLIT_SHADER, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS,
    MAX_SHADOW_MAPS,
};
pub use primitives::{create_grid_mesh, create_light_marker, Mesh, Vertex};
pub use render_config::{RenderConfig, ShadingMode};
pub use scene_renderer::SceneRenderer;
pub use shader_cache::ShaderCache;
pub use shadow::{ShadowPass, ShadowTarget};
pub use texture_cache::{GpuTexture, TextureCache};
