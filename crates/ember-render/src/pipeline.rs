//! Uniform layouts and render pipeline setup

use crate::context::RenderError;
use crate::primitives::Vertex;
use bytemuck::{Pod, Zeroable};
use ember_scene::{EntityStore, LightKind};
use glam::Mat4;

/// Transform uniform buffer data (bind group 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TransformUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _pad: f32,
}

impl TransformUniforms {
    pub fn new(view_proj: Mat4, model: Mat4, camera_pos: glam::Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            _pad: 0.0,
        }
    }
}

/// Material uniform buffer data (bind group 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
    pub use_vertex_color: u32,
    pub has_texture: u32,
    /// Skip lighting in the lit shader
    pub unlit: u32,
    pub _pad: u32,
}

impl MaterialUniforms {
    /// Scene entity: vertex color, optionally textured, lit
    pub fn entity(has_texture: bool) -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            use_vertex_color: 1,
            has_texture: has_texture as u32,
            unlit: 0,
            _pad: 0,
        }
    }

    /// Single flat color, unlit
    pub fn flat(color: [f32; 4]) -> Self {
        Self {
            base_color: color,
            use_vertex_color: 0,
            has_texture: 0,
            unlit: 1,
            _pad: 0,
        }
    }

    /// Vertex colors, unlit (grid, gizmo)
    pub fn vertex_color_unlit() -> Self {
        Self {
            use_vertex_color: 1,
            ..Self::flat([1.0, 1.0, 1.0, 1.0])
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct DirectionalLight {
    /// Direction the light travels, normalized
    pub direction: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub intensity: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct PointLight {
    pub position: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Maximum counts for each light type in the uniform buffer
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_POINT_LIGHTS: usize = 16;
/// One shadow map binding per directional light slot
pub const MAX_SHADOW_MAPS: usize = MAX_DIRECTIONAL_LIGHTS;

/// Combined light uniform buffer (bind group 2)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniforms {
    pub directional_lights: [DirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    pub point_lights: [PointLight; MAX_POINT_LIGHTS],
    pub shadow_matrices: [[[f32; 4]; 4]; MAX_SHADOW_MAPS],
    /// Fragments above this height skip the shadow lookup
    pub shadow_cull_heights: [f32; 4],
    /// Non-zero when the slot's shadow map was rendered this frame
    pub shadow_flags: [u32; 4],
    pub directional_count: u32,
    pub point_count: u32,
    pub ambient: f32,
    pub _pad: u32,
}

impl LightUniforms {
    /// Pack the store's lights, split by type in store order. Lights past the
    /// per-type caps are dropped. `shadow_ready[i]` says whether the shadow map
    /// for directional slot `i` holds valid depth this frame.
    pub fn from_store(store: &EntityStore, shadow_ready: &[bool; MAX_SHADOW_MAPS], ambient: f32) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.ambient = ambient;

        let mut dir_count = 0usize;
        let mut point_count = 0usize;

        for (index, light) in store.lights().iter().enumerate() {
            match light.kind() {
                LightKind::Directional if dir_count < MAX_DIRECTIONAL_LIGHTS => {
                    let slot = dir_count;
                    uniforms.directional_lights[slot] = DirectionalLight {
                        direction: light.direction.normalize_or(glam::Vec3::NEG_Y).to_array(),
                        _pad0: 0.0,
                        color: light.color.to_array(),
                        intensity: light.intensity,
                    };
                    if let Some(shadow) = light.shadow().filter(|s| s.frustum().is_some()) {
                        uniforms.shadow_matrices[slot] = shadow.light_space_matrix().to_cols_array_2d();
                        uniforms.shadow_cull_heights[slot] = store.shadow_cull_height(index);
                        uniforms.shadow_flags[slot] = shadow_ready[slot] as u32;
                    }
                    dir_count += 1;
                }
                LightKind::Point if point_count < MAX_POINT_LIGHTS => {
                    uniforms.point_lights[point_count] = PointLight {
                        position: light.position.to_array(),
                        _pad0: 0.0,
                        color: light.color.to_array(),
                        intensity: light.intensity,
                    };
                    point_count += 1;
                }
                _ => {}
            }
        }

        uniforms.directional_count = dir_count as u32;
        uniforms.point_count = point_count as u32;
        uniforms
    }
}

/// Lights past the uniform caps: (directional, point)
pub fn light_overflow(store: &EntityStore) -> (usize, usize) {
    let directional = store
        .lights()
        .iter()
        .filter(|l| l.kind() == LightKind::Directional)
        .count();
    let point = store.light_count() - directional;
    (
        directional.saturating_sub(MAX_DIRECTIONAL_LIGHTS),
        point.saturating_sub(MAX_POINT_LIGHTS),
    )
}

/// How a pipeline treats the depth buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DepthMode {
    /// Normal opaque geometry
    Write,
    /// Lines drawn over coincident geometry
    Overlay,
    /// Drawn on top of everything
    Disabled,
}

impl DepthMode {
    fn state(self) -> wgpu::DepthStencilState {
        let (depth_write_enabled, depth_compare, bias) = match self {
            DepthMode::Write => (true, wgpu::CompareFunction::Less, wgpu::DepthBiasState::default()),
            DepthMode::Overlay => (
                false,
                wgpu::CompareFunction::LessEqual,
                wgpu::DepthBiasState {
                    constant: -2,
                    slope_scale: -1.0,
                    clamp: 0.0,
                },
            ),
            DepthMode::Disabled => (false, wgpu::CompareFunction::Always, wgpu::DepthBiasState::default()),
        };
        wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias,
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    depth: DepthMode,
) -> wgpu::RenderPipeline {
    let cull_mode = match (topology, depth) {
        (wgpu::PrimitiveTopology::TriangleList, DepthMode::Write) => Some(wgpu::Face::Back),
        _ => None,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(depth.state()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn depth_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// All scene pipelines plus the shared bind group layouts
pub struct RenderPipeline {
    /// Lit triangles with shadows
    pub lit: wgpu::RenderPipeline,
    /// Flat-shaded triangles from the hot-reloadable shader
    pub unlit: wgpu::RenderPipeline,
    /// Depth-tested lines (grid)
    pub line: wgpu::RenderPipeline,
    /// Lines drawn over coincident geometry (selection outline)
    pub outline: wgpu::RenderPipeline,
    /// Triangles drawn with depth testing off (gizmo, light markers)
    pub overlay: wgpu::RenderPipeline,
    pub layout: wgpu::PipelineLayout,
    pub transform_bind_group_layout: wgpu::BindGroupLayout,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
    pub light_bind_group_layout: wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
}

impl RenderPipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let unlit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Unlit Shader"),
            source: wgpu::ShaderSource::Wgsl(BUILTIN_UNLIT_SHADER.into()),
        });

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT)],
                label: Some("Transform Bind Group Layout"),
            });

        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("Material Bind Group Layout"),
            });

        // binding 0: LightUniforms, 1..=4: one shadow map per directional slot, 5: comparison sampler
        let light_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                    depth_texture_entry(1),
                    depth_texture_entry(2),
                    depth_texture_entry(3),
                    depth_texture_entry(4),
                    wgpu::BindGroupLayoutEntry {
                        binding: 5,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                ],
                label: Some("Light Bind Group Layout"),
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                &transform_bind_group_layout,
                &material_bind_group_layout,
                &light_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        use wgpu::PrimitiveTopology::{LineList, TriangleList};
        let lit = create_pipeline(device, "Lit Pipeline", &layout, &shader, format, TriangleList, DepthMode::Write);
        let unlit = create_pipeline(device, "Unlit Pipeline", &layout, &unlit_shader, format, TriangleList, DepthMode::Write);
        let line = create_pipeline(device, "Line Pipeline", &layout, &shader, format, LineList, DepthMode::Write);
        let outline = create_pipeline(device, "Outline Pipeline", &layout, &shader, format, LineList, DepthMode::Overlay);
        let overlay = create_pipeline(device, "Overlay Pipeline", &layout, &shader, format, TriangleList, DepthMode::Disabled);

        Self {
            lit,
            unlit,
            line,
            outline,
            overlay,
            layout,
            transform_bind_group_layout,
            material_bind_group_layout,
            light_bind_group_layout,
            format,
        }
    }

    /// Rebuild the unlit pipeline from new WGSL source. On any compile or
    /// validation error the current pipeline is kept and the error returned.
    pub fn rebuild_unlit(&mut self, device: &wgpu::Device, source: &str) -> Result<(), RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Unlit Shader (reloaded)"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = create_pipeline(
            device,
            "Unlit Pipeline",
            &self.layout,
            &shader,
            self.format,
            wgpu::PrimitiveTopology::TriangleList,
            DepthMode::Write,
        );
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderError(error.to_string()));
        }
        self.unlit = pipeline;
        Ok(())
    }
}

/// Unlit shader used when no shader file is configured or it fails to load
pub const BUILTIN_UNLIT_SHADER: &str = include_str!("unlit_shader.wgsl");

#[cfg(test)]
mod tests {
    use super::*;
    use ember_scene::{Light, LightKind};
    use glam::Vec3;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<TransformUniforms>(), 208);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 32);
        assert_eq!(std::mem::size_of::<DirectionalLight>(), 32);
        assert_eq!(std::mem::size_of::<PointLight>(), 32);
        assert_eq!(std::mem::size_of::<LightUniforms>(), 128 + 512 + 256 + 16 + 16 + 16);
    }

    #[test]
    fn lights_split_by_type_in_store_order() {
        let mut store = EntityStore::new();
        store.add_light(Light::point(Vec3::new(1.0, 0.0, 0.0), Vec3::ONE, 1.0));
        store.add_light(Light::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::ONE, 0.5));
        store.add_light(Light::point(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE, 1.0));

        let u = LightUniforms::from_store(&store, &[true; MAX_SHADOW_MAPS], 0.1);
        assert_eq!(u.directional_count, 1);
        assert_eq!(u.point_count, 2);
        assert_eq!(u.point_lights[0].position, [1.0, 0.0, 0.0]);
        assert_eq!(u.point_lights[1].position, [2.0, 0.0, 0.0]);
        assert_eq!(u.directional_lights[0].direction, [0.0, -1.0, 0.0]);
        assert_eq!(u.directional_lights[0].intensity, 0.5);
    }

    #[test]
    fn point_lights_are_capped() {
        let mut store = EntityStore::new();
        for i in 0..20 {
            store.add_light(Light::point(Vec3::splat(i as f32), Vec3::ONE, 1.0));
        }
        let u = LightUniforms::from_store(&store, &[false; MAX_SHADOW_MAPS], 0.1);
        assert_eq!(u.point_count as usize, MAX_POINT_LIGHTS);
        assert_eq!(light_overflow(&store), (0, 4));
    }

    #[test]
    fn shadow_slots_follow_directional_order() {
        let mut store = EntityStore::new();
        store.add_entity("Cube", "box");
        store.add_light_of_kind(LightKind::Directional);
        store.add_light_of_kind(LightKind::Point);
        store.add_light(Light::directional(Vec3::new(1.0, -1.0, 0.0), Vec3::ONE, 1.0));
        store.update_shadows();

        let ready = [true, false, false, false];
        let u = LightUniforms::from_store(&store, &ready, 0.1);
        assert_eq!(u.shadow_flags, [1, 0, 0, 0]);
        let second = store.light(2).and_then(|l| l.shadow()).map(|s| s.light_space_matrix());
        assert_eq!(second.map(|m| m.to_cols_array_2d()), Some(u.shadow_matrices[1]));
        assert_eq!(u.shadow_cull_heights[0], 2.0);
    }

    #[test]
    fn unfitted_shadows_are_not_flagged() {
        let mut store = EntityStore::new();
        store.add_light_of_kind(LightKind::Directional);
        let u = LightUniforms::from_store(&store, &[true; MAX_SHADOW_MAPS], 0.1);
        assert_eq!(u.shadow_flags, [0; 4]);
    }
}
