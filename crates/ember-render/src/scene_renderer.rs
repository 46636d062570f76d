//! Scene renderer - draws an entity store with shadows, outline and gizmos

use crate::camera::Camera;
use crate::context::RenderContext;
use crate::gpu_mesh::{GpuMesh, MeshCache};
use crate::pipeline::{
    light_overflow, LightUniforms, MaterialUniforms, RenderPipeline, TransformUniforms,
    MAX_SHADOW_MAPS,
};
use crate::primitives::{create_grid_mesh, create_light_marker, Mesh, SELECTED_MARKER_SCALE};
use crate::render_config::{RenderConfig, ShadingMode};
use crate::shader_cache::ShaderCache;
use crate::shadow::ShadowPass;
use crate::texture_cache::{GpuTexture, TextureCache};
use ember_scene::gizmo::gizmo_mesh;
use ember_scene::{Axis, EntityStore, LightKind};
use glam::{Mat4, Vec3};
use std::path::PathBuf;
use wgpu::util::DeviceExt;

/// Lines either side of the origin in the ground grid
const GRID_HALF_CELLS: i32 = 10;
const GRID_SPACING: f32 = 1.0;
const GRID_COLOR: [f32; 4] = [0.35, 0.35, 0.38, 1.0];

/// Which pipeline a draw goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineKind {
    Lit,
    Unlit,
    Line,
    Outline,
    Overlay,
}

/// Which mesh a draw reads
#[derive(Debug, Clone, Copy)]
enum MeshSource {
    Entity(ember_core::EntityId),
    Grid,
    LightMarker,
    Gizmo,
}

/// A single draw call with its own uniform buffers
struct DrawCall {
    kind: PipelineKind,
    mesh: MeshSource,
    /// Draw the edge index buffer instead of triangles
    wireframe: bool,
    _transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    _material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
}

/// Renders an `EntityStore` into a color + depth target
pub struct SceneRenderer {
    pipeline: RenderPipeline,
    shadow_pass: ShadowPass,
    mesh_cache: MeshCache,
    texture_cache: TextureCache,
    shader_cache: ShaderCache,
    grid: GpuMesh,
    light_marker: GpuMesh,
    config: RenderConfig,
    /// Last reported light overflow, so the warning is logged once per change
    last_overflow: (usize, usize),
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        config: RenderConfig,
    ) -> Self {
        let mut renderer = Self {
            pipeline: RenderPipeline::new(device, format),
            shadow_pass: ShadowPass::new(device, config.shadow_resolution),
            mesh_cache: MeshCache::new(),
            texture_cache: TextureCache::new(device, queue),
            shader_cache: ShaderCache::builtin(),
            grid: GpuMesh::upload(
                device,
                "Grid",
                &create_grid_mesh(GRID_HALF_CELLS, GRID_SPACING, GRID_COLOR),
            ),
            light_marker: GpuMesh::upload(device, "Light Marker", &create_light_marker()),
            config: RenderConfig::default(),
            last_overflow: (0, 0),
        };
        renderer.set_config(device, config);
        renderer
    }

    /// Create a renderer for a window surface
    pub fn for_context(context: &RenderContext, config: RenderConfig) -> Self {
        Self::new(&context.device, &context.queue, context.config.format, config)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replace the render settings. Resizes shadow maps and reloads the unlit
    /// shader as needed.
    pub fn set_config(&mut self, device: &wgpu::Device, config: RenderConfig) {
        self.shadow_pass.set_resolution(config.shadow_resolution);

        if config.unlit_shader_path != self.shader_cache.path().map(PathBuf::from) {
            self.shader_cache = match &config.unlit_shader_path {
                Some(path) => ShaderCache::from_path(path),
                None => ShaderCache::builtin(),
            };
            self.apply_unlit_shader(device);
        }

        self.config = config;
    }

    /// Flip between lit and unlit shading
    pub fn toggle_shading(&mut self) -> ShadingMode {
        let mode = self.config.toggle_shading();
        log::info!("Shading: {:?}", mode);
        mode
    }

    /// Relative texture paths resolve against this directory
    pub fn set_texture_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.texture_cache.set_base_dir(dir);
    }

    pub fn mesh_cache(&self) -> &MeshCache {
        &self.mesh_cache
    }

    fn apply_unlit_shader(&mut self, device: &wgpu::Device) {
        if let Err(e) = self.pipeline.rebuild_unlit(device, self.shader_cache.source()) {
            log::error!("Unlit shader rejected, keeping previous pipeline: {}", e);
        }
    }

    /// Render to the window surface
    pub fn render(
        &mut self,
        context: &RenderContext,
        camera: &Camera,
        store: &mut EntityStore,
        grabbed: Option<Axis>,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to(
            &context.device,
            &context.queue,
            &context.depth.view,
            &view,
            camera,
            store,
            grabbed,
        );
        output.present();
        Ok(())
    }

    /// Render one frame: shadow maps first, then the main pass
    #[allow(clippy::too_many_arguments)]
    pub fn render_to(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        depth_view: &wgpu::TextureView,
        target_view: &wgpu::TextureView,
        camera: &Camera,
        store: &mut EntityStore,
        grabbed: Option<Axis>,
    ) {
        if self.shader_cache.refresh() {
            self.apply_unlit_shader(device);
        }

        let shadow_config = self.config.shadow_config();
        if store.shadow_config() != shadow_config {
            store.set_shadow_config(shadow_config);
        }
        store.update_shadows();

        self.mesh_cache.sync(device, store);
        for path in store.entities().iter().filter_map(|e| e.texture_path.as_deref()) {
            self.texture_cache.ensure_loaded(device, queue, path);
        }

        let overflow = light_overflow(store);
        if overflow != self.last_overflow {
            if overflow != (0, 0) {
                log::warn!(
                    "Too many lights: skipping {} directional and {} point lights",
                    overflow.0,
                    overflow.1
                );
            }
            self.last_overflow = overflow;
        }

        let shadow_ready = self.render_shadows(device, queue, store);
        let light_uniforms = LightUniforms::from_store(store, &shadow_ready, self.config.ambient);
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Uniform Buffer"),
            contents: bytemuck::cast_slice(&[light_uniforms]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let light_bind_group = self.create_light_bind(device, &light_buffer);

        let gizmo = self.gizmo_for_selection(device, store, grabbed);
        let draws = self.build_draws(device, camera, store, gizmo.is_some());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Encoder"),
        });

        {
            let [r, g, b] = self.config.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(2, &light_bind_group, &[]);

            let mut current = None;
            for draw in &draws {
                let mesh = match draw.mesh {
                    MeshSource::Entity(id) => match self.mesh_cache.get(id) {
                        Some(mesh) => mesh,
                        None => continue,
                    },
                    MeshSource::Grid => &self.grid,
                    MeshSource::LightMarker => &self.light_marker,
                    MeshSource::Gizmo => match &gizmo {
                        Some(mesh) => mesh,
                        None => continue,
                    },
                };

                if current != Some(draw.kind) {
                    pass.set_pipeline(self.pipeline_for(draw.kind));
                    current = Some(draw.kind);
                }
                pass.set_bind_group(0, &draw.transform_bind_group, &[]);
                pass.set_bind_group(1, &draw.material_bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                if draw.wireframe {
                    pass.set_index_buffer(mesh.wire_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.wire_index_count, 0, 0..1);
                } else {
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    // --- Shadows ---

    /// Render one depth map per packed directional light. Returns which slots
    /// hold valid depth this frame.
    fn render_shadows(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        store: &EntityStore,
    ) -> [bool; MAX_SHADOW_MAPS] {
        let mut ready = [false; MAX_SHADOW_MAPS];
        let active = shadow_slot_count(&self.config, store);
        self.shadow_pass.release_from(active);
        if active == 0 {
            return ready;
        }

        let directional = store
            .lights()
            .iter()
            .filter(|l| l.kind() == LightKind::Directional)
            .take(active);

        for (slot, light) in directional.enumerate() {
            let Some(frustum) = light.shadow().and_then(|s| s.frustum()) else {
                continue;
            };
            if !self.shadow_pass.ensure_target(device, slot) {
                continue;
            }

            let draws = store.entities().iter().filter_map(|entity| {
                self.mesh_cache
                    .get(entity.id())
                    .map(|mesh| (mesh, entity.model_matrix()))
            });
            self.shadow_pass
                .render_slot(device, queue, slot, frustum.light_space, draws);
            ready[slot] = true;
        }

        ready
    }

    /// Slots currently holding a shadow depth target
    pub fn live_shadow_targets(&self) -> [bool; MAX_SHADOW_MAPS] {
        self.shadow_pass.live_targets()
    }

    fn create_light_bind(&self, device: &wgpu::Device, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.pipeline.light_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.shadow_pass.view(0)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(self.shadow_pass.view(1)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(self.shadow_pass.view(2)),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(self.shadow_pass.view(3)),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.shadow_pass.sampler),
                },
            ],
            label: Some("Light Bind Group"),
        })
    }

    // --- Draw list ---

    fn gizmo_for_selection(
        &self,
        device: &wgpu::Device,
        store: &EntityStore,
        grabbed: Option<Axis>,
    ) -> Option<GpuMesh> {
        if !self.config.show_gizmos {
            return None;
        }
        let entity = store.selected_entity()?;
        let mesh = Mesh::from(&gizmo_mesh(entity.position(), grabbed));
        Some(GpuMesh::upload(device, "Gizmo", &mesh))
    }

    /// Entities, selection outline, grid, light markers, then the gizmo.
    /// Markers and gizmo use the overlay pipeline so they stay on top.
    fn build_draws(
        &self,
        device: &wgpu::Device,
        camera: &Camera,
        store: &EntityStore,
        with_gizmo: bool,
    ) -> Vec<DrawCall> {
        let view_proj = camera.view_projection_matrix();
        let camera_pos = camera.position;
        let entity_kind = match self.config.shading {
            ShadingMode::Lit => PipelineKind::Lit,
            ShadingMode::Unlit => PipelineKind::Unlit,
        };
        let mut draws = Vec::with_capacity(store.entity_count() + store.light_count() + 3);

        for entity in store.entities() {
            let (texture, has_texture) = self
                .texture_cache
                .get_or_default(entity.texture_path.as_deref());
            draws.push(self.create_draw_call(
                device,
                entity_kind,
                MeshSource::Entity(entity.id()),
                false,
                TransformUniforms::new(view_proj, entity.model_matrix(), camera_pos),
                MaterialUniforms::entity(has_texture),
                texture,
            ));
        }

        if let Some(entity) = store.selected_entity() {
            let [r, g, b] = self.config.outline_color;
            draws.push(self.create_draw_call(
                device,
                PipelineKind::Outline,
                MeshSource::Entity(entity.id()),
                true,
                TransformUniforms::new(view_proj, entity.model_matrix(), camera_pos),
                MaterialUniforms::flat([r, g, b, 1.0]),
                &self.texture_cache.default_white,
            ));
        }

        if self.config.show_grid {
            draws.push(self.create_draw_call(
                device,
                PipelineKind::Line,
                MeshSource::Grid,
                false,
                TransformUniforms::new(view_proj, Mat4::IDENTITY, camera_pos),
                MaterialUniforms::vertex_color_unlit(),
                &self.texture_cache.default_white,
            ));
        }

        if self.config.show_gizmos {
            let selected_light = store.selected_light_index();
            for (index, light) in store.lights().iter().enumerate() {
                let selected = selected_light == Some(index);
                let (scale, color) = if selected {
                    let [r, g, b] = self.config.outline_color;
                    (SELECTED_MARKER_SCALE, [r, g, b, 1.0])
                } else {
                    let c = light.color.clamp(Vec3::ZERO, Vec3::ONE);
                    (1.0, [c.x, c.y, c.z, 1.0])
                };
                let model = Mat4::from_translation(light.position) * Mat4::from_scale(Vec3::splat(scale));
                draws.push(self.create_draw_call(
                    device,
                    PipelineKind::Overlay,
                    MeshSource::LightMarker,
                    false,
                    TransformUniforms::new(view_proj, model, camera_pos),
                    MaterialUniforms::flat(color),
                    &self.texture_cache.default_white,
                ));
            }
        }

        if with_gizmo {
            draws.push(self.create_draw_call(
                device,
                PipelineKind::Overlay,
                MeshSource::Gizmo,
                false,
                TransformUniforms::new(view_proj, Mat4::IDENTITY, camera_pos),
                MaterialUniforms::vertex_color_unlit(),
                &self.texture_cache.default_white,
            ));
        }

        draws
    }

    #[allow(clippy::too_many_arguments)]
    fn create_draw_call(
        &self,
        device: &wgpu::Device,
        kind: PipelineKind,
        mesh: MeshSource,
        wireframe: bool,
        transform: TransformUniforms,
        material: MaterialUniforms,
        texture: &GpuTexture,
    ) -> DrawCall {
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Uniform Buffer"),
            contents: bytemuck::cast_slice(&[transform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.pipeline.transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
            label: Some("Transform Bind Group"),
        });

        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform Buffer"),
            contents: bytemuck::cast_slice(&[material]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.pipeline.material_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("Material Bind Group"),
        });

        DrawCall {
            kind,
            mesh,
            wireframe,
            _transform_buffer: transform_buffer,
            transform_bind_group,
            _material_buffer: material_buffer,
            material_bind_group,
        }
    }

    fn pipeline_for(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Lit => &self.pipeline.lit,
            PipelineKind::Unlit => &self.pipeline.unlit,
            PipelineKind::Line => &self.pipeline.line,
            PipelineKind::Outline => &self.pipeline.outline,
            PipelineKind::Overlay => &self.pipeline.overlay,
        }
    }
}

/// Number of shadow slots in use: one per packed directional light, or none
/// when shadows are off or shading ignores lights
fn shadow_slot_count(config: &RenderConfig, store: &EntityStore) -> usize {
    if !config.shadows || !config.is_lit() {
        return 0;
    }
    store
        .lights()
        .iter()
        .filter(|l| l.kind() == LightKind::Directional)
        .take(MAX_SHADOW_MAPS)
        .count()
}
