//! Shadow mapping for directional lights
//!
//! Each directional light slot renders into its own depth texture from the
//! light's scene-fitted orthographic frustum. The main shader samples each
//! slot through its own binding.

use crate::context::RenderError;
use crate::gpu_mesh::GpuMesh;
use crate::pipeline::MAX_SHADOW_MAPS;
use crate::primitives::Vertex;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Uniform data for a single shadow draw call
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ShadowDrawUniforms {
    pub light_view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

/// A depth texture one directional light renders into
pub struct ShadowTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub resolution: u32,
}

impl ShadowTarget {
    fn create(device: &wgpu::Device, resolution: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            resolution,
        }
    }

    /// Create a shadow target, checking that the device accepted it
    pub fn new(device: &wgpu::Device, resolution: u32, label: &str) -> Result<Self, RenderError> {
        let max = device.limits().max_texture_dimension_2d;
        if resolution == 0 || resolution > max {
            return Err(RenderError::IncompleteShadowTarget(format!(
                "resolution {} outside 1..={}",
                resolution, max
            )));
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let target = Self::create(device, resolution, label);
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(error) => Err(RenderError::IncompleteShadowTarget(error.to_string())),
            None => Ok(target),
        }
    }
}

/// The shadow mapping system
pub struct ShadowPass {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Comparison sampler for PCF
    pub sampler: wgpu::Sampler,
    pub resolution: u32,
    targets: [Option<ShadowTarget>; MAX_SHADOW_MAPS],
    failed: [bool; MAX_SHADOW_MAPS],
    /// Bound to slots without a usable target
    placeholder: ShadowTarget,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shadow_shader.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("Shadow Draw Bind Group Layout"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Depth Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_shadow"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                // Slope-scaled bias against shadow acne
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            compare: Some(wgpu::CompareFunction::LessEqual),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            resolution,
            targets: Default::default(),
            failed: [false; MAX_SHADOW_MAPS],
            placeholder: ShadowTarget::create(device, 1, "Shadow Placeholder"),
        }
    }

    /// Change the resolution. Targets are recreated on next use.
    pub fn set_resolution(&mut self, resolution: u32) {
        if resolution != self.resolution {
            self.resolution = resolution;
            self.targets = Default::default();
            self.failed = [false; MAX_SHADOW_MAPS];
        }
    }

    /// Drop the targets of slots no light occupies any more. `active` is the
    /// number of packed directional lights casting shadows this frame.
    pub fn release_from(&mut self, active: usize) {
        let released = release_slots(&mut self.targets, &mut self.failed, active);
        if released > 0 {
            log::debug!("Released {} shadow map(s) above slot {}", released, active);
        }
    }

    /// Which slots currently hold a depth target
    pub fn live_targets(&self) -> [bool; MAX_SHADOW_MAPS] {
        std::array::from_fn(|slot| self.targets[slot].is_some())
    }

    /// Make sure the slot has a complete target. Returns false if the slot
    /// must be skipped this frame; the failure is logged once.
    pub fn ensure_target(&mut self, device: &wgpu::Device, slot: usize) -> bool {
        if slot >= MAX_SHADOW_MAPS || self.failed[slot] {
            return false;
        }
        if self.targets[slot].is_some() {
            return true;
        }
        match ShadowTarget::new(device, self.resolution, &format!("Shadow Map {}", slot)) {
            Ok(target) => {
                log::debug!("Created {}x{} shadow map for slot {}", self.resolution, self.resolution, slot);
                self.targets[slot] = Some(target);
                true
            }
            Err(e) => {
                log::error!("Shadow map {} skipped: {}", slot, e);
                self.failed[slot] = true;
                false
            }
        }
    }

    /// View to bind for a slot: its target, or the placeholder
    pub fn view(&self, slot: usize) -> &wgpu::TextureView {
        self.targets
            .get(slot)
            .and_then(Option::as_ref)
            .map_or(&self.placeholder.view, |t| &t.view)
    }

    /// Render depth for one slot. Runs in its own encoder and is submitted
    /// before the main pass reads it.
    pub fn render_slot<'a>(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: usize,
        light_space: Mat4,
        draws: impl IntoIterator<Item = (&'a GpuMesh, Mat4)>,
    ) {
        let Some(target) = self.targets.get(slot).and_then(Option::as_ref) else {
            return;
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(&format!("Shadow {} Encoder", slot)),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!("Shadow {} Pass", slot)),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);

            for (mesh, model) in draws {
                let uniforms = ShadowDrawUniforms {
                    light_view_proj: light_space.to_cols_array_2d(),
                    model: model.to_cols_array_2d(),
                };
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Shadow Draw Uniform"),
                    contents: bytemuck::cast_slice(&[uniforms]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                    label: Some("Shadow Draw Bind Group"),
                });

                pass.set_bind_group(0, &bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Empty every slot at or above `active`, clearing its failure mark so a
/// light that later takes the slot retries. Returns how many were dropped.
fn release_slots<T>(slots: &mut [Option<T>], failed: &mut [bool], active: usize) -> usize {
    let mut released = 0;
    for (slot, flag) in slots.iter_mut().zip(failed.iter_mut()).skip(active) {
        if slot.take().is_some() {
            released += 1;
        }
        *flag = false;
    }
    released
}
