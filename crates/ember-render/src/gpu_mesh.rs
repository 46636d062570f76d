//! GPU mesh cache: uploads entity meshes once and drops them with their entity

use crate::primitives::Mesh;
use ember_core::EntityId;
use ember_scene::mesh::wireframe_indices;
use ember_scene::EntityStore;
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// A GPU-resident mesh with both triangle and edge index buffers
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    /// Line-list indices for the selection outline
    pub wire_index_buffer: wgpu::Buffer,
    pub wire_index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let wire_indices = wireframe_indices(&mesh.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let wire_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Wire Index Buffer", label)),
            contents: bytemuck::cast_slice(&wire_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            wire_index_buffer,
            wire_index_count: wire_indices.len() as u32,
        }
    }
}

/// Cache of entity meshes uploaded to the GPU, keyed by entity
#[derive(Default)]
pub struct MeshCache {
    meshes: HashMap<EntityId, GpuMesh>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload meshes for new entities and release those of removed ones
    pub fn sync(&mut self, device: &wgpu::Device, store: &EntityStore) {
        self.meshes.retain(|id, _| store.entity(*id).is_some());
        for entity in store.entities() {
            if !self.meshes.contains_key(&entity.id()) {
                let mesh = Mesh::from(entity.mesh());
                self.meshes
                    .insert(entity.id(), GpuMesh::upload(device, &entity.name, &mesh));
            }
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
