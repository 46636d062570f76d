//! GPU vertex layout and renderer-only meshes (grid, light markers)

use bytemuck::{Pod, Zeroable};
use ember_scene::mesh::{create_sphere, MeshData, MeshVertex};

/// A vertex with position, normal, color, and UV coordinates
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
        3 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

impl From<&MeshVertex> for Vertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            color: v.color,
            uv: v.uv,
        }
    }
}

/// A mesh with vertices and indices
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl From<&MeshData> for Mesh {
    fn from(data: &MeshData) -> Self {
        Self {
            vertices: data.vertices.iter().map(Vertex::from).collect(),
            indices: data.indices.clone(),
        }
    }
}

/// Radius of a light marker sphere
pub const LIGHT_MARKER_RADIUS: f32 = 0.15;
/// Marker scale when the light is selected
pub const SELECTED_MARKER_SCALE: f32 = 1.6;

/// Unit-colored sphere used for light markers; tinted per light via the material
pub fn create_light_marker() -> Mesh {
    Mesh::from(&create_sphere(LIGHT_MARKER_RADIUS, 12, 8, [1.0, 1.0, 1.0, 1.0]))
}

/// Line-list grid on the XZ plane, `half_cells` lines either side of the origin
pub fn create_grid_mesh(half_cells: i32, spacing: f32, color: [f32; 4]) -> Mesh {
    let mut vertices = Vec::new();
    let extent = half_cells as f32 * spacing;

    for i in -half_cells..=half_cells {
        let offset = i as f32 * spacing;
        for (a, b) in [
            ([offset, 0.0, -extent], [offset, 0.0, extent]),
            ([-extent, 0.0, offset], [extent, 0.0, offset]),
        ] {
            for position in [a, b] {
                vertices.push(Vertex {
                    position,
                    normal: [0.0, 1.0, 0.0],
                    color,
                    uv: [0.0, 0.0],
                });
            }
        }
    }

    let indices = (0..vertices.len() as u32).collect();
    Mesh { vertices, indices }
}
