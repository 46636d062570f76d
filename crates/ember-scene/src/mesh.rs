//! Procedural mesh kinds and the mesh factory
//!
//! Every entity is built from one of a closed set of shapes. Unknown type
//! names fall back to a cube so hand-written scenes never fail to load over
//! a typo.

use glam::Vec3;
use std::f32::consts::{PI, TAU};
use std::fmt;

/// Default vertex color for procedural shapes
pub const DEFAULT_MESH_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// The shape an entity's mesh is generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cube,
    Sphere,
    Cylinder,
    Plane,
    Pyramid,
}

impl MeshKind {
    pub const ALL: [MeshKind; 5] = [
        MeshKind::Cube,
        MeshKind::Sphere,
        MeshKind::Cylinder,
        MeshKind::Plane,
        MeshKind::Pyramid,
    ];

    /// Parse a type name. Unrecognized names become `Cube`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Cube" => MeshKind::Cube,
            "Sphere" => MeshKind::Sphere,
            "Cylinder" => MeshKind::Cylinder,
            "Plane" => MeshKind::Plane,
            "Pyramid" => MeshKind::Pyramid,
            other => {
                log::warn!("Unknown object type '{}', using Cube", other);
                MeshKind::Cube
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MeshKind::Cube => "Cube",
            MeshKind::Sphere => "Sphere",
            MeshKind::Cylinder => "Cylinder",
            MeshKind::Plane => "Plane",
            MeshKind::Pyramid => "Pyramid",
        }
    }

    /// Generate this kind's mesh at its default size
    pub fn build_mesh(&self) -> MeshData {
        match self {
            MeshKind::Cube => create_cube(1.0, DEFAULT_MESH_COLOR),
            MeshKind::Sphere => create_sphere(0.5, 24, 16, DEFAULT_MESH_COLOR),
            MeshKind::Cylinder => create_cylinder(
                Vec3::new(0.0, -0.5, 0.0),
                Vec3::new(0.0, 0.5, 0.0),
                0.5,
                24,
                DEFAULT_MESH_COLOR,
            ),
            MeshKind::Plane => create_plane(2.0, 2.0, DEFAULT_MESH_COLOR),
            MeshKind::Pyramid => create_pyramid(1.0, 1.0, DEFAULT_MESH_COLOR),
        }
    }
}

impl fmt::Display for MeshKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A CPU-side vertex: position, normal, color, and UV
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as vertex positions
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([
                Vec3::from_array(a.position),
                Vec3::from_array(b.position),
                Vec3::from_array(c.position),
            ])
        })
    }

    /// Append another mesh, offsetting its indices
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for (corner, uv) in corners.iter().zip(uvs) {
            self.vertices.push(MeshVertex {
                position: corner.to_array(),
                normal: normal.to_array(),
                color,
                uv,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn push_triangle(&mut self, corners: [Vec3; 3], color: [f32; 4]) {
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        let base = self.vertices.len() as u32;
        let uvs = [[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]];
        for (corner, uv) in corners.iter().zip(uvs) {
            self.vertices.push(MeshVertex {
                position: corner.to_array(),
                normal: normal.to_array(),
                color,
                uv,
            });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

/// Axis-aligned cube centered on the origin
pub fn create_cube(size: f32, color: [f32; 4]) -> MeshData {
    let h = size / 2.0;
    let mut mesh = MeshData::default();

    // (normal, tangent u, tangent v) per face; corners wind CCW seen from outside
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    for (n, u, v) in faces {
        let c = n * h;
        mesh.push_quad(
            [
                c - u * h - v * h,
                c + u * h - v * h,
                c + u * h + v * h,
                c - u * h + v * h,
            ],
            n,
            color,
        );
    }
    mesh
}

/// Flat plane in XZ facing +Y
pub fn create_plane(width: f32, depth: f32, color: [f32; 4]) -> MeshData {
    let hw = width / 2.0;
    let hd = depth / 2.0;
    let mut mesh = MeshData::default();
    mesh.push_quad(
        [
            Vec3::new(-hw, 0.0, hd),
            Vec3::new(hw, 0.0, hd),
            Vec3::new(hw, 0.0, -hd),
            Vec3::new(-hw, 0.0, -hd),
        ],
        Vec3::Y,
        color,
    );
    mesh
}

/// Square-based pyramid sitting on y = -height/2
pub fn create_pyramid(size: f32, height: f32, color: [f32; 4]) -> MeshData {
    let h = size / 2.0;
    let y0 = -height / 2.0;
    let apex = Vec3::new(0.0, height / 2.0, 0.0);
    let base = [
        Vec3::new(-h, y0, h),
        Vec3::new(h, y0, h),
        Vec3::new(h, y0, -h),
        Vec3::new(-h, y0, -h),
    ];

    let mut mesh = MeshData::default();
    mesh.push_quad([base[0], base[3], base[2], base[1]], Vec3::NEG_Y, color);
    for i in 0..4 {
        mesh.push_triangle([base[i], base[(i + 1) % 4], apex], color);
    }
    mesh
}

/// UV sphere centered on the origin
pub fn create_sphere(radius: f32, segments: u32, rings: u32, color: [f32; 4]) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = MeshData::default();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = u * TAU;
            let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            mesh.vertices.push(MeshVertex {
                position: (n * radius).to_array(),
                normal: n.to_array(),
                color,
                uv: [u, v],
            });
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    mesh
}

/// Two unit vectors perpendicular to `axis` and to each other
fn perpendicular_basis(axis: Vec3) -> (Vec3, Vec3) {
    let helper = if axis.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
    let side = axis.cross(helper).normalize_or_zero();
    let up = side.cross(axis).normalize_or_zero();
    (side, up)
}

/// Capped cylinder between two points
pub fn create_cylinder(start: Vec3, end: Vec3, radius: f32, segments: u32, color: [f32; 4]) -> MeshData {
    let segments = segments.max(3);
    let axis = (end - start).normalize_or_zero();
    let (side, up) = perpendicular_basis(axis);
    let mut mesh = MeshData::default();

    let ring = |i: u32| {
        let a = i as f32 / segments as f32 * TAU;
        side * a.cos() + up * a.sin()
    };

    // Side wall
    for i in 0..=segments {
        let n = ring(i);
        let u = i as f32 / segments as f32;
        for (p, v) in [(start, 0.0), (end, 1.0)] {
            mesh.vertices.push(MeshVertex {
                position: (p + n * radius).to_array(),
                normal: n.to_array(),
                color,
                uv: [u, v],
            });
        }
    }
    for i in 0..segments {
        let a = i * 2;
        mesh.indices
            .extend_from_slice(&[a, a + 1, a + 2, a + 1, a + 3, a + 2]);
    }

    // Caps
    for (center, normal) in [(start, -axis), (end, axis)] {
        let c = mesh.vertices.len() as u32;
        mesh.vertices.push(MeshVertex {
            position: center.to_array(),
            normal: normal.to_array(),
            color,
            uv: [0.5, 0.5],
        });
        for i in 0..=segments {
            let d = ring(i);
            mesh.vertices.push(MeshVertex {
                position: (center + d * radius).to_array(),
                normal: normal.to_array(),
                color,
                uv: [0.5 + d.dot(side) * 0.5, 0.5 + d.dot(up) * 0.5],
            });
        }
        for i in 0..segments {
            let (a, b) = (c + 1 + i, c + 2 + i);
            // The ring turns clockwise when viewed from the end cap
            if normal.dot(axis) > 0.0 {
                mesh.indices.extend_from_slice(&[c, b, a]);
            } else {
                mesh.indices.extend_from_slice(&[c, a, b]);
            }
        }
    }
    mesh
}

/// Cone from a base circle to a tip point
pub fn create_cone(base_center: Vec3, tip: Vec3, radius: f32, segments: u32, color: [f32; 4]) -> MeshData {
    let segments = segments.max(3);
    let axis = (tip - base_center).normalize_or_zero();
    let (side, up) = perpendicular_basis(axis);
    let mut mesh = MeshData::default();

    let rim = |i: u32| {
        let a = i as f32 / segments as f32 * TAU;
        base_center + (side * a.cos() + up * a.sin()) * radius
    };

    for i in 0..segments {
        let (a, b) = (rim(i), rim(i + 1));
        mesh.push_triangle([b, a, tip], color);
        mesh.push_triangle([a, b, base_center], color);
    }
    mesh
}

/// Line-list indices for the unique edges of a triangle list
pub fn wireframe_indices(indices: &[u32]) -> Vec<u32> {
    let mut seen = std::collections::HashSet::new();
    let mut lines = Vec::new();
    for tri in indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = if a < b { (a, b) } else { (b, a) };
            if seen.insert(key) {
                lines.push(a);
                lines.push(b);
            }
        }
    }
    lines
}
