//! Mesh data and primitive generators
//!
//! A [`Mesh`] owns CPU-side vertex/index buffers; the matching GPU buffers
//! are established lazily on first draw (see `renderer::geometry`) and
//! cached inside the mesh, so many entities can share one `Arc<Mesh>` and
//! upload it once.

use std::sync::OnceLock;

use glam::Vec3;

use crate::renderer::geometry::GpuMesh;

/// Interleaved vertex: position, normal, UV.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    #[must_use]
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Triangle mesh with lazily uploaded GPU buffers.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    pub(crate) gpu: OnceLock<GpuMesh>,
}

impl Mesh {
    #[must_use]
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            gpu: OnceLock::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Axis-aligned unit cube centered at the origin, outward CCW winding.
    #[must_use]
    pub fn cube() -> Self {
        // One face per plane; normals and UVs per face.
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // (normal, tangent u, tangent v)
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in faces {
            let n = Vec3::from(normal);
            let u = Vec3::from(u_axis);
            let v = Vec3::from(v_axis);
            let base = vertices.len() as u32;
            for (du, dv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                let p = n * 0.5 + u * du + v * dv;
                vertices.push(Vertex {
                    position: p.to_array(),
                    normal,
                    uv: [du + 0.5, dv + 0.5],
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// UV sphere of radius 0.5 centered at the origin.
    #[must_use]
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        for ring in 0..=rings {
            let theta = std::f32::consts::PI * ring as f32 / rings as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            for seg in 0..=segments {
                let phi = std::f32::consts::TAU * seg as f32 / segments as f32;
                let (sin_p, cos_p) = phi.sin_cos();
                let n = Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p);
                vertices.push(Vertex {
                    position: (n * 0.5).to_array(),
                    normal: n.to_array(),
                    uv: [
                        seg as f32 / segments as f32,
                        ring as f32 / rings as f32,
                    ],
                });
            }
        }

        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        Self::new(vertices, indices)
    }

    /// Unit plane on the XZ axes, facing +Y.
    #[must_use]
    pub fn plane() -> Self {
        let vertices = vec![
            Vertex {
                position: [-0.5, 0.0, -0.5],
                normal: [0.0, 1.0, 0.0],
                uv: [0.0, 0.0],
            },
            Vertex {
                position: [0.5, 0.0, -0.5],
                normal: [0.0, 1.0, 0.0],
                uv: [1.0, 0.0],
            },
            Vertex {
                position: [0.5, 0.0, 0.5],
                normal: [0.0, 1.0, 0.0],
                uv: [1.0, 1.0],
            },
            Vertex {
                position: [-0.5, 0.0, 0.5],
                normal: [0.0, 1.0, 0.0],
                uv: [0.0, 1.0],
            },
        ];
        let indices = vec![0, 2, 1, 0, 3, 2];
        Self::new(vertices, indices)
    }
}
