//! GPU mesh buffers and pre-warmed static geometry
//!
//! Mesh uploads are lazy: the first pass that draws a mesh establishes its
//! GPU buffers through [`ensure_uploaded`], and the buffers live inside the
//! shared `Mesh` afterwards. The orchestrator also owns a small set of
//! pre-warmed geometry ([`StaticGeometry`]) passed to every pass through
//! the pipeline context, so no pass keeps hidden static state. Fullscreen
//! passes draw a three-vertex triangle from the vertex index and need no
//! buffers at all.

use wgpu::util::DeviceExt;

use crate::renderer::context::GpuContext;
use crate::resources::{Mesh, Vertex};

/// Uploaded vertex/index buffers for one mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

fn upload(gpu: &GpuContext, mesh: &Mesh) -> GpuMesh {
    let vertex_buffer = gpu
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
    let index_buffer = gpu
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.index_count(),
    }
}

/// Returns the mesh's GPU buffers, uploading them on first use.
pub fn ensure_uploaded<'a>(gpu: &GpuContext, mesh: &'a Mesh) -> &'a GpuMesh {
    mesh.gpu.get_or_init(|| {
        log::debug!(
            "Uploading mesh: {} vertices, {} indices",
            mesh.vertices().len(),
            mesh.indices().len()
        );
        upload(gpu, mesh)
    })
}

/// Geometry owned by the orchestrator and shared across pass types.
pub struct StaticGeometry {
    /// Unit cube used by the environment capture passes.
    pub unit_cube: GpuMesh,
}

impl StaticGeometry {
    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            unit_cube: upload(gpu, &Mesh::cube()),
        }
    }

    /// Vertex layout shared by all mesh-drawing pipelines.
    #[must_use]
    pub const fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        Vertex::layout()
    }
}
