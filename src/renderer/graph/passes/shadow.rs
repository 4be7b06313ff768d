//! Shadow depth pass
//!
//! Renders every entity's mesh, geometry only, into the depth-only shadow
//! target from the light's orthographic projection. Front faces are culled
//! so the stored depth comes from back faces, which reduces peter-panning
//! and self-shadowing artifacts.

use std::borrow::Cow;

use glam::Mat4;

use crate::renderer::geometry;
use crate::renderer::graph::context::{ExecuteContext, PrepareContext};
use crate::renderer::graph::node::{GraphResource, PassDescriptor, RenderNode};
use crate::renderer::texture::DEPTH_TEXTURE_FORMAT;
use crate::resources::Vertex;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ShadowUniforms {
    light_view_proj: Mat4,
}

/// Depth-only pass from the light's point of view.
pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ShadowPass {
    #[must_use]
    pub fn new(
        gpu: &crate::renderer::context::GpuContext,
        objects: &crate::renderer::graph::context::ObjectBuffer,
    ) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../../shaders/shadow.wgsl"
            ))),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Uniforms Layout"),
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
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[Some(&uniform_layout), Some(objects.layout())],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            // Depth-only: no fragment stage.
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Front-face culling: store back-face depth.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Uniforms"),
            size: std::mem::size_of::<ShadowUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Uniforms BindGroup"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }
}

impl RenderNode for ShadowPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor {
            name: "Shadow Pass",
            inputs: &[],
            optional_inputs: &[],
            outputs: &[GraphResource::ShadowMap],
        }
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let uniforms = ShadowUniforms {
            light_view_proj: ctx.scene.light.view_projection(),
        };
        ctx.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        // First pass of the frame: establish mesh GPU buffers.
        for (_key, entity) in ctx.scene.entities() {
            geometry::ensure_uploaded(ctx.gpu, entity.mesh());
        }
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let depth_attachment = ctx
            .frame
            .shadow
            .depth_attachment(wgpu::LoadOp::Clear(1.0));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: depth_attachment,
            ..Default::default()
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);

        for (index, (_key, entity)) in ctx.scene.entities().enumerate() {
            let Some(mesh) = entity.mesh().gpu.get() else {
                continue;
            };
            pass.set_bind_group(
                1,
                ctx.objects.bind_group(),
                &[ctx.objects.dynamic_offset(index as u32)],
            );
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
