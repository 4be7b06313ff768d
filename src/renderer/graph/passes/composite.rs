//! Final composite / tone-mapping pass
//!
//! Merges the lit scene color, the occlusion buffer, the bloom
//! contribution and the background color into the presentable target,
//! applying exposure tone mapping. Two independent `use_ssao`/`use_bloom`
//! uniforms gate the optional inputs; when a branch is disabled its
//! binding is replaced with the matching neutral dummy (white occlusion,
//! black bloom), so later stages always see a valid resource and the
//! shader skips sampling it.

use std::borrow::Cow;

use glam::{UVec4, Vec4};
use rustc_hash::FxHashMap;

use crate::renderer::context::GpuContext;
use crate::renderer::graph::context::{ExecuteContext, FrameResources, PrepareContext};
use crate::renderer::graph::node::{GraphResource, PassDescriptor, RenderNode};
use crate::renderer::texture::OUTPUT_FORMAT;
use crate::scene::Scene;

/// Composite uniforms, derived from the scene each frame.
///
/// With SSAO and bloom disabled the flags are zero and the output equals
/// the lighting-pass result modulated only by exposure tone mapping.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniforms {
    pub background: Vec4,
    /// x: exposure, y: bloom strength
    pub params: Vec4,
    /// x: use_ssao, y: use_bloom
    pub flags: UVec4,
}

impl CompositeUniforms {
    /// Packs the composite parameters from the scene's settings.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            background: scene.background().extend(1.0),
            params: Vec4::new(
                scene.tone_mapping.exposure(),
                scene.bloom.strength(),
                0.0,
                0.0,
            ),
            flags: UVec4::new(
                u32::from(scene.ssao.enabled),
                u32::from(scene.bloom.enabled),
                0,
                0,
            ),
        }
    }
}

/// Fullscreen composite into the presentable output target.
pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,

    /// Bind groups per (use_ssao, use_bloom) variant; dummies substitute
    /// for disabled inputs.
    bind_groups: FxHashMap<(bool, bool), wgpu::BindGroup>,
    active_variant: (bool, bool),
}

impl CompositePass {
    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../../shaders/composite.wgsl"
            ))),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
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
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Composite Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OUTPUT_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Composite Uniforms"),
            size: std::mem::size_of::<CompositeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            layout,
            uniform_buffer,
            bind_groups: FxHashMap::default(),
            active_variant: (false, false),
        }
    }

    fn bind_group_for(
        &mut self,
        gpu: &GpuContext,
        frame: &FrameResources,
        variant: (bool, bool),
    ) -> &wgpu::BindGroup {
        let layout = &self.layout;
        let uniform_buffer = &self.uniform_buffer;
        self.bind_groups.entry(variant).or_insert_with(|| {
            let (use_ssao, use_bloom) = variant;
            let ssao_view = if use_ssao {
                frame.ssao_blur.color_view(0)
            } else {
                &frame.white_r16
            };
            let bloom_view = if use_bloom {
                frame.bloom.view(0)
            } else {
                &frame.black_rgba16
            };

            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Composite BindGroup"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(
                            frame.gbuffer.color_view(0),
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(ssao_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(bloom_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(
                            &frame.linear_clamp_sampler,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
        })
    }
}

impl RenderNode for CompositePass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor {
            name: "Composite Pass",
            inputs: &[GraphResource::SceneColor],
            optional_inputs: &[GraphResource::SsaoBlurred, GraphResource::BloomPyramid],
            outputs: &[GraphResource::FinalColor],
        }
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let uniforms = CompositeUniforms::from_scene(ctx.scene);
        ctx.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let variant = (ctx.scene.ssao.enabled, ctx.scene.bloom.enabled);
        self.bind_group_for(ctx.gpu, ctx.frame, variant);
        self.active_variant = variant;
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let Some(bind_group) = self.bind_groups.get(&self.active_variant) else {
            return;
        };

        let attachments = ctx
            .frame
            .output
            .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::BLACK));
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &attachments,
            ..Default::default()
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
