//! Bloom pass
//!
//! Three stages over the lit scene color:
//!
//! 1. **Bright pass**: soft-knee threshold extraction into a dedicated
//!    bright target.
//! 2. **Downsample**: progressive walk down the mip chain; each step
//!    samples the previous level and receives the *source* resolution as a
//!    uniform (the texel footprint depends on it).
//! 3. **Upsample**: reverse walk, sampling the coarser level and additively
//!    blending into the next finer one with a fixed filter radius. After
//!    the walk, chain level 0 holds the composited bloom contribution.
//!
//! The additive accumulation is the upsample pipeline's own blend state,
//! so it is scoped to this pass by construction and cannot leak into
//! subsequent draws.

use std::borrow::Cow;

use glam::Vec4;
use wgpu::util::DeviceExt;

use crate::renderer::context::GpuContext;
use crate::renderer::graph::context::{ExecuteContext, FrameResources, PrepareContext};
use crate::renderer::graph::node::{GraphResource, PassDescriptor, RenderNode};
use crate::renderer::texture::HDR_FORMAT;
use crate::scene::Scene;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct BrightUniforms {
    /// x: threshold, y: soft knee fraction
    params: Vec4,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DownsampleUniforms {
    /// xy: source resolution in pixels
    src_resolution: Vec4,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct UpsampleUniforms {
    /// x: filter radius in UV units
    params: Vec4,
}

/// Bright-pass extraction plus the downsample/upsample mip-chain walk.
pub struct BloomPass {
    bright_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,

    bright_uniforms: wgpu::Buffer,
    upsample_uniforms: wgpu::Buffer,

    bright_bind_group: wgpu::BindGroup,
    /// `downsample_bind_groups[i]` feeds chain level `i` (source: bright
    /// target for `i == 0`, otherwise level `i - 1`).
    downsample_bind_groups: Vec<wgpu::BindGroup>,
    /// `upsample_bind_groups[i]` feeds chain level `i` (source: level
    /// `i + 1`).
    upsample_bind_groups: Vec<wgpu::BindGroup>,

    /// Chain depth used this frame (settings-clamped).
    active_levels: usize,
}

impl BloomPass {
    #[must_use]
    pub fn new(gpu: &GpuContext, frame: &FrameResources) -> Self {
        let device = &gpu.device;

        // Shared layout: source texture + sampler + uniforms.
        let io_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom IO Layout"),
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
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
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
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[Some(&io_layout)],
            immediate_size: 0,
        });

        let color_target_replace = wgpu::ColorTargetState {
            format: HDR_FORMAT,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        };
        // Additive accumulation, scoped to the upsample pipeline.
        let color_target_additive = wgpu::ColorTargetState {
            format: HDR_FORMAT,
            blend: Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            }),
            write_mask: wgpu::ColorWrites::ALL,
        };

        let make_pipeline = |label: &str, source: &'static str, target: wgpu::ColorTargetState| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
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
                    targets: &[Some(target)],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let bright_pipeline = make_pipeline(
            "Bloom Bright Pipeline",
            include_str!("../../shaders/bloom_bright.wgsl"),
            color_target_replace.clone(),
        );
        let downsample_pipeline = make_pipeline(
            "Bloom Downsample Pipeline",
            include_str!("../../shaders/bloom_downsample.wgsl"),
            color_target_replace,
        );
        let upsample_pipeline = make_pipeline(
            "Bloom Upsample Pipeline",
            include_str!("../../shaders/bloom_upsample.wgsl"),
            color_target_additive,
        );

        // --- Uniform buffers ---
        let bright_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bloom Bright Uniforms"),
            size: std::mem::size_of::<BrightUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let upsample_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bloom Upsample Uniforms"),
            size: std::mem::size_of::<UpsampleUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = &frame.linear_clamp_sampler;
        let make_bind_group = |source: &wgpu::TextureView, uniforms: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Bloom IO BindGroup"),
                layout: &io_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniforms.as_entire_binding(),
                    },
                ],
            })
        };

        // Bright pass reads the lit scene color.
        let bright_bind_group =
            make_bind_group(frame.gbuffer.color_view(0), &bright_uniforms);

        // The chain topology is fixed at init, so every per-level source
        // resolution is static; one uniform buffer per level.
        let chain_len = frame.bloom.len();
        let mut downsample_bind_groups = Vec::with_capacity(chain_len);
        let mut upsample_bind_groups = Vec::with_capacity(chain_len.saturating_sub(1));

        for level in 0..chain_len {
            let (src_view, src_size) = if level == 0 {
                (
                    frame.bloom_bright.color_view(0),
                    (frame.bloom_bright.width(), frame.bloom_bright.height()),
                )
            } else {
                (frame.bloom.view(level - 1), frame.bloom.size(level - 1))
            };
            let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Downsample Uniforms"),
                contents: bytemuck::bytes_of(&DownsampleUniforms {
                    src_resolution: Vec4::new(src_size.0 as f32, src_size.1 as f32, 0.0, 0.0),
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            downsample_bind_groups.push(make_bind_group(src_view, &uniforms));
        }

        for level in 0..chain_len.saturating_sub(1) {
            upsample_bind_groups
                .push(make_bind_group(frame.bloom.view(level + 1), &upsample_uniforms));
        }

        Self {
            bright_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            bright_uniforms,
            upsample_uniforms,
            bright_bind_group,
            downsample_bind_groups,
            upsample_bind_groups,
            active_levels: chain_len,
        }
    }
}

impl RenderNode for BloomPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor {
            name: "Bloom Pass",
            inputs: &[GraphResource::SceneColor],
            optional_inputs: &[],
            outputs: &[GraphResource::BloomPyramid],
        }
    }

    fn enabled(&self, scene: &Scene) -> bool {
        scene.bloom.enabled
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let settings = &ctx.scene.bloom;

        ctx.gpu.queue.write_buffer(
            &self.bright_uniforms,
            0,
            bytemuck::bytes_of(&BrightUniforms {
                params: Vec4::new(settings.threshold(), settings.soft_knee(), 0.0, 0.0),
            }),
        );
        ctx.gpu.queue.write_buffer(
            &self.upsample_uniforms,
            0,
            bytemuck::bytes_of(&UpsampleUniforms {
                params: Vec4::new(settings.filter_radius(), 0.0, 0.0, 0.0),
            }),
        );

        self.active_levels = (settings.max_mip_levels() as usize)
            .clamp(1, self.downsample_bind_groups.len());
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        // Stage 1: bright-pass extraction.
        {
            let attachments = ctx
                .frame
                .bloom_bright
                .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::BLACK));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bloom Bright Pass"),
                color_attachments: &attachments,
                ..Default::default()
            });
            pass.set_pipeline(&self.bright_pipeline);
            pass.set_bind_group(0, &self.bright_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        // Stage 2: downsample walk, level i reads level i-1.
        for level in 0..self.active_levels {
            let attachments = ctx
                .frame
                .bloom
                .level(level)
                .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::BLACK));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bloom Downsample"),
                color_attachments: &attachments,
                ..Default::default()
            });
            pass.set_pipeline(&self.downsample_pipeline);
            pass.set_bind_group(0, &self.downsample_bind_groups[level], &[]);
            pass.draw(0..3, 0..1);
        }

        // Stage 3: reverse walk, additive blend into each finer level.
        for level in (0..self.active_levels.saturating_sub(1)).rev() {
            let attachments = ctx
                .frame
                .bloom
                .level(level)
                .color_attachments(wgpu::LoadOp::Load);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bloom Upsample"),
                color_attachments: &attachments,
                ..Default::default()
            });
            pass.set_pipeline(&self.upsample_pipeline);
            pass.set_bind_group(0, &self.upsample_bind_groups[level], &[]);
            pass.draw(0..3, 0..1);
        }
    }
}
