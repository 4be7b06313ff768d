//! Screen-space ambient occlusion pass
//!
//! Two sub-passes over the G-buffer, both into dedicated single-channel
//! float targets at full frame size:
//!
//! 1. **Raw**: hemisphere occlusion sampling at 64 precomputed kernel
//!    offsets, oriented per fragment by the view-space normal and a tiled
//!    4×4 rotation noise texture.
//! 2. **Blur**: fixed-radius box filter suppressing the per-sample noise.
//!
//! With the pass disabled, the composite stage binds a neutral white dummy
//! instead, so occlusion becomes a no-attenuation factor, not a missing
//! binding.

use std::borrow::Cow;

use glam::{Mat4, Vec4};

use crate::renderer::context::GpuContext;
use crate::renderer::graph::context::{ExecuteContext, FrameResources, PrepareContext};
use crate::renderer::graph::node::{GraphResource, PassDescriptor, RenderNode};
use crate::renderer::texture::R16F_FORMAT;
use crate::renderer::tracked::Tracked;
use crate::resources::ssao::{KERNEL_SIZE, NOISE_SIZE, generate_ssao_kernel, generate_ssao_noise};
use crate::scene::Scene;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SsaoUniforms {
    proj: Mat4,
    samples: [Vec4; KERNEL_SIZE],
    /// x: radius, y: bias, z: power, w: kernel size
    params: Vec4,
    /// xy: noise tiling scale
    noise_scale: Vec4,
}

/// Raw occlusion estimation plus blur.
pub struct SsaoPass {
    raw_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,

    uniform_buffer: wgpu::Buffer,
    kernel: [Vec4; KERNEL_SIZE],
    #[allow(dead_code)]
    noise_view: Tracked<wgpu::TextureView>,

    raw_bind_group: wgpu::BindGroup,
    blur_bind_group: wgpu::BindGroup,
}

impl SsaoPass {
    #[must_use]
    pub fn new(gpu: &GpuContext, frame: &FrameResources) -> Self {
        let device = &gpu.device;

        // --- Kernel & noise (regenerated on every pipeline init) ---
        let mut kernel = [Vec4::ZERO; KERNEL_SIZE];
        for (slot, sample) in kernel.iter_mut().zip(generate_ssao_kernel()) {
            *slot = sample;
        }

        let noise_data = generate_ssao_noise();
        let noise_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("SSAO Noise 4x4"),
            size: wgpu::Extent3d {
                width: NOISE_SIZE,
                height: NOISE_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let flat: Vec<u8> = noise_data.iter().flat_map(|p| p.iter().copied()).collect();
        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &noise_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &flat,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(NOISE_SIZE * 4),
                rows_per_image: Some(NOISE_SIZE),
            },
            wgpu::Extent3d {
                width: NOISE_SIZE,
                height: NOISE_SIZE,
                depth_or_array_layers: 1,
            },
        );
        let noise_view =
            Tracked::new(noise_texture.create_view(&wgpu::TextureViewDescriptor::default()));

        // --- Layouts ---
        let raw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SSAO Raw Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
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
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let blur_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SSAO Blur Layout"),
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
            ],
        });

        // --- Pipelines ---
        let raw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("SSAO Raw Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../../shaders/ssao_raw.wgsl"
            ))),
        });
        let blur_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("SSAO Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../../shaders/ssao_blur.wgsl"
            ))),
        });

        let fullscreen = |label: &str,
                          shader: &wgpu::ShaderModule,
                          layout: &wgpu::BindGroupLayout| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[Some(layout)],
                immediate_size: 0,
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: R16F_FORMAT,
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
            })
        };

        let raw_pipeline = fullscreen("SSAO Raw Pipeline", &raw_shader, &raw_layout);
        let blur_pipeline = fullscreen("SSAO Blur Pipeline", &blur_shader, &blur_layout);

        // --- Uniforms ---
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("SSAO Uniforms"),
            size: std::mem::size_of::<SsaoUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // --- Bind groups (frame targets are fixed, built once) ---
        let raw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SSAO Raw BindGroup"),
            layout: &raw_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(frame.gbuffer.color_view(1)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(frame.gbuffer.color_view(2)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&noise_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&frame.nearest_clamp_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&frame.noise_sampler),
                },
            ],
        });

        let blur_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SSAO Blur BindGroup"),
            layout: &blur_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(frame.ssao_raw.color_view(0)),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&frame.linear_clamp_sampler),
                },
            ],
        });

        Self {
            raw_pipeline,
            blur_pipeline,
            uniform_buffer,
            kernel,
            noise_view,
            raw_bind_group,
            blur_bind_group,
        }
    }
}

impl RenderNode for SsaoPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor {
            name: "SSAO Pass",
            inputs: &[GraphResource::SceneNormal, GraphResource::ScenePosition],
            optional_inputs: &[],
            outputs: &[GraphResource::SsaoRaw, GraphResource::SsaoBlurred],
        }
    }

    fn enabled(&self, scene: &Scene) -> bool {
        scene.ssao.enabled
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        let settings = &ctx.scene.ssao;
        let uniforms = SsaoUniforms {
            proj: ctx.camera.projection,
            samples: self.kernel,
            params: Vec4::new(
                settings.radius(),
                settings.bias(),
                settings.power(),
                KERNEL_SIZE as f32,
            ),
            noise_scale: Vec4::new(
                ctx.frame.width as f32 / NOISE_SIZE as f32,
                ctx.frame.height as f32 / NOISE_SIZE as f32,
                0.0,
                0.0,
            ),
        };
        ctx.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        // Sub-pass 1: raw occlusion.
        {
            let attachments = ctx
                .frame
                .ssao_raw
                .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::WHITE));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("SSAO Raw Pass"),
                color_attachments: &attachments,
                ..Default::default()
            });
            pass.set_pipeline(&self.raw_pipeline);
            pass.set_bind_group(0, &self.raw_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        // Sub-pass 2: blur.
        {
            let attachments = ctx
                .frame
                .ssao_blur
                .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::WHITE));
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("SSAO Blur Pass"),
                color_attachments: &attachments,
                ..Default::default()
            });
            pass.set_pipeline(&self.blur_pipeline);
            pass.set_bind_group(0, &self.blur_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}
