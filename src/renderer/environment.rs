//! Environment precomputation pipeline
//!
//! One-time bake executed when a scene's environment image is set, never
//! from the steady-state frame loop:
//!
//! 1. equirectangular HDR → 2048² cubemap (six cube-face captures, then a
//!    full mip chain for the prefilter step to sample coarser levels)
//! 2. 32² diffuse irradiance convolution
//! 3. 512² specular prefiltering across [`PREFILTER_MIP_LEVELS`] mips,
//!    roughness 0..1 mapped linearly over the mip index
//! 4. 512² split-sum BRDF LUT (environment-independent, rebaked per load)
//!
//! Each capture render pass targets one cubemap face/mip view, so the
//! effective viewport substitution happens per pass; the caller's frame
//! targets are untouched. The whole bake records into a single command
//! encoder and submits once as an explicit, blocking scene-load operation.

use std::borrow::Cow;

use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::renderer::context::GpuContext;
use crate::renderer::geometry::StaticGeometry;
use crate::renderer::mipmap::MipmapGenerator;
use crate::renderer::texture::{self, HDR_FORMAT};
use crate::renderer::tracked::Tracked;
use crate::resources::HdrImage;
use crate::scene::EnvironmentMaps;

/// Face size of the environment cubemap.
pub const ENV_CUBE_SIZE: u32 = 2048;
/// Face size of the irradiance cubemap.
pub const IRRADIANCE_SIZE: u32 = 32;
/// Base face size of the prefiltered specular cubemap.
pub const PREFILTER_SIZE: u32 = 512;
/// Mip levels of the prefiltered cubemap, covering roughness 0..1 linearly.
pub const PREFILTER_MIP_LEVELS: u32 = 5;
/// Resolution of the BRDF lookup table.
pub const BRDF_LUT_SIZE: u32 = 512;

/// Format of the BRDF LUT: two channels, (scale, bias).
pub const BRDF_LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

/// The six capture view-projections: 90° FOV aimed along ±X, ±Y, ±Z with
/// the matching up vectors ((0,-1,0) for ±X and ±Z, (0,0,±1) for ±Y).
#[must_use]
pub fn capture_face_matrices() -> [Mat4; 6] {
    let proj = Mat4::perspective_rh(90.0_f32.to_radians(), 1.0, 0.1, 10.0);
    let faces = capture_face_bases();
    faces.map(|(forward, up)| proj * Mat4::look_at_rh(Vec3::ZERO, forward, up))
}

/// The (forward, up) pairs of the six cube faces, in +X, -X, +Y, -Y, +Z, -Z
/// order.
#[must_use]
pub fn capture_face_bases() -> [(Vec3, Vec3); 6] {
    [
        (Vec3::X, Vec3::NEG_Y),
        (Vec3::NEG_X, Vec3::NEG_Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::NEG_Z),
        (Vec3::Z, Vec3::NEG_Y),
        (Vec3::NEG_Z, Vec3::NEG_Y),
    ]
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CaptureUniforms {
    view_proj: Mat4,
    /// x: roughness (prefilter only), y: source cubemap face size
    params: Vec4,
}

/// Owns the capture pipelines for the one-time environment bake.
pub struct EnvironmentBaker {
    cube_layout: wgpu::BindGroupLayout,
    equirect_layout: wgpu::BindGroupLayout,

    equirect_pipeline: wgpu::RenderPipeline,
    irradiance_pipeline: wgpu::RenderPipeline,
    prefilter_pipeline: wgpu::RenderPipeline,
    brdf_pipeline: wgpu::RenderPipeline,

    sampler: wgpu::Sampler,
}

impl EnvironmentBaker {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        // Layout for passes sampling the source cubemap.
        let cube_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Env Capture Cube Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
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
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Layout for the equirect projection (2D source).
        let equirect_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Env Capture Equirect Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
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
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let equirect_pipeline = Self::cube_capture_pipeline(
            device,
            &equirect_layout,
            include_str!("shaders/equirect_to_cube.wgsl"),
            HDR_FORMAT,
            "Equirect To Cube Pipeline",
        );
        let irradiance_pipeline = Self::cube_capture_pipeline(
            device,
            &cube_layout,
            include_str!("shaders/irradiance.wgsl"),
            HDR_FORMAT,
            "Irradiance Pipeline",
        );
        let prefilter_pipeline = Self::cube_capture_pipeline(
            device,
            &cube_layout,
            include_str!("shaders/prefilter.wgsl"),
            HDR_FORMAT,
            "Prefilter Pipeline",
        );

        // BRDF LUT: fullscreen triangle, no bindings.
        let brdf_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("BRDF LUT Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/brdf_lut.wgsl"))),
        });
        let brdf_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BRDF LUT Pipeline Layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });
        let brdf_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("BRDF LUT Pipeline"),
            layout: Some(&brdf_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &brdf_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &brdf_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: BRDF_LUT_FORMAT,
                    blend: None,
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Env Capture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        Self {
            cube_layout,
            equirect_layout,
            equirect_pipeline,
            irradiance_pipeline,
            prefilter_pipeline,
            brdf_pipeline,
            sampler,
        }
    }

    fn cube_capture_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        shader_source: &'static str,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(shader_source)),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[Some(layout)],
            immediate_size: 0,
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[StaticGeometry::vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // The capture camera sits inside the cube; keep the
                // interior faces.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn capture_uniform_buffer(
        device: &wgpu::Device,
        view_proj: Mat4,
        roughness: f32,
        source_size: f32,
    ) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Env Capture Uniforms"),
            contents: bytemuck::bytes_of(&CaptureUniforms {
                view_proj,
                params: Vec4::new(roughness, source_size, 0.0, 0.0),
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    fn draw_cube_face(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        target: &wgpu::TextureView,
        cube: &crate::renderer::geometry::GpuMesh,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Env Capture Face"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, cube.vertex_buffer.slice(..));
        pass.set_index_buffer(cube.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..cube.index_count, 0, 0..1);
    }

    /// Runs the full bake for one equirectangular HDR image.
    ///
    /// Blocking with respect to GPU submission ordering: the returned maps
    /// are valid to bind in the next frame.
    pub fn bake(
        &self,
        gpu: &GpuContext,
        mipgen: &mut MipmapGenerator,
        statics: &StaticGeometry,
        hdr: &HdrImage,
    ) -> EnvironmentMaps {
        let device = &gpu.device;
        let face_matrices = capture_face_matrices();

        // --- Upload the equirectangular source (already flipped on load) ---
        let (equirect_texture, equirect_view) = texture::create_texture_2d(
            device,
            (hdr.width(), hdr.height()),
            HDR_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            1,
            "Equirect HDR Source",
        );
        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &equirect_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            hdr.texel_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(hdr.width() * 8),
                rows_per_image: Some(hdr.height()),
            },
            wgpu::Extent3d {
                width: hdr.width(),
                height: hdr.height(),
                depth_or_array_layers: 1,
            },
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Environment Bake Encoder"),
        });

        // --- Step 1: equirect -> cubemap, then the full mip chain ---
        let cube_mips = ENV_CUBE_SIZE.ilog2() + 1;
        let env_cube = texture::create_texture_cube(
            device,
            ENV_CUBE_SIZE,
            HDR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            cube_mips,
            "Environment Cubemap",
        );
        for (face, view_proj) in face_matrices.iter().enumerate() {
            let uniforms = Self::capture_uniform_buffer(device, *view_proj, 0.0, 0.0);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Equirect Capture BindGroup"),
                layout: &self.equirect_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&equirect_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            let face_view = texture::cube_face_view(&env_cube, face as u32, 0);
            self.draw_cube_face(
                &mut encoder,
                &self.equirect_pipeline,
                &bind_group,
                &face_view,
                &statics.unit_cube,
            );
        }
        mipgen.generate(device, &mut encoder, &env_cube, cube_mips);

        let env_cube_view = texture::cube_view(&env_cube, "Environment Cube View");

        // --- Step 2: diffuse irradiance convolution ---
        let irradiance_cube = texture::create_texture_cube(
            device,
            IRRADIANCE_SIZE,
            HDR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            1,
            "Irradiance Cubemap",
        );
        for (face, view_proj) in face_matrices.iter().enumerate() {
            let uniforms = Self::capture_uniform_buffer(device, *view_proj, 0.0, 0.0);
            let bind_group = self.cube_source_bind_group(device, &uniforms, &env_cube_view);
            let face_view = texture::cube_face_view(&irradiance_cube, face as u32, 0);
            self.draw_cube_face(
                &mut encoder,
                &self.irradiance_pipeline,
                &bind_group,
                &face_view,
                &statics.unit_cube,
            );
        }

        // --- Step 3: specular prefiltering across the mip chain ---
        let prefiltered_cube = texture::create_texture_cube(
            device,
            PREFILTER_SIZE,
            HDR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            PREFILTER_MIP_LEVELS,
            "Prefiltered Cubemap",
        );
        for mip in 0..PREFILTER_MIP_LEVELS {
            let roughness = mip as f32 / (PREFILTER_MIP_LEVELS - 1) as f32;
            for (face, view_proj) in face_matrices.iter().enumerate() {
                let uniforms = Self::capture_uniform_buffer(
                    device,
                    *view_proj,
                    roughness,
                    ENV_CUBE_SIZE as f32,
                );
                let bind_group = self.cube_source_bind_group(device, &uniforms, &env_cube_view);
                let face_view = texture::cube_face_view(&prefiltered_cube, face as u32, mip);
                self.draw_cube_face(
                    &mut encoder,
                    &self.prefilter_pipeline,
                    &bind_group,
                    &face_view,
                    &statics.unit_cube,
                );
            }
        }

        // --- Step 4: BRDF LUT ---
        let (_brdf_texture, brdf_view) = texture::create_texture_2d(
            device,
            (BRDF_LUT_SIZE, BRDF_LUT_SIZE),
            BRDF_LUT_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            1,
            "BRDF LUT",
        );
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("BRDF LUT Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &brdf_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.brdf_pipeline);
            pass.draw(0..3, 0..1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));

        log::info!(
            "Environment baked: cubemap {ENV_CUBE_SIZE}, irradiance {IRRADIANCE_SIZE}, \
             prefilter {PREFILTER_SIZE}x{PREFILTER_MIP_LEVELS} mips, BRDF LUT {BRDF_LUT_SIZE}"
        );

        EnvironmentMaps {
            cubemap: Tracked::new(env_cube_view),
            irradiance: Tracked::new(texture::cube_view(&irradiance_cube, "Irradiance View")),
            prefiltered: Tracked::new(texture::cube_view(&prefiltered_cube, "Prefiltered View")),
            brdf_lut: Tracked::new(brdf_view),
            prefiltered_mip_count: PREFILTER_MIP_LEVELS,
        }
    }

    fn cube_source_bind_group(
        &self,
        device: &wgpu::Device,
        uniforms: &wgpu::Buffer,
        source: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Env Capture BindGroup"),
            layout: &self.cube_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}
