//! Geometry / lighting pass
//!
//! Renders every entity with its full PBR material into the MRT G-buffer
//! (lit HDR color, view-space normal, view-space position). Frame globals
//! (camera, light direction/color, light-space transform, shadow map and
//! environment maps) are bound before any entity draws. When the scene's
//! environment is not ready, neutral dummy maps are bound and the shader
//! falls back to a constant ambient term.

use std::borrow::Cow;
use std::sync::Arc;

use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::renderer::context::GpuContext;
use crate::renderer::geometry;
use crate::renderer::graph::context::{ExecuteContext, ObjectBuffer, PrepareContext};
use crate::renderer::graph::node::{GraphResource, PassDescriptor, RenderNode};
use crate::renderer::texture::{DEPTH_BUFFER_FORMAT, HDR_FORMAT};
use crate::renderer::tracked::Tracked;
use crate::resources::{MapFlags, Mesh, Vertex};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniforms {
    view: Mat4,
    proj: Mat4,
    light_view_proj: Mat4,
    camera_pos: Vec4,
    light_dir: Vec4,
    light_color: Vec4,
    /// x: IBL intensity, y: environment ready, z: prefiltered max mip
    env_params: Vec4,
}

struct DrawItem {
    mesh: Arc<Mesh>,
    material_bind_group: wgpu::BindGroup,
}

/// MRT geometry pass with per-fragment shadowing and IBL.
pub struct GeometryPass {
    pipeline: wgpu::RenderPipeline,

    frame_layout: Tracked<wgpu::BindGroupLayout>,
    material_layout: Tracked<wgpu::BindGroupLayout>,

    frame_uniform_buffer: wgpu::Buffer,
    material_sampler: Tracked<wgpu::Sampler>,

    /// Frame bind group, rebuilt when the bound resource set changes
    /// (environment bake, first frame).
    frame_bind_group: Option<(SmallVec<[u64; 4]>, wgpu::BindGroup)>,

    /// Material texture bind groups keyed by the six map image IDs
    /// (0 = dummy slot).
    material_bind_groups: FxHashMap<[u64; 6], wgpu::BindGroup>,

    draw_items: Vec<DrawItem>,
}

impl GeometryPass {
    #[must_use]
    pub fn new(gpu: &GpuContext, objects: &ObjectBuffer) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Geometry Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../../shaders/geometry.wgsl"
            ))),
        });

        // Group 0: frame globals.
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Geometry Frame Layout"),
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
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 6,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Group 1: material textures.
        let mut material_entries = Vec::with_capacity(7);
        for binding in 0..6 {
            material_entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        material_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 6,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Geometry Material Layout"),
            entries: &material_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Geometry Pipeline Layout"),
            bind_group_layouts: &[Some(&frame_layout), Some(&material_layout), Some(objects.layout())],
            immediate_size: 0,
        });

        let color_target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Geometry Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[
                    color_target(HDR_FORMAT),
                    color_target(HDR_FORMAT),
                    color_target(HDR_FORMAT),
                ],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_BUFFER_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let frame_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Geometry Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            frame_layout: Tracked::new(frame_layout),
            material_layout: Tracked::new(material_layout),
            frame_uniform_buffer,
            material_sampler: Tracked::new(material_sampler),
            frame_bind_group: None,
            material_bind_groups: FxHashMap::default(),
            draw_items: Vec::new(),
        }
    }

    fn write_frame_uniforms(&self, ctx: &PrepareContext) {
        let environment = &ctx.scene.environment;
        let (ready, max_mip) = environment.maps().map_or((0.0, 0.0), |maps| {
            (1.0, (maps.prefiltered_mip_count - 1) as f32)
        });

        let light = &ctx.scene.light;
        let uniforms = FrameUniforms {
            view: ctx.camera.view,
            proj: ctx.camera.projection,
            light_view_proj: light.view_projection(),
            camera_pos: ctx.camera.position.extend(1.0),
            light_dir: light.direction().extend(0.0),
            light_color: light.color().extend(light.intensity()),
            env_params: Vec4::new(environment.intensity(), ready, max_mip, 0.0),
        };
        ctx.gpu
            .queue
            .write_buffer(&self.frame_uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn ensure_frame_bind_group(&mut self, ctx: &PrepareContext) {
        let shadow_view = ctx
            .frame
            .shadow
            .depth_view()
            .expect("shadow target has a depth texture");

        let (irradiance, prefiltered, brdf) = match ctx.scene.environment.maps() {
            Some(maps) => (&maps.irradiance, &maps.prefiltered, &maps.brdf_lut),
            None => (
                &ctx.frame.dummy_cube,
                &ctx.frame.dummy_cube,
                &ctx.frame.dummy_brdf,
            ),
        };

        let key: SmallVec<[u64; 4]> = SmallVec::from_slice(&[
            shadow_view.id(),
            irradiance.id(),
            prefiltered.id(),
            brdf.id(),
        ]);
        if let Some((cached_key, _)) = &self.frame_bind_group
            && *cached_key == key
        {
            return;
        }

        let bind_group = ctx
            .gpu
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Geometry Frame BindGroup"),
                layout: &self.frame_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.frame_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(shadow_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&ctx.frame.shadow_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(irradiance),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(prefiltered),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(brdf),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::Sampler(&ctx.frame.linear_clamp_sampler),
                    },
                ],
            });
        self.frame_bind_group = Some((key, bind_group));
    }

    fn material_bind_group(
        &mut self,
        gpu: &GpuContext,
        textures: &mut crate::renderer::texture::TextureRegistry,
        white_fallback: &Tracked<wgpu::TextureView>,
        material: &crate::resources::Material,
    ) -> wgpu::BindGroup {
        let maps = [
            MapFlags::ALBEDO,
            MapFlags::NORMAL,
            MapFlags::METALLIC,
            MapFlags::ROUGHNESS,
            MapFlags::AO,
            MapFlags::EMISSIVE,
        ];

        let mut key = [0u64; 6];
        let mut views: SmallVec<[Tracked<wgpu::TextureView>; 6]> = SmallVec::new();
        for (slot, flag) in maps.into_iter().enumerate() {
            match material.map_for(flag) {
                Some(image) => {
                    let view = textures.view_for(gpu, image).clone();
                    key[slot] = image.id();
                    views.push(view);
                }
                None => {
                    views.push(white_fallback.clone());
                }
            }
        }

        if let Some(cached) = self.material_bind_groups.get(&key) {
            return cached.clone();
        }

        let entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(slot, view)| wgpu::BindGroupEntry {
                binding: slot as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .chain(std::iter::once(wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::Sampler(&self.material_sampler),
            }))
            .collect();

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material BindGroup"),
            layout: &self.material_layout,
            entries: &entries,
        });
        self.material_bind_groups.insert(key, bind_group.clone());
        bind_group
    }
}

impl RenderNode for GeometryPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor {
            name: "Geometry Pass",
            inputs: &[GraphResource::ShadowMap],
            optional_inputs: &[],
            outputs: &[
                GraphResource::SceneColor,
                GraphResource::SceneNormal,
                GraphResource::ScenePosition,
                GraphResource::SceneDepth,
            ],
        }
    }

    fn prepare(&mut self, ctx: &mut PrepareContext) {
        self.write_frame_uniforms(ctx);
        self.ensure_frame_bind_group(ctx);

        self.draw_items.clear();
        let scene = ctx.scene;
        let gpu = ctx.gpu;
        let white_fallback = ctx.frame.white_rgba8.clone();
        for (_key, entity) in scene.entities() {
            let bind_group = self.material_bind_group(
                gpu,
                ctx.textures,
                &white_fallback,
                &entity.material,
            );
            let mesh = Arc::clone(entity.mesh());
            geometry::ensure_uploaded(gpu, &mesh);
            self.draw_items.push(DrawItem {
                mesh,
                material_bind_group: bind_group,
            });
        }
    }

    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder) {
        let Some((_, frame_bind_group)) = &self.frame_bind_group else {
            return;
        };

        let color_attachments = ctx
            .frame
            .gbuffer
            .color_attachments(wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT));
        let depth_attachment = ctx
            .frame
            .gbuffer
            .depth_attachment(wgpu::LoadOp::Clear(1.0));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Geometry Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: depth_attachment,
            ..Default::default()
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame_bind_group, &[]);

        for (index, item) in self.draw_items.iter().enumerate() {
            let Some(mesh) = item.mesh.gpu.get() else {
                continue;
            };
            pass.set_bind_group(1, &item.material_bind_group, &[]);
            pass.set_bind_group(
                2,
                ctx.objects.bind_group(),
                &[ctx.objects.dynamic_offset(index as u32)],
            );
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
