//! Frame resources and pass contexts
//!
//! [`FrameResources`] owns every persistent render target of the
//! pipeline, all created at `init` with fixed resolutions and validated for
//! completeness before the first frame. The prepare/execute contexts hand
//! passes explicit references to shared state (device, scene snapshot,
//! frame targets, pre-warmed geometry, per-object uniforms); there is no
//! global renderer state.

use glam::{Mat3, Mat4, UVec4, Vec4};

use crate::errors::{EmberError, Result};
use crate::renderer::context::GpuContext;
use crate::renderer::geometry::StaticGeometry;
use crate::renderer::target::RenderTarget;
use crate::renderer::texture::{self, OUTPUT_FORMAT, R16F_FORMAT, TextureRegistry};
use crate::renderer::tracked::Tracked;
use crate::resources::bloom::mip_chain_sizes;
use crate::scene::{RenderCamera, Scene};

/// Shadow map resolution, decoupled from the frame size.
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Depth of the bloom mip chain allocated at init. The bloom pass may use
/// fewer levels per [`BloomSettings`](crate::resources::BloomSettings), but
/// never more.
pub const BLOOM_MIP_LEVELS: u32 = 6;

// ============================================================================
// Per-object uniforms
// ============================================================================

/// Dynamic-offset uniform block written once per entity per frame.
///
/// Holds the model transform, the view-space normal matrix, and the
/// material scalars with the effective map flags. The flags come from
/// [`Material::shading_flags`](crate::resources::Material::shading_flags),
/// so a map toggle without a bound texture has already degraded to the
/// scalar here.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: Mat4,
    /// Columns of the view-space normal matrix.
    pub normal_matrix: [Vec4; 3],
    pub albedo: Vec4,
    pub emissive: Vec4,
    /// x: metallic, y: roughness, z: ambient occlusion
    pub params: Vec4,
    /// x: effective map flag bits
    pub flags: UVec4,
    pub _pad: [f32; 20],
}

/// Uniform stride per entity; dynamic offsets must be 256-aligned.
pub const OBJECT_UNIFORM_STRIDE: u32 = std::mem::size_of::<ObjectUniforms>() as u32;

/// Growable dynamic-offset uniform buffer holding one [`ObjectUniforms`]
/// slot per entity, written at frame start and consumed by both the shadow
/// and geometry passes so their draw order stays aligned.
pub struct ObjectBuffer {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    capacity: u32,
    count: u32,
    staging: Vec<ObjectUniforms>,
}

impl ObjectBuffer {
    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Object Uniforms Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(u64::from(OBJECT_UNIFORM_STRIDE)),
                    },
                    count: None,
                }],
            });

        let capacity = 64;
        let buffer = Self::create_buffer(gpu, capacity);
        let bind_group = Self::create_bind_group(gpu, &layout, &buffer);

        Self {
            buffer,
            layout,
            bind_group,
            capacity,
            count: 0,
            staging: Vec::with_capacity(capacity as usize),
        }
    }

    fn create_buffer(gpu: &GpuContext, capacity: u32) -> wgpu::Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniforms Buffer"),
            size: u64::from(OBJECT_UNIFORM_STRIDE) * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Uniforms BindGroup"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(u64::from(OBJECT_UNIFORM_STRIDE)),
                }),
            }],
        })
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    #[inline]
    #[must_use]
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Offset of entity slot `index` for `set_bind_group`.
    #[inline]
    #[must_use]
    pub fn dynamic_offset(&self, index: u32) -> u32 {
        index * OBJECT_UNIFORM_STRIDE
    }

    /// Number of slots written this frame.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fills one slot per entity in scene iteration order. Both mesh-drawing
    /// passes iterate the same order, so slot `i` always matches draw `i`.
    pub fn write(&mut self, gpu: &GpuContext, scene: &Scene, camera: &RenderCamera) {
        self.staging.clear();
        for (_key, entity) in scene.entities() {
            let model = entity.model_matrix();
            let normal = Mat3::from_mat4(camera.view * model).inverse().transpose();
            let material = &entity.material;

            self.staging.push(ObjectUniforms {
                model,
                normal_matrix: [
                    normal.x_axis.extend(0.0),
                    normal.y_axis.extend(0.0),
                    normal.z_axis.extend(0.0),
                ],
                albedo: material.albedo.extend(1.0),
                emissive: material.emissive.extend(1.0),
                params: Vec4::new(material.metallic, material.roughness, material.ao, 0.0),
                flags: UVec4::new(material.shading_flags().bits(), 0, 0, 0),
                _pad: [0.0; 20],
            });
        }

        self.count = self.staging.len() as u32;
        if self.count == 0 {
            return;
        }

        if self.count > self.capacity {
            let mut capacity = self.capacity.max(1);
            while capacity < self.count {
                capacity = capacity.saturating_mul(2);
            }
            log::debug!("Growing object uniform buffer to {capacity} slots");
            self.buffer = Self::create_buffer(gpu, capacity);
            self.bind_group = Self::create_bind_group(gpu, &self.layout, &self.buffer);
            self.capacity = capacity;
        }

        gpu.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.staging));
    }
}

// ============================================================================
// Bloom mip chain
// ============================================================================

/// Ordered sequence of progressively half-sized render targets.
///
/// `level(0)` is both the finest downsample target and the final upsample
/// accumulation result. Dimensions are strictly decreasing with at least
/// one level; see [`mip_chain_sizes`].
pub struct BloomMipChain {
    levels: Vec<RenderTarget>,
}

impl BloomMipChain {
    #[must_use]
    pub fn new(gpu: &GpuContext, width: u32, height: u32, max_levels: u32) -> Self {
        let levels = mip_chain_sizes(width, height, max_levels)
            .into_iter()
            .map(|(w, h)| {
                let mut target = RenderTarget::create("Bloom Mip", w, h);
                target.add_color_attachment(gpu);
                target.set_draw_buffers();
                target
            })
            .collect();
        Self { levels }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn level(&self, index: usize) -> &RenderTarget {
        &self.levels[index]
    }

    #[inline]
    #[must_use]
    pub fn view(&self, index: usize) -> &Tracked<wgpu::TextureView> {
        self.levels[index].color_view(0)
    }

    #[must_use]
    pub fn size(&self, index: usize) -> (u32, u32) {
        let level = &self.levels[index];
        (level.width(), level.height())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderTarget> {
        self.levels.iter()
    }
}

// ============================================================================
// Frame resources
// ============================================================================

/// Every persistent render target and shared sampler/dummy of the pipeline.
pub struct FrameResources {
    pub width: u32,
    pub height: u32,

    /// Depth-only target rendered from the light's point of view.
    pub shadow: RenderTarget,
    /// Three-attachment MRT: lit color, view-space normal, view-space
    /// position, plus a non-sampleable depth buffer.
    pub gbuffer: RenderTarget,
    /// Raw SSAO output (single-channel float, externally configured).
    pub ssao_raw: RenderTarget,
    /// Blurred SSAO output.
    pub ssao_blur: RenderTarget,
    /// Bright-pass extraction target.
    pub bloom_bright: RenderTarget,
    /// Bloom downsample/upsample chain.
    pub bloom: BloomMipChain,
    /// Final presentable image.
    pub output: RenderTarget,

    // Shared samplers
    pub linear_clamp_sampler: Tracked<wgpu::Sampler>,
    pub nearest_clamp_sampler: Tracked<wgpu::Sampler>,
    pub noise_sampler: Tracked<wgpu::Sampler>,
    pub shadow_sampler: Tracked<wgpu::Sampler>,

    // Neutral fallbacks for disabled/not-ready inputs
    /// 1×1 white `R16Float`: occlusion = 1 (no attenuation).
    pub white_r16: Tracked<wgpu::TextureView>,
    /// 1×1 black `Rgba16Float`: zero bloom contribution.
    pub black_rgba16: Tracked<wgpu::TextureView>,
    /// 1×1 white RGBA8 for unbound material maps.
    pub white_rgba8: Tracked<wgpu::TextureView>,
    /// 1×1×6 black cubemap for the not-ready environment.
    pub dummy_cube: Tracked<wgpu::TextureView>,
    /// 1×1 zero BRDF LUT for the not-ready environment.
    pub dummy_brdf: Tracked<wgpu::TextureView>,
}

impl FrameResources {
    /// Creates and validates all fixed-resolution targets.
    ///
    /// Any incomplete target aborts initialization with
    /// [`EmberError::IncompleteRenderTarget`].
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Result<Self> {
        let mut shadow = RenderTarget::create("Shadow Map", SHADOW_MAP_SIZE, SHADOW_MAP_SIZE);
        shadow.add_depth_texture(gpu, SHADOW_MAP_SIZE, SHADOW_MAP_SIZE);
        shadow.require_depth();

        let mut gbuffer = RenderTarget::create("G-Buffer", width, height);
        gbuffer.add_color_attachment(gpu); // 0: lit HDR color
        gbuffer.add_color_attachment(gpu); // 1: view-space normal
        gbuffer.add_color_attachment(gpu); // 2: view-space position
        gbuffer.add_depth_buffer(gpu);
        gbuffer.set_draw_buffers();
        gbuffer.require_depth();

        // SSAO buffers need single-channel storage, so the textures are
        // configured here and attached externally.
        let mut ssao_raw = RenderTarget::create("SSAO Raw", width, height);
        let (_, raw_view) = texture::create_texture_2d(
            &gpu.device,
            (width, height),
            R16F_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            1,
            "SSAO Raw",
        );
        ssao_raw.add_external_color_attachment(
            Tracked::new(raw_view),
            R16F_FORMAT,
            width,
            height,
        );
        ssao_raw.set_draw_buffers();

        let mut ssao_blur = RenderTarget::create("SSAO Blur", width, height);
        let (_, blur_view) = texture::create_texture_2d(
            &gpu.device,
            (width, height),
            R16F_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            1,
            "SSAO Blur",
        );
        ssao_blur.add_external_color_attachment(
            Tracked::new(blur_view),
            R16F_FORMAT,
            width,
            height,
        );
        ssao_blur.set_draw_buffers();

        let mut bloom_bright = RenderTarget::create("Bloom Bright", width, height);
        bloom_bright.add_color_attachment(gpu);
        bloom_bright.set_draw_buffers();

        let bloom = BloomMipChain::new(
            gpu,
            (width / 2).max(1),
            (height / 2).max(1),
            BLOOM_MIP_LEVELS,
        );

        let mut output = RenderTarget::create("Output", width, height);
        output.add_color_attachment_with_format(gpu, OUTPUT_FORMAT);
        output.set_draw_buffers();

        for target in [
            &shadow,
            &gbuffer,
            &ssao_raw,
            &ssao_blur,
            &bloom_bright,
            &output,
        ] {
            target
                .completeness()
                .map_err(|reason| EmberError::IncompleteRenderTarget {
                    name: target.label(),
                    reason,
                })?;
        }
        for level in bloom.iter() {
            level
                .completeness()
                .map_err(|reason| EmberError::IncompleteRenderTarget {
                    name: level.label(),
                    reason,
                })?;
        }

        let device = &gpu.device;
        let linear_clamp_sampler = Tracked::new(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        }));
        let nearest_clamp_sampler = Tracked::new(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Nearest Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }));
        let noise_sampler = Tracked::new(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SSAO Noise Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }));
        let shadow_sampler = Tracked::new(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        }));

        // f16 1.0 = 0x3C00, little-endian
        let white_r16 = texture::create_dummy_2d(gpu, R16F_FORMAT, &[0x00, 0x3C], "White R16F");
        let black_rgba16 = texture::create_dummy_2d(
            gpu,
            texture::HDR_FORMAT,
            &[0u8; 8],
            "Black RGBA16F",
        );
        let white_rgba8 = texture::create_dummy_2d(
            gpu,
            wgpu::TextureFormat::Rgba8Unorm,
            &[255, 255, 255, 255],
            "White RGBA8",
        );
        let dummy_cube = texture::create_dummy_cube(gpu, "Dummy Environment Cube");
        let dummy_brdf = texture::create_dummy_2d(
            gpu,
            crate::renderer::environment::BRDF_LUT_FORMAT,
            &[0u8; 4],
            "Dummy BRDF LUT",
        );

        log::debug!("Frame resources created at {width}x{height}");

        Ok(Self {
            width,
            height,
            shadow,
            gbuffer,
            ssao_raw,
            ssao_blur,
            bloom_bright,
            bloom,
            output,
            linear_clamp_sampler,
            nearest_clamp_sampler,
            noise_sampler,
            shadow_sampler,
            white_r16,
            black_rgba16,
            white_rgba8,
            dummy_cube,
            dummy_brdf,
        })
    }
}

// ============================================================================
// Pass contexts
// ============================================================================

/// Mutable context for the prepare phase: uniform uploads, bind-group
/// builds, texture registry access.
pub struct PrepareContext<'a> {
    pub gpu: &'a GpuContext,
    pub scene: &'a Scene,
    pub camera: &'a RenderCamera,
    pub frame: &'a FrameResources,
    pub statics: &'a StaticGeometry,
    pub objects: &'a ObjectBuffer,
    pub textures: &'a mut TextureRegistry,
}

/// Read-only context for the execute phase.
pub struct ExecuteContext<'a> {
    pub gpu: &'a GpuContext,
    pub scene: &'a Scene,
    pub frame: &'a FrameResources,
    pub statics: &'a StaticGeometry,
    pub objects: &'a ObjectBuffer,
}
