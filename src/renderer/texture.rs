//! GPU texture creation and the material texture registry
//!
//! Format policy, matching consumption:
//! - 8-bit color payloads: `Rgba8UnormSrgb` (color) / `Rgba8Unorm` (data)
//! - HDR payloads: `Rgba16Float`, never truncated to 8-bit
//! - Single-channel data: `R16Float`
//! - Depth: `Depth32Float` (sampleable) / `Depth24PlusStencil8` (buffer only)
//!
//! Depth textures are never bound as color and color formats never as
//! depth; the creation helpers encode the usage flags accordingly.

use rustc_hash::FxHashMap;

use crate::renderer::context::GpuContext;
use crate::renderer::tracked::Tracked;
use crate::resources::ImageData;

/// HDR working format for scene color, G-buffer data and bloom.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Single-channel float format for occlusion buffers.
pub const R16F_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;

/// Sampleable depth format (shadow maps).
pub const DEPTH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Non-sampleable combined depth/stencil format.
pub const DEPTH_BUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Presentable output format.
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Creates a 2D texture and its default view.
pub fn create_texture_2d(
    device: &wgpu::Device,
    size: (u32, u32),
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    mip_level_count: u32,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Creates a cubemap texture (six layers).
pub fn create_texture_cube(
    device: &wgpu::Device,
    face_size: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    mip_level_count: u32,
    label: &str,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: face_size,
            height: face_size,
            depth_or_array_layers: 6,
        },
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

/// Cube-shaped view across all mip levels.
#[must_use]
pub fn cube_view(texture: &wgpu::Texture, label: &str) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

/// Single-face, single-mip render view into a cubemap.
#[must_use]
pub fn cube_face_view(texture: &wgpu::Texture, face: u32, mip: u32) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Cube Face View"),
        dimension: Some(wgpu::TextureViewDimension::D2),
        base_mip_level: mip,
        mip_level_count: Some(1),
        base_array_layer: face,
        array_layer_count: Some(1),
        ..Default::default()
    })
}

/// Creates a 1×1 texture initialized from raw texel bytes.
///
/// Used for the neutral dummy bindings that stand in for disabled or
/// not-ready resources (white occlusion, black bloom, black environment).
pub fn create_dummy_2d(
    gpu: &GpuContext,
    format: wgpu::TextureFormat,
    texel: &[u8],
    label: &str,
) -> Tracked<wgpu::TextureView> {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        texel,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(texel.len() as u32),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );
    Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

/// Creates a 1×1×6 black cubemap for the not-ready environment fallback.
pub fn create_dummy_cube(gpu: &GpuContext, label: &str) -> Tracked<wgpu::TextureView> {
    let texture = create_texture_cube(
        &gpu.device,
        1,
        HDR_FORMAT,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        1,
        label,
    );
    let texel = [0u8; 8];
    for face in 0..6 {
        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: face,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &texel,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(8),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }
    Tracked::new(cube_view(&texture, label))
}

/// GPU uploads of material images, keyed by [`ImageData::id`].
///
/// Sharing one `Arc<ImageData>` across materials uploads the texture once;
/// the registry owns the GPU copies for the renderer's lifetime.
#[derive(Default)]
pub struct TextureRegistry {
    views: FxHashMap<u64, Tracked<wgpu::TextureView>>,
}

impl TextureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            views: FxHashMap::default(),
        }
    }

    /// Returns the GPU view for an image, uploading it on first use.
    pub fn view_for(&mut self, gpu: &GpuContext, image: &ImageData) -> &Tracked<wgpu::TextureView> {
        self.views.entry(image.id()).or_insert_with(|| {
            let format = if image.is_srgb() {
                wgpu::TextureFormat::Rgba8UnormSrgb
            } else {
                wgpu::TextureFormat::Rgba8Unorm
            };
            let (texture, view) = create_texture_2d(
                &gpu.device,
                (image.width(), image.height()),
                format,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                1,
                "Material Texture",
            );
            gpu.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.pixels(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(image.width() * 4),
                    rows_per_image: Some(image.height()),
                },
                wgpu::Extent3d {
                    width: image.width(),
                    height: image.height(),
                    depth_or_array_layers: 1,
                },
            );
            log::debug!(
                "Uploaded material texture {} ({}x{})",
                image.id(),
                image.width(),
                image.height()
            );
            Tracked::new(view)
        });
        &self.views[&image.id()]
    }

    /// Number of resident GPU textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
