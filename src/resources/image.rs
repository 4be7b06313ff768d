//! Decoded image payloads
//!
//! The engine consumes already-decoded pixel buffers; the only file-format
//! boundary it owns is the equirectangular HDR environment image, which is
//! decoded here through the `image` crate.
//!
//! Format policy:
//! - [`ImageData`]: 8-bit RGBA color payloads (material maps). Color maps are
//!   sRGB, data maps (normal, metallic/roughness) are linear.
//! - [`HdrImage`]: 16-bit float RGBA radiance payloads (environment source).

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use half::f16;

use crate::errors::Result;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

fn next_image_id() -> u64 {
    NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A decoded 8-bit RGBA image.
///
/// Each image carries a unique ID; the renderer's texture registry keys GPU
/// uploads by it, so sharing one `Arc<ImageData>` across many materials
/// uploads the texture once.
#[derive(Debug)]
pub struct ImageData {
    id: u64,
    width: u32,
    height: u32,
    /// Tightly packed RGBA8 pixels, row-major, top-left origin.
    pixels: Vec<u8>,
    /// Whether the payload is sRGB-encoded color (albedo, emissive) as
    /// opposed to linear data (normal, metallic, roughness, AO).
    srgb: bool,
}

impl ImageData {
    /// Wraps an already-decoded RGBA8 pixel buffer.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height * 4`.
    #[must_use]
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>, srgb: bool) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "RGBA8 pixel buffer size mismatch"
        );
        Self {
            id: next_image_id(),
            width,
            height,
            pixels,
            srgb,
        }
    }

    /// Decodes an LDR image file into RGBA8.
    pub fn open(path: impl AsRef<Path>, srgb: bool) -> Result<Self> {
        let img = image::open(path)?.into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba8(width, height, img.into_raw(), srgb))
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    #[must_use]
    pub fn is_srgb(&self) -> bool {
        self.srgb
    }
}

/// A decoded high-dynamic-range radiance image (RGBA, 16-bit float).
///
/// Used as the equirectangular source for environment precomputation.
#[derive(Debug)]
pub struct HdrImage {
    width: u32,
    height: u32,
    /// RGBA16F texels, row-major.
    texels: Vec<f16>,
}

impl HdrImage {
    /// Decodes a radiance `.hdr` (or any float-decodable) image.
    ///
    /// The image is flipped vertically during load to match the cubemap
    /// capture convention.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path)?.flipv().into_rgba32f();
        let (width, height) = img.dimensions();
        let texels = img
            .into_raw()
            .into_iter()
            .map(f16::from_f32)
            .collect::<Vec<_>>();
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Builds an HDR image from raw linear RGBA f32 texels (tests, procedural
    /// skies).
    ///
    /// # Panics
    ///
    /// Panics if `texels.len() != width * height * 4`.
    #[must_use]
    pub fn from_rgba_f32(width: u32, height: u32, texels: &[f32]) -> Self {
        assert_eq!(
            texels.len(),
            (width * height * 4) as usize,
            "RGBA32F texel buffer size mismatch"
        );
        Self {
            width,
            height,
            texels: texels.iter().copied().map(f16::from_f32).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw texel bytes, suitable for an `Rgba16Float` upload.
    #[must_use]
    pub fn texel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}
