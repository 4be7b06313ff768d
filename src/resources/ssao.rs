//! SSAO (Screen Space Ambient Occlusion) Configuration
//!
//! This module defines SSAO settings as pure data, following the same
//! pattern as [`BloomSettings`](super::bloom::BloomSettings) and
//! [`ToneMappingSettings`](super::tone_mapping::ToneMappingSettings), plus
//! the kernel and rotation-noise generators used by the SSAO pass.
//!
//! # Algorithm
//!
//! 1. A hemisphere sample kernel of [`KERNEL_SIZE`] vectors oriented along
//!    +Z, with magnitudes scaled by a quadratic curve so sample density
//!    increases near the origin (nearby occluders matter more)
//! 2. A 4×4 tiled rotation-noise texture that randomizes the kernel
//!    orientation per pixel, breaking banding while keeping the sample
//!    count low
//! 3. A fixed-radius box blur that suppresses the per-sample noise
//!
//! Kernel and noise are regenerated on every pipeline init from seeded
//! RNGs; runs are behaviorally (not bit-) identical, and tests assert only
//! the statistical properties.

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Number of hemisphere samples in the occlusion kernel.
pub const KERNEL_SIZE: usize = 64;

/// Side length of the tiled rotation-noise texture.
pub const NOISE_SIZE: u32 = 4;

/// SSAO post-processing configuration.
///
/// Owned by the [`Scene`](crate::scene::Scene); the SSAO pass reads these
/// values during `prepare` and never writes them. Toggling `enabled` off
/// makes the composite pass treat occlusion as a neutral factor; it does
/// not unbind anything.
#[derive(Debug, Clone)]
pub struct SsaoSettings {
    /// Whether SSAO is enabled.
    pub enabled: bool,

    radius: f32,
    bias: f32,
    power: f32,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 0.5,
            bias: 0.025,
            power: 1.0,
        }
    }
}

impl SsaoSettings {
    /// Creates new SSAO settings with default values (disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether SSAO is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the sampling radius in view-space units.
    ///
    /// Larger values detect occlusion from more distant geometry;
    /// typical range is 0.1–2.0.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.01);
    }

    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Sets the depth bias that prevents self-occlusion artifacts.
    ///
    /// Typical range is 0.01–0.05.
    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Sets the occlusion exponent. Higher values darken creases more.
    pub fn set_power(&mut self, power: f32) {
        self.power = power.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn power(&self) -> f32 {
        self.power
    }
}

// ============================================================================
// Kernel & Noise Generation
// ============================================================================

/// Generates the hemisphere sample kernel.
///
/// Every sample lies in the unit hemisphere around +Z (`z >= 0`); magnitudes
/// follow a quadratic ramp from 0.1 to 1.0 over the sample index, biasing
/// density toward the origin. The per-fragment reorientation to the surface
/// normal happens in the shader.
#[must_use]
pub fn generate_ssao_kernel() -> Vec<Vec4> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut kernel = Vec::with_capacity(KERNEL_SIZE);

    for i in 0..KERNEL_SIZE {
        let mut sample = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(0.01..1.0),
        )
        .normalize();

        sample *= rng.random_range(0.0..1.0f32);
        sample *= kernel_scale(i);

        kernel.push(Vec4::new(sample.x, sample.y, sample.z, 0.0));
    }
    kernel
}

/// Generates the 4×4 rotation-noise texture (16 RGBA8 pixels).
///
/// Each pixel encodes a random tangent-plane rotation vector in XY (Z = 0).
/// The texture must be sampled with `Repeat` addressing and `Nearest`
/// filtering so it tiles across the frame.
#[must_use]
pub fn generate_ssao_noise() -> Vec<[u8; 4]> {
    let mut rng = StdRng::seed_from_u64(12345);
    let mut noise = Vec::with_capacity((NOISE_SIZE * NOISE_SIZE) as usize);
    for _ in 0..NOISE_SIZE * NOISE_SIZE {
        let xy = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            0.0,
        )
        .normalize();

        noise.push([
            ((xy.x * 0.5 + 0.5) * 255.0) as u8,
            ((xy.y * 0.5 + 0.5) * 255.0) as u8,
            0,
            255,
        ]);
    }
    noise
}

/// Magnitude scaling for sample `index`: a quadratic ramp from 0.1 to 1.0,
/// monotonically non-decreasing, so early samples cluster near the origin.
#[must_use]
pub fn kernel_scale(index: usize) -> f32 {
    let t = index as f32 / KERNEL_SIZE as f32;
    lerp(0.1, 1.0, t * t)
}

fn lerp(a: f32, b: f32, f: f32) -> f32 {
    a + f * (b - a)
}
