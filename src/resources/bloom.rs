//! Bloom Post-Processing Configuration
//!
//! This module defines bloom settings as pure data, following the same
//! pattern as [`ToneMappingSettings`](super::tone_mapping::ToneMappingSettings).
//!
//! The bloom pass extracts bright regions with a soft-knee threshold, then
//! walks a progressive downsample/upsample mip chain and additively
//! accumulates the result back into the finest level. The mip-chain
//! geometry is computed here so it can be validated without a GPU.

/// Bloom post-processing configuration.
///
/// Owned by the [`Scene`](crate::scene::Scene); the bloom pass reads these
/// values during `prepare` and never writes them.
#[derive(Debug, Clone)]
pub struct BloomSettings {
    /// Whether bloom is enabled.
    pub enabled: bool,

    /// Maximum number of levels in the downsample/upsample chain. The
    /// actual count is clamped to what the render-target size allows.
    max_mip_levels: u32,

    threshold: f32,
    soft_knee: f32,
    filter_radius: f32,
    strength: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_mip_levels: 6,
            threshold: 1.0,
            soft_knee: 0.5,
            filter_radius: 0.005,
            strength: 0.04,
        }
    }
}

impl BloomSettings {
    /// Creates new bloom settings with default values (disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether bloom is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the bright-pass luminance threshold.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Sets the soft-knee fraction blended below the hard threshold.
    ///
    /// 0.0 is a hard cutoff; higher values roll bright regions in smoothly.
    pub fn set_soft_knee(&mut self, knee: f32) {
        self.soft_knee = knee.clamp(0.0, 1.0);
    }

    #[inline]
    #[must_use]
    pub fn soft_knee(&self) -> f32 {
        self.soft_knee
    }

    /// Sets the upsampling tent-filter radius in UV units.
    ///
    /// Larger values produce softer, wider bloom.
    pub fn set_filter_radius(&mut self, radius: f32) {
        self.filter_radius = radius.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn filter_radius(&self) -> f32 {
        self.filter_radius
    }

    /// Sets how strongly bloom contributes to the final image.
    ///
    /// A value of 0.0 effectively disables bloom; typical values are
    /// 0.01–0.1.
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Sets the maximum number of mip levels.
    pub fn set_max_mip_levels(&mut self, levels: u32) {
        self.max_mip_levels = levels.clamp(1, 16);
    }

    #[inline]
    #[must_use]
    pub fn max_mip_levels(&self) -> u32 {
        self.max_mip_levels
    }
}

/// Computes the bloom mip-chain resolutions for a given base size.
///
/// `sizes[0] == (width, height)` and each following level is the floor of
/// half the previous one. The chain stops before a dimension would reach
/// zero, so at least one level is always returned and dimensions are
/// strictly decreasing.
#[must_use]
pub fn mip_chain_sizes(width: u32, height: u32, max_levels: u32) -> Vec<(u32, u32)> {
    let mut sizes = Vec::with_capacity(max_levels.max(1) as usize);
    let (mut w, mut h) = (width.max(1), height.max(1));
    sizes.push((w, h));
    while (sizes.len() as u32) < max_levels.max(1) && w / 2 > 0 && h / 2 > 0 {
        w /= 2;
        h /= 2;
        sizes.push((w, h));
    }
    sizes
}
