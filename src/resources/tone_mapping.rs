//! Tone Mapping Configuration
//!
//! Exposure-based HDR-to-display mapping applied by the composite pass:
//! `mapped = 1 - exp(-color * exposure)`. Gamma encoding is handled by the
//! sRGB output target, not the shader.

/// Tone mapping configuration.
#[derive(Debug, Clone)]
pub struct ToneMappingSettings {
    exposure: f32,
}

impl Default for ToneMappingSettings {
    fn default() -> Self {
        Self { exposure: 1.0 }
    }
}

impl ToneMappingSettings {
    /// Creates new tone mapping settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exposure multiplier.
    ///
    /// Values above 1.0 brighten the image, values below darken it.
    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure.max(0.0);
    }

    /// Returns the current exposure value.
    #[inline]
    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.exposure
    }
}
