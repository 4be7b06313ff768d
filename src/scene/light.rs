//! Directional light and its shadow projection

use glam::{Mat4, Vec3};

/// World-space half-extent of the shadow orthographic volume.
pub const SHADOW_ORTHO_EXTENT: f32 = 35.0;
/// Shadow projection near plane.
pub const SHADOW_NEAR: f32 = 0.1;
/// Shadow projection far plane.
pub const SHADOW_FAR: f32 = 75.0;
/// Distance from the scene origin at which the shadow eye is placed.
pub const SHADOW_DISTANCE: f32 = 50.0;

/// The scene's single directional light.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Direction the light travels, toward the scene. Normalized by the
    /// setter.
    direction: Vec3,
    color: Vec3,
    intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.4, -1.0, -0.3).normalize(),
            color: Vec3::ONE,
            intensity: 3.0,
        }
    }
}

impl DirectionalLight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the travel direction of the light. Zero-length input keeps the
    /// previous direction.
    pub fn set_direction(&mut self, direction: Vec3) {
        if direction.length_squared() > 1e-6 {
            self.direction = direction.normalize();
        }
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color.max(Vec3::ZERO);
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Light-space view-projection for the shadow pass.
    ///
    /// The eye sits at `-direction * SHADOW_DISTANCE` looking at the scene
    /// origin through a fixed orthographic volume of ±[`SHADOW_ORTHO_EXTENT`]
    /// with depth range [`SHADOW_NEAR`]..[`SHADOW_FAR`].
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        let dir = self.direction;
        let up = if dir.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
        let view = Mat4::look_at_rh(-dir * SHADOW_DISTANCE, Vec3::ZERO, up);
        let proj = Mat4::orthographic_rh(
            -SHADOW_ORTHO_EXTENT,
            SHADOW_ORTHO_EXTENT,
            -SHADOW_ORTHO_EXTENT,
            SHADOW_ORTHO_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
        proj * view
    }
}
