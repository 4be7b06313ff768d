//! Camera interfaces
//!
//! The renderer consumes any [`Camera`] implementation through a per-frame
//! [`RenderCamera`] snapshot, so camera bookkeeping stays outside the
//! pipeline core.

use glam::{Mat4, Vec3};

/// View/projection provider consumed by [`Renderer::render`](crate::Renderer::render).
pub trait Camera {
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;
    fn position(&self) -> Vec3;
}

/// Immutable camera snapshot taken at the start of a frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderCamera {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl RenderCamera {
    #[must_use]
    pub fn capture(camera: &dyn Camera) -> Self {
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            position: camera.position(),
        }
    }
}

/// A perspective camera orbiting a target point.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Azimuth around the Y axis, radians.
    pub yaw: f32,
    /// Elevation above the XZ plane, radians. Clamped to avoid the poles.
    pub pitch: f32,

    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    #[must_use]
    pub fn new(aspect: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            yaw: 0.0,
            pitch: 0.4,
            fov_y: 60.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 200.0,
        }
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-1.5, 1.5);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).max(0.5);
    }
}

impl Camera for OrbitCamera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(
                cos_pitch * cos_yaw,
                sin_pitch,
                cos_pitch * sin_yaw,
            ) * self.distance
    }
}
