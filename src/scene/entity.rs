//! Scene entities

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::resources::{Material, Mesh};

/// A renderable object: transform, shared mesh reference, material by value.
///
/// Entities are created and removed by the embedding application (the
/// scene-editing collaborator); the mesh's GPU buffers are established
/// lazily on its first draw.
#[derive(Debug)]
pub struct Entity {
    pub position: Vec3,
    /// Euler rotation in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,

    mesh: Arc<Mesh>,
    pub material: Material,

    name: String,
}

impl Entity {
    #[must_use]
    pub fn new(mesh: Arc<Mesh>, material: Material) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            mesh,
            material,
            name: String::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Arc<Mesh>) {
        self.mesh = mesh;
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Model matrix: translate, then rotate X/Y/Z, then scale.
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_scale(self.scale)
    }
}
