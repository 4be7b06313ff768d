//! PBR material description
//!
//! A [`Material`] is a plain value type: scalar PBR parameters plus optional
//! texture references and per-channel "use map" flags. Entities hold
//! materials by value; textures are shared `Arc<ImageData>` references.
//!
//! # Map-flag invariant
//!
//! A set [`MapFlags`] bit whose texture reference is `None` must degrade to
//! the scalar parameter, never sample a missing binding. The invariant is
//! enforced in [`Material::shading_flags`], which the entity draw step uses
//! to pack the per-object uniforms: the flag survives only when the
//! corresponding texture is present.

use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec3;

use crate::resources::ImageData;

bitflags! {
    /// Per-channel texture toggles, mirrored bit-for-bit in the shader.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MapFlags: u32 {
        const ALBEDO    = 1 << 0;
        const NORMAL    = 1 << 1;
        const METALLIC  = 1 << 2;
        const ROUGHNESS = 1 << 3;
        const AO        = 1 << 4;
        const EMISSIVE  = 1 << 5;
    }
}

/// Scalar PBR parameters, optional texture maps and map toggles.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
    pub emissive: Vec3,

    pub albedo_map: Option<Arc<ImageData>>,
    pub normal_map: Option<Arc<ImageData>>,
    pub metallic_map: Option<Arc<ImageData>>,
    pub roughness_map: Option<Arc<ImageData>>,
    pub ao_map: Option<Arc<ImageData>>,
    pub emissive_map: Option<Arc<ImageData>>,

    /// Which maps the user wants sampled. See [`Material::shading_flags`]
    /// for the effective set.
    pub use_maps: MapFlags,
}

impl Material {
    /// A matte white default material.
    #[must_use]
    pub fn new() -> Self {
        Self {
            albedo: Vec3::ONE,
            metallic: 0.0,
            roughness: 1.0,
            ao: 0.25,
            emissive: Vec3::ZERO,
            ..Default::default()
        }
    }

    /// Returns the map reference for one flag bit.
    #[must_use]
    pub fn map_for(&self, flag: MapFlags) -> Option<&Arc<ImageData>> {
        match flag {
            MapFlags::ALBEDO => self.albedo_map.as_ref(),
            MapFlags::NORMAL => self.normal_map.as_ref(),
            MapFlags::METALLIC => self.metallic_map.as_ref(),
            MapFlags::ROUGHNESS => self.roughness_map.as_ref(),
            MapFlags::AO => self.ao_map.as_ref(),
            MapFlags::EMISSIVE => self.emissive_map.as_ref(),
            _ => None,
        }
    }

    /// The flags that may actually be sampled: requested flags whose texture
    /// reference is present. A requested map without a texture falls back to
    /// the scalar parameter.
    #[must_use]
    pub fn shading_flags(&self) -> MapFlags {
        let mut flags = MapFlags::empty();
        for flag in [
            MapFlags::ALBEDO,
            MapFlags::NORMAL,
            MapFlags::METALLIC,
            MapFlags::ROUGHNESS,
            MapFlags::AO,
            MapFlags::EMISSIVE,
        ] {
            if self.use_maps.contains(flag) && self.map_for(flag).is_some() {
                flags |= flag;
            }
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_without_texture_falls_back_to_scalar() {
        let mut material = Material::new();
        material.use_maps = MapFlags::ALBEDO | MapFlags::ROUGHNESS;
        // No textures attached: nothing may be sampled.
        assert_eq!(material.shading_flags(), MapFlags::empty());
    }

    #[test]
    fn flag_with_texture_survives() {
        let mut material = Material::new();
        material.use_maps = MapFlags::ALBEDO;
        material.albedo_map = Some(Arc::new(ImageData::from_rgba8(
            1,
            1,
            vec![255, 255, 255, 255],
            true,
        )));
        assert_eq!(material.shading_flags(), MapFlags::ALBEDO);
    }

    #[test]
    fn texture_without_flag_is_ignored() {
        let mut material = Material::new();
        material.normal_map = Some(Arc::new(ImageData::from_rgba8(
            1,
            1,
            vec![128, 128, 255, 255],
            false,
        )));
        assert_eq!(material.shading_flags(), MapFlags::empty());
    }
}
