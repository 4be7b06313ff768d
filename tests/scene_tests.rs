//! Scene & Lighting Tests
//!
//! Tests for:
//! - Entity arena add/remove, naming, transform composition
//! - Material map-flag fallback at the draw-data level
//! - Directional light shadow projection (fixed orthographic volume)
//! - Environment readiness guard

use std::sync::Arc;

use glam::{Vec3, Vec4};

use ember::resources::{MapFlags, Material, Mesh};
use ember::scene::light::{
    DirectionalLight, SHADOW_DISTANCE, SHADOW_FAR, SHADOW_NEAR, SHADOW_ORTHO_EXTENT,
};
use ember::{Entity, Scene};

const EPSILON: f32 = 1e-4;

fn test_entity() -> Entity {
    Entity::new(Arc::new(Mesh::cube()), Material::new())
}

// ============================================================================
// Entity / Scene
// ============================================================================

#[test]
fn added_entities_get_sequential_names() {
    let mut scene = Scene::new();
    let a = scene.add_entity(test_entity());
    let b = scene.add_entity(test_entity());
    assert_eq!(scene.entity(a).unwrap().name(), "Entity1");
    assert_eq!(scene.entity(b).unwrap().name(), "Entity2");
}

#[test]
fn explicit_names_are_preserved() {
    let mut scene = Scene::new();
    let mut entity = test_entity();
    entity.set_name("Hero");
    let key = scene.add_entity(entity);
    assert_eq!(scene.entity(key).unwrap().name(), "Hero");
}

#[test]
fn removed_entities_are_gone() {
    let mut scene = Scene::new();
    let key = scene.add_entity(test_entity());
    assert_eq!(scene.entity_count(), 1);

    let removed = scene.remove_entity(key);
    assert!(removed.is_some());
    assert_eq!(scene.entity_count(), 0);
    assert!(scene.entity(key).is_none());
    assert!(scene.remove_entity(key).is_none());
}

#[test]
fn model_matrix_applies_translation() {
    let mut entity = test_entity();
    entity.position = Vec3::new(1.0, 2.0, 3.0);
    let transformed = entity.model_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert!((transformed.truncate() - entity.position).length() < EPSILON);
}

#[test]
fn model_matrix_applies_scale_before_rotation() {
    let mut entity = test_entity();
    entity.scale = Vec3::splat(2.0);
    entity.rotation.y = 90.0;
    // Local +X, scaled to 2, rotated 90° about Y -> -Z.
    let transformed = entity.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
    assert!((transformed.truncate() - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-3);
}

// ============================================================================
// Material fallback
// ============================================================================

#[test]
fn map_flag_without_texture_degrades_to_scalar() {
    let mut material = Material::new();
    material.albedo = Vec3::new(0.5, 0.6, 0.7);
    material.use_maps = MapFlags::ALBEDO;
    // albedo_map stays None: nothing may be sampled, the scalar survives.
    assert!(!material.shading_flags().contains(MapFlags::ALBEDO));
    assert_eq!(material.albedo, Vec3::new(0.5, 0.6, 0.7));
}

// ============================================================================
// Directional light
// ============================================================================

#[test]
fn light_direction_is_normalized() {
    let mut light = DirectionalLight::new();
    light.set_direction(Vec3::new(0.0, -10.0, 0.0));
    assert!((light.direction().length() - 1.0).abs() < EPSILON);
}

#[test]
fn zero_direction_keeps_previous() {
    let mut light = DirectionalLight::new();
    let before = light.direction();
    light.set_direction(Vec3::ZERO);
    assert_eq!(light.direction(), before);
}

#[test]
fn shadow_volume_constants() {
    assert_eq!(SHADOW_ORTHO_EXTENT, 35.0);
    assert_eq!(SHADOW_NEAR, 0.1);
    assert_eq!(SHADOW_FAR, 75.0);
    assert_eq!(SHADOW_DISTANCE, 50.0);
}

#[test]
fn scene_origin_projects_to_shadow_map_center() {
    let mut light = DirectionalLight::new();
    light.set_direction(Vec3::new(-0.3, -1.0, -0.2));

    let clip = light.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    let ndc = clip.truncate() / clip.w;
    assert!(ndc.x.abs() < EPSILON, "origin off-center: x = {}", ndc.x);
    assert!(ndc.y.abs() < EPSILON, "origin off-center: y = {}", ndc.y);
    assert!(
        (0.0..=1.0).contains(&ndc.z),
        "origin outside depth range: z = {}",
        ndc.z
    );
}

#[test]
fn ortho_extent_reaches_the_shadow_map_edge() {
    let mut light = DirectionalLight::new();
    light.set_direction(Vec3::NEG_Y);

    // With the light looking straight down, a point at the orthographic
    // half-extent lands on the map edge.
    let clip = light.view_projection() * Vec4::new(SHADOW_ORTHO_EXTENT, 0.0, 0.0, 1.0);
    let ndc = clip.truncate() / clip.w;
    let max_axis = ndc.x.abs().max(ndc.y.abs());
    assert!(
        (max_axis - 1.0).abs() < 1e-3,
        "half-extent point should project to the edge, got {ndc:?}"
    );
}

#[test]
fn points_behind_the_far_plane_fall_outside() {
    let mut light = DirectionalLight::new();
    light.set_direction(Vec3::NEG_Y);

    // SHADOW_DISTANCE below the origin, along the light: depth beyond far.
    let clip = light.view_projection() * Vec4::new(0.0, -(SHADOW_FAR - SHADOW_DISTANCE) - 1.0, 0.0, 1.0);
    let ndc_z = clip.z / clip.w;
    assert!(ndc_z > 1.0, "expected z beyond the far plane, got {ndc_z}");
}

// ============================================================================
// Environment readiness
// ============================================================================

#[test]
fn fresh_scene_environment_is_not_ready() {
    let scene = Scene::new();
    assert!(!scene.environment.is_ready());
    assert!(scene.environment.maps().is_none());
}

#[test]
fn clearing_the_environment_returns_to_not_ready() {
    let mut scene = Scene::new();
    scene.environment.clear();
    assert!(!scene.environment.is_ready());
}
