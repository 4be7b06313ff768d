//! Scene container

use glam::Vec3;
use slotmap::SlotMap;

use crate::resources::{BloomSettings, SsaoSettings, ToneMappingSettings};
use crate::scene::entity::Entity;
use crate::scene::environment::Environment;
use crate::scene::light::DirectionalLight;

slotmap::new_key_type! {
    /// Stable key for an entity in the scene arena.
    pub struct EntityKey;
}

/// Entities plus the frame-global rendering state: light, environment,
/// background color and the post-processing settings.
pub struct Scene {
    entities: SlotMap<EntityKey, Entity>,
    entity_counter: u64,

    pub environment: Environment,
    pub light: DirectionalLight,

    pub ssao: SsaoSettings,
    pub bloom: BloomSettings,
    pub tone_mapping: ToneMappingSettings,

    background: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            entity_counter: 0,
            environment: Environment::new(),
            light: DirectionalLight::new(),
            ssao: SsaoSettings::new(),
            bloom: BloomSettings::new(),
            tone_mapping: ToneMappingSettings::new(),
            background: Vec3::new(0.1, 0.1, 0.1),
        }
    }

    /// Adds an entity, assigning a sequential name if it has none.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityKey {
        self.entity_counter += 1;
        if entity.name().is_empty() {
            entity.set_name(format!("Entity{}", self.entity_counter));
        }
        self.entities.insert(entity)
    }

    /// Removes an entity; its mesh reference drops with it.
    pub fn remove_entity(&mut self, key: EntityKey) -> Option<Entity> {
        self.entities.remove(key)
    }

    #[must_use]
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    #[must_use]
    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    /// Ordered iteration over all entities.
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn set_background(&mut self, color: Vec3) {
        self.background = color.max(Vec3::ZERO);
    }

    #[inline]
    #[must_use]
    pub fn background(&self) -> Vec3 {
        self.background
    }
}
