//! The world: entity registry, component maps, archetypes and the spatial
//! partition, passed explicitly to every system

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::collision::{
    check_cursor_collision, update_bounding_boxes, CollisionEvent, CollisionStats,
};
use crate::components::{Aabb, Motion};
use crate::config::PartitionConfig;
use crate::ecs::{
    Archetype, ArchetypeLibrary, Component, ComponentMap, ComponentRegistry, EcsError, Entity,
    EntityInfo, EntityRegistry,
};
use crate::spatial::{ComputedBounds, LevelBounds, NavGrid, Partition, SpatialError};

pub struct World {
    entities: EntityRegistry,
    components: ComponentRegistry,
    archetypes: ArchetypeLibrary,
    partition: Partition,
    partition_config: PartitionConfig,
    events: Vec<CollisionEvent>,
    collision_stats: CollisionStats,
    frame: u64,
}

impl World {
    pub fn new() -> Self {
        Self::with_partition(PartitionConfig::default())
    }

    pub fn with_partition(config: PartitionConfig) -> Self {
        Self {
            entities: EntityRegistry::new(),
            components: ComponentRegistry::new(),
            archetypes: ArchetypeLibrary::new(),
            partition: Partition::new(config.max_entities),
            partition_config: config,
            events: Vec::new(),
            collision_stats: CollisionStats::default(),
            frame: 0,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn advance_frame(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    pub fn archetypes(&self) -> &ArchetypeLibrary {
        &self.archetypes
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn partition_config(&self) -> &PartitionConfig {
        &self.partition_config
    }

    pub fn entity_count(&self) -> usize {
        self.entities.count()
    }

    // --- entities ---

    pub fn create_empty_entity(&mut self) -> Entity {
        self.entities.create(EntityInfo::default())
    }

    pub fn create_named_entity(&mut self, name: impl Into<String>) -> Entity {
        self.entities.create(EntityInfo::named(name))
    }

    pub fn get_entity(&self, entity: Entity) -> Option<&EntityInfo> {
        self.entities.get(entity)
    }

    pub fn rename_entity(&mut self, entity: Entity, name: impl Into<String>) -> bool {
        match self.entities.get_mut(entity) {
            Some(info) => {
                info.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Deep-copies `entity` and all its components onto a fresh handle.
    pub fn clone_entity(&mut self, entity: Entity) -> Option<Entity> {
        let info = self.entities.get(entity)?.clone();
        let copy = self.entities.create(info);
        match self.components.clone_all(entity, copy) {
            Ok(count) => {
                debug!(source = %entity, copy = %copy, components = count, "entity cloned");
                Some(copy)
            }
            Err(err) => {
                warn!(source = %entity, error = %err, "entity clone failed");
                self.discard(copy);
                None
            }
        }
    }

    /// Registers a template; returns the one it replaced.
    pub fn add_archetype(&mut self, archetype: Archetype) -> Option<Archetype> {
        self.archetypes.insert(archetype)
    }

    /// Stamps a new entity from the named template.
    pub fn clone_archetype(&mut self, name: &str) -> Option<Entity> {
        let Some(archetype) = self.archetypes.get(name) else {
            warn!(archetype = name, "unknown archetype");
            return None;
        };
        let entity = self.entities.create(EntityInfo {
            name: name.to_string(),
            archetype: Some(name.to_string()),
        });
        if let Err(err) = archetype.instantiate(&mut self.components, entity) {
            warn!(archetype = name, error = %err, "archetype instantiation failed");
            self.discard(entity);
            return None;
        }
        Some(entity)
    }

    fn discard(&mut self, entity: Entity) {
        self.components.remove_all(entity);
        self.entities.free(entity);
    }

    /// Marks `entity` for removal at the end of the frame. It stays
    /// retrievable until then.
    pub fn delete_entity(&mut self, entity: Entity) -> bool {
        let marked = self.entities.mark_for_delete(entity);
        if !marked {
            debug!(%entity, "delete requested for dead entity");
        }
        marked
    }

    /// Sweeps every pending deletion: components, partition cells, then the
    /// slot.
    pub fn update_entity_map(&mut self) -> usize {
        let pending = self.entities.take_pending();
        let mut removed = 0;
        for entity in pending {
            self.components.remove_all(entity);
            self.partition.evict(entity);
            if self.entities.free(entity) {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, remaining = self.entities.count(), "entity sweep");
        }
        removed
    }

    // --- components ---

    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), EcsError> {
        if !self.entities.is_alive(entity) {
            warn!(%entity, component = std::any::type_name::<T>(), "add on dead entity");
            return Err(EcsError::DeadEntity(entity));
        }
        self.components.add_component(entity, component)
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.components.remove_component(entity)
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.get_component(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_component_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.components.has_component::<T>(entity)
    }

    pub fn component_array<T: Component>(&self) -> Option<&ComponentMap<T>> {
        self.components.component_array()
    }

    pub fn component_array_mut<T: Component>(&mut self) -> Option<&mut ComponentMap<T>> {
        self.components.component_array_mut()
    }

    // --- spatial ---

    pub fn init_partition(&mut self, bounds: &dyn LevelBounds) -> Result<(), SpatialError> {
        self.partition.init(bounds, self.partition_config.cell_size)
    }

    /// Sizes the partition around the current AABBs plus the configured
    /// margin.
    pub fn init_partition_from_components(&mut self) -> Result<(), SpatialError> {
        let bounds =
            ComputedBounds::from_components(&self.components, self.partition_config.bounds_margin);
        self.init_partition(&bounds)
    }

    /// Rebuilds the partition from the AABB map, binning moving boxes over
    /// the distance they cover in `dt`, and recomputes the camera's active
    /// set. Returns how many boxes were placed.
    pub fn rebuild_partition(&mut self, camera: &Camera, dt: f32) -> usize {
        let placed = match self.components.component_array::<Aabb>() {
            Some(aabbs) => self.partition.rebuild(
                aabbs,
                self.components.component_array::<Motion>(),
                dt,
                self.entities.slot_capacity(),
            ),
            None => {
                self.partition.reset(self.entities.slot_capacity());
                0
            }
        };
        self.partition.update_active(camera);
        placed
    }

    /// Lowest-numbered live entity whose box contains `point`.
    pub fn pick(&self, point: Vec2) -> Option<Entity> {
        self.components
            .component_array::<Aabb>()?
            .iter()
            .filter(|(_, aabb)| aabb.alive && check_cursor_collision(point, aabb.rect()))
            .map(|(entity, _)| entity)
            .min()
    }

    /// Navigation grid over the partition's cells with wall boxes blocked.
    pub fn build_nav_grid(&mut self) -> Option<NavGrid> {
        let grid = self.partition.grid()?.clone();
        update_bounding_boxes(&mut self.components);
        let aabbs = self.components.register::<Aabb>();
        let nav = NavGrid::build(grid, aabbs);
        info!(width = nav.grid().width(), height = nav.grid().height(), "navigation grid ready");
        Some(nav)
    }

    // --- collision results ---

    pub fn record_collisions(&mut self, stats: CollisionStats, events: Vec<CollisionEvent>) {
        self.collision_stats = stats;
        self.events = events;
    }

    pub fn collision_stats(&self) -> CollisionStats {
        self.collision_stats
    }

    /// Events produced by the last collision pass.
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
