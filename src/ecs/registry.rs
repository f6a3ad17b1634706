//! Type-indexed registry composing one `ComponentMap<T>` per component type

use std::any::TypeId;
use std::collections::HashMap;

use tracing::warn;

use super::{Component, ComponentMap, ComponentStorage, EcsError, Entity};

pub struct ComponentRegistry {
    storages: HashMap<TypeId, Box<dyn ComponentStorage>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            storages: HashMap::new(),
        }
    }

    /// Returns the map for `T`, creating it on first use.
    pub fn register<T: Component>(&mut self) -> &mut ComponentMap<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentMap::<T>::new()));
        storage
            .as_any_mut()
            .downcast_mut::<ComponentMap<T>>()
            .expect("storage registered under the TypeId of its component")
    }

    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), EcsError> {
        self.register::<T>().insert(entity, component)
    }

    pub fn replace_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        self.register::<T>().replace(entity, component)
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        match self.component_array_mut::<T>() {
            Some(storage) => storage.remove(entity),
            None => {
                warn!(
                    %entity,
                    component = std::any::type_name::<T>(),
                    "remove on unregistered component type"
                );
                None
            }
        }
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.component_array::<T>()?.get(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.component_array_mut::<T>()?.get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.component_array::<T>()
            .map(|storage| storage.contains(entity))
            .unwrap_or(false)
    }

    pub fn component_array<T: Component>(&self) -> Option<&ComponentMap<T>> {
        let storage = self.storages.get(&TypeId::of::<T>())?;
        storage.as_any().downcast_ref::<ComponentMap<T>>()
    }

    pub fn component_array_mut<T: Component>(&mut self) -> Option<&mut ComponentMap<T>> {
        let storage = self.storages.get_mut(&TypeId::of::<T>())?;
        storage.as_any_mut().downcast_mut::<ComponentMap<T>>()
    }

    /// Borrows two distinct maps mutably at once. `None` if `A` and `B` are the
    /// same type or either map has not been registered.
    pub fn pair_mut<A: Component, B: Component>(
        &mut self,
    ) -> Option<(&mut ComponentMap<A>, &mut ComponentMap<B>)> {
        let (a_id, b_id) = (TypeId::of::<A>(), TypeId::of::<B>());
        if a_id == b_id {
            return None;
        }
        let mut first = None;
        let mut second = None;
        for (type_id, storage) in self.storages.iter_mut() {
            if *type_id == a_id {
                first = storage.as_any_mut().downcast_mut::<ComponentMap<A>>();
            } else if *type_id == b_id {
                second = storage.as_any_mut().downcast_mut::<ComponentMap<B>>();
            }
        }
        Some((first?, second?))
    }

    /// Drops every component owned by `entity`; returns how many were removed.
    pub fn remove_all(&mut self, entity: Entity) -> usize {
        self.storages
            .values_mut()
            .map(|storage| storage.remove_entity(entity))
            .filter(|removed| *removed)
            .count()
    }

    /// Deep-copies every component of `from` onto `to`.
    pub fn clone_all(&mut self, from: Entity, to: Entity) -> Result<usize, EcsError> {
        let mut copied = 0;
        for storage in self.storages.values_mut() {
            if storage.clone_entity(from, to)? {
                copied += 1;
            }
        }
        Ok(copied)
    }

    pub fn component_count(&self, entity: Entity) -> usize {
        self.storages
            .values()
            .filter(|storage| storage.has(entity))
            .count()
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.storages.values().map(|s| s.type_name()).collect();
        names.sort_unstable();
        names
    }

    pub fn clear(&mut self) {
        for storage in self.storages.values_mut() {
            storage.clear();
        }
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }
    impl Component for Velocity {}

    #[test]
    fn test_registry_components() {
        let mut registry = ComponentRegistry::new();
        let entity = Entity::new(0, 1);

        registry
            .add_component(entity, Position { x: 1.0, y: 2.0 })
            .unwrap();
        registry
            .add_component(entity, Velocity { dx: 0.5, dy: 0.5 })
            .unwrap();

        assert!(registry.has_component::<Position>(entity));
        assert!(registry.has_component::<Velocity>(entity));
        assert_eq!(registry.component_count(entity), 2);

        if let Some(vel) = registry.get_component_mut::<Velocity>(entity) {
            vel.dx = 1.0;
        }
        assert_eq!(registry.get_component::<Velocity>(entity).unwrap().dx, 1.0);
    }

    #[test]
    fn remove_then_get_is_none() {
        let mut registry = ComponentRegistry::new();
        let entity = Entity::new(3, 1);

        assert!(registry.remove_component::<Position>(entity).is_none());
        registry
            .add_component(entity, Position { x: 0.0, y: 0.0 })
            .unwrap();
        assert!(registry.remove_component::<Position>(entity).is_some());
        assert!(registry.get_component::<Position>(entity).is_none());
    }

    #[test]
    fn pair_mut_borrows_two_maps() {
        let mut registry = ComponentRegistry::new();
        let entity = Entity::new(0, 1);
        registry
            .add_component(entity, Position { x: 1.0, y: 1.0 })
            .unwrap();
        registry
            .add_component(entity, Velocity { dx: 2.0, dy: 3.0 })
            .unwrap();

        let (positions, velocities) = registry.pair_mut::<Position, Velocity>().unwrap();
        let vel = velocities.get(entity).unwrap().clone();
        let pos = positions.get_mut(entity).unwrap();
        pos.x += vel.dx;
        pos.y += vel.dy;

        assert_eq!(
            registry.get_component::<Position>(entity),
            Some(&Position { x: 3.0, y: 4.0 })
        );
        assert!(registry.pair_mut::<Position, Position>().is_none());
    }

    #[test]
    fn clone_all_and_remove_all() {
        let mut registry = ComponentRegistry::new();
        let source = Entity::new(0, 1);
        let copy = Entity::new(1, 1);
        registry
            .add_component(source, Position { x: 1.0, y: 1.0 })
            .unwrap();
        registry
            .add_component(source, Velocity { dx: 0.0, dy: 0.0 })
            .unwrap();

        assert_eq!(registry.clone_all(source, copy).unwrap(), 2);
        registry.get_component_mut::<Position>(copy).unwrap().x = 50.0;
        assert_eq!(registry.get_component::<Position>(source).unwrap().x, 1.0);

        assert_eq!(registry.remove_all(source), 2);
        assert_eq!(registry.component_count(source), 0);
        assert_eq!(registry.component_count(copy), 2);
    }
}
