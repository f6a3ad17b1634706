//! Sparse per-type component storage

use std::any::Any;
use std::collections::HashMap;

use tracing::warn;

use super::{EcsError, Entity};

/// Trait for components.
///
/// Components are owned by exactly one entity. `attach` runs every time an
/// instance is stored for an owner, including deep copies made by entity and
/// archetype cloning, so components holding a back-reference can rebind it.
pub trait Component: Clone + Send + Sync + 'static {
    fn attach(&mut self, _owner: Entity) {}
}

/// Type-erased component storage
pub trait ComponentStorage: Send + Sync {
    fn type_name(&self) -> &'static str;
    /// Silent removal used by the entity sweep.
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn has(&self, entity: Entity) -> bool;
    /// Deep-copies the component owned by `from` onto `to`. `Ok(false)` when
    /// `from` has none.
    fn clone_entity(&mut self, from: Entity, to: Entity) -> Result<bool, EcsError>;
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Concrete storage for a specific component type
pub struct ComponentMap<T: Component> {
    data: HashMap<Entity, T>,
}

impl<T: Component> ComponentMap<T> {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Stores `component` for `entity`. A second insert for the same entity is
    /// rejected and the original instance stays in place.
    pub fn insert(&mut self, entity: Entity, mut component: T) -> Result<(), EcsError> {
        if self.data.contains_key(&entity) {
            let err = EcsError::DuplicateComponent {
                entity,
                component: std::any::type_name::<T>(),
            };
            warn!(%err, "rejected duplicate component");
            return Err(err);
        }
        component.attach(entity);
        self.data.insert(entity, component);
        Ok(())
    }

    /// Stores `component`, handing back whatever instance it displaced.
    pub fn replace(&mut self, entity: Entity, mut component: T) -> Option<T> {
        component.attach(entity);
        self.data.insert(entity, component)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let removed = self.data.remove(&entity);
        if removed.is_none() {
            warn!(
                %entity,
                component = std::any::type_name::<T>(),
                "remove on missing component"
            );
        }
        removed
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.data.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.data.get_mut(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.data.contains_key(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.data.iter().map(|(id, comp)| (*id, comp))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.data.iter_mut().map(|(id, comp)| (*id, comp))
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.data.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Component> Default for ComponentMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage for ComponentMap<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.data.remove(&entity).is_some()
    }

    fn has(&self, entity: Entity) -> bool {
        self.data.contains_key(&entity)
    }

    fn clone_entity(&mut self, from: Entity, to: Entity) -> Result<bool, EcsError> {
        let Some(source) = self.data.get(&from) else {
            return Ok(false);
        };
        let copy = source.clone();
        self.insert(to, copy)?;
        Ok(true)
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
