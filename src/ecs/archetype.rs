//! Named entity templates

use std::collections::HashMap;
use std::fmt;

use super::{Component, ComponentRegistry, EcsError, Entity};

/// A component with its concrete type erased, so templates can hold a mixed
/// bundle and stamp it onto new owners.
pub trait ErasedComponent: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn boxed_clone(&self) -> Box<dyn ErasedComponent>;
    fn insert_into(
        self: Box<Self>,
        registry: &mut ComponentRegistry,
        owner: Entity,
    ) -> Result<(), EcsError>;
    /// Like `insert_into`, but overwrites an existing instance of the type.
    fn replace_into(self: Box<Self>, registry: &mut ComponentRegistry, owner: Entity);
}

impl<T: Component> ErasedComponent for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn boxed_clone(&self) -> Box<dyn ErasedComponent> {
        Box::new(self.clone())
    }

    fn insert_into(
        self: Box<Self>,
        registry: &mut ComponentRegistry,
        owner: Entity,
    ) -> Result<(), EcsError> {
        registry.add_component(owner, *self)
    }

    fn replace_into(self: Box<Self>, registry: &mut ComponentRegistry, owner: Entity) {
        registry.replace_component(owner, *self);
    }
}

pub struct Archetype {
    name: String,
    components: Vec<Box<dyn ErasedComponent>>,
}

impl Archetype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.set(Box::new(component));
        self
    }

    /// Adds a component, replacing any previous one of the same type.
    pub fn set(&mut self, component: Box<dyn ErasedComponent>) {
        let type_name = component.type_name();
        self.components.retain(|c| c.type_name() != type_name);
        self.components.push(component);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Stamps a deep copy of every template component onto `owner`.
    pub fn instantiate(
        &self,
        registry: &mut ComponentRegistry,
        owner: Entity,
    ) -> Result<(), EcsError> {
        for component in &self.components {
            component.boxed_clone().insert_into(registry, owner)?;
        }
        Ok(())
    }
}

impl Clone for Archetype {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            components: self.components.iter().map(|c| c.boxed_clone()).collect(),
        }
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("name", &self.name)
            .field(
                "components",
                &self.components.iter().map(|c| c.type_name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ArchetypeLibrary {
    archetypes: HashMap<String, Archetype>,
}

impl ArchetypeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `archetype`, returning the template it replaced.
    pub fn insert(&mut self, archetype: Archetype) -> Option<Archetype> {
        self.archetypes.insert(archetype.name.clone(), archetype)
    }

    pub fn get(&self, name: &str) -> Option<&Archetype> {
        self.archetypes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archetypes.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.archetypes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}
