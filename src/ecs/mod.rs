//! Entity Component System (ECS) implementation
//!
//! Sparse per-type component maps behind a `TypeId`-indexed registry, with
//! generation-checked entity handles and named archetype templates.

pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod factory;
pub mod registry;

pub use archetype::{Archetype, ArchetypeLibrary, ErasedComponent};
pub use component::{Component, ComponentMap, ComponentStorage};
pub use entity::{Entity, EntityInfo, EntityRegistry};
pub use error::EcsError;
pub use factory::ComponentFactory;
pub use registry::ComponentRegistry;
