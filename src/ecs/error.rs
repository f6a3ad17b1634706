use thiserror::Error;

use super::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity {entity} already has a {component} component")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),
    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),
    #[error("unknown component type '{0}'")]
    UnknownComponent(String),
    #[error("failed to build component '{name}': {message}")]
    InvalidComponent { name: String, message: String },
}
