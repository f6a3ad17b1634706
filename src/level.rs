use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
    camera::Camera,
    collision::LayerRules,
    components::Transform,
    config::{CameraConfig, CollisionConfig, LoggingConfig, PartitionConfig},
    ecs::{Archetype, ComponentFactory, EcsError, Entity},
    engine::EngineSettings,
    spatial::{FixedBounds, SpatialError},
    world::World,
};

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_frames() -> u64 {
    600
}

/// Component name -> component fields, as written in the level file.
pub type ComponentValues = BTreeMap<String, serde_yaml::Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default = "default_frames")]
    pub frames: u64,
    /// Fixed level extents; computed from the spawned boxes when omitted.
    #[serde(default)]
    pub bounds: Option<LevelRect>,
    #[serde(default)]
    pub partition: PartitionConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub archetypes: BTreeMap<String, ComponentValues>,
    #[serde(default)]
    pub entities: Vec<EntitySpawn>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LevelRect {
    pub bottom_left: Vec2,
    pub top_right: Vec2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitySpawn {
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<Vec2>,
    /// Added to, or replacing, the archetype's components.
    #[serde(default)]
    pub components: ComponentValues,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level is invalid: {0}")]
    Invalid(String),

    #[error("entity #{index} uses unknown archetype `{archetype}`")]
    UnknownArchetype { index: usize, archetype: String },

    #[error("component error in {owner}: {source}")]
    Component {
        owner: String,
        #[source]
        source: EcsError,
    },

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

pub struct LevelLoader {
    base_dir: PathBuf,
}

impl LevelLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Level> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read level file {}", path.display()))?;
        let level: Level = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        level
            .validate()
            .with_context(|| format!("Invalid level {}", path.display()))?;
        Ok(level)
    }
}

impl Level {
    pub fn validate(&self) -> Result<(), LevelError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(LevelError::Invalid(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !self.partition.cell_size.is_finite() || self.partition.cell_size <= 0.0 {
            return Err(LevelError::Invalid(format!(
                "partition.cell_size must be positive, got {}",
                self.partition.cell_size
            )));
        }
        for (index, spawn) in self.entities.iter().enumerate() {
            if let Some(archetype) = &spawn.archetype {
                if !self.archetypes.contains_key(archetype) {
                    return Err(LevelError::UnknownArchetype {
                        index,
                        archetype: archetype.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Frame count, unless overridden.
    pub fn frames(&self, override_frames: Option<u64>) -> u64 {
        override_frames.unwrap_or(self.frames)
    }

    pub fn rules(&self) -> LayerRules {
        self.collision.layer_rules()
    }

    pub fn camera(&self) -> Camera {
        self.camera.camera()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            level_name: self.name.clone(),
            dt: self.dt,
        }
    }

    /// Builds the archetype library, spawns every entity and initialises the
    /// partition.
    pub fn build_world(&self, factory: &ComponentFactory) -> Result<World, LevelError> {
        let mut world = World::with_partition(self.partition.clone());

        for (name, components) in &self.archetypes {
            let mut archetype = Archetype::new(name.clone());
            for (component, value) in components {
                let erased = factory.create(component, value.clone()).map_err(|source| {
                    LevelError::Component {
                        owner: format!("archetype `{name}`"),
                        source,
                    }
                })?;
                archetype.set(erased);
            }
            world.add_archetype(archetype);
        }

        for (index, spawn) in self.entities.iter().enumerate() {
            self.spawn(&mut world, factory, index, spawn)?;
        }

        match &self.bounds {
            Some(rect) => {
                world.init_partition(&FixedBounds::new(rect.bottom_left, rect.top_right))?
            }
            None => world.init_partition_from_components()?,
        }

        info!(
            level = %self.name,
            entities = world.entity_count(),
            archetypes = self.archetypes.len(),
            "level built"
        );
        Ok(world)
    }

    fn spawn(
        &self,
        world: &mut World,
        factory: &ComponentFactory,
        index: usize,
        spawn: &EntitySpawn,
    ) -> Result<Entity, LevelError> {
        let entity = match &spawn.archetype {
            Some(archetype) => {
                world
                    .clone_archetype(archetype)
                    .ok_or_else(|| LevelError::UnknownArchetype {
                        index,
                        archetype: archetype.clone(),
                    })?
            }
            None => world.create_empty_entity(),
        };
        if let Some(name) = &spawn.name {
            world.rename_entity(entity, name.clone());
        }

        let owner = || format!("entity #{index}");
        for (component, value) in &spawn.components {
            factory
                .create(component, value.clone())
                .map_err(|source| LevelError::Component {
                    owner: owner(),
                    source,
                })?
                .replace_into(world.components_mut(), entity);
        }

        if let Some(position) = spawn.position {
            match world.get_component_mut::<Transform>(entity) {
                Some(transform) => transform.position = position,
                None => world
                    .add_component(entity, Transform::at(position))
                    .map_err(|source| LevelError::Component {
                        owner: owner(),
                        source,
                    })?,
            }
        }
        Ok(entity)
    }
}
