//! Entity/component storage, uniform-grid spatial partitioning and swept AABB
//! collision for 2D games.

pub mod camera;
pub mod collision;
pub mod components;
pub mod config;
pub mod ecs;
pub mod engine;
pub mod level;
pub mod script;
pub mod spatial;
pub mod systems;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, FrameSummary};
pub use level::{Level, LevelError, LevelLoader};
pub use world::World;
