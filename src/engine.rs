//! Frame loop: runs systems in declared order, then sweeps deleted entities

use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, debug_span};

use crate::camera::{Camera, CameraProvider, FixedCamera};
use crate::collision::{CollisionStats, LayerRules};
use crate::script::{ScriptDispatch, ScriptTable};
use crate::systems::{BoundsSystem, CollisionSystem, MotionSystem, PartitionSystem, StatusSystem};
use crate::world::World;

pub struct EngineSettings {
    pub level_name: String,
    /// Seconds per frame.
    pub dt: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            level_name: "untitled".to_string(),
            dt: 1.0 / 60.0,
        }
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
    camera: Box<dyn CameraProvider>,
    scripts: Box<dyn ScriptDispatch>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
            camera: Box::new(FixedCamera::default()),
            scripts: Box::new(ScriptTable::new()),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// bounds -> partition -> collision -> motion -> status
    pub fn with_default_pipeline(self, rules: LayerRules) -> Self {
        self.with_system(BoundsSystem::new())
            .with_system(PartitionSystem::new())
            .with_system(CollisionSystem::new(rules))
            .with_system(MotionSystem::new())
            .with_system(StatusSystem::new())
    }

    pub fn with_camera(mut self, camera: impl CameraProvider + 'static) -> Self {
        self.camera = Box::new(camera);
        self
    }

    pub fn with_scripts(mut self, scripts: impl ScriptDispatch + 'static) -> Self {
        self.scripts = Box::new(scripts);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            settings: self.settings,
            systems: self.systems,
            camera: self.camera,
            scripts: self.scripts,
        }
    }
}

pub struct Engine {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
    camera: Box<dyn CameraProvider>,
    scripts: Box<dyn ScriptDispatch>,
}

impl Engine {
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Runs one frame. The entity sweep happens after every system.
    pub fn step(&mut self, world: &mut World) -> Result<FrameSummary> {
        let frame = world.advance_frame();
        let camera = self.camera.camera();
        let mut reports = Vec::with_capacity(self.systems.len());

        for system in &mut self.systems {
            let name = system.name().to_string();
            let span = debug_span!("system", name = %name, frame);
            let _guard = span.enter();

            let mut ctx = SystemContext {
                frame,
                dt: self.settings.dt,
                level_name: &self.settings.level_name,
                camera,
                scripts: self.scripts.as_mut(),
            };
            let start = Instant::now();
            system
                .run(&mut ctx, world)
                .with_context(|| format!("system `{name}` failed on frame {frame}"))?;
            reports.push(SystemRunReport {
                name,
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }

        let deleted = world.update_entity_map();
        let summary = FrameSummary {
            frame,
            systems: reports,
            collision: world.collision_stats(),
            events: world.events().len(),
            entities: world.entity_count(),
            deleted,
        };
        debug!(
            frame,
            entities = summary.entities,
            pairs = summary.collision.pairs_tested,
            events = summary.events,
            "frame complete"
        );
        Ok(summary)
    }

    pub fn run(&mut self, world: &mut World, frames: u64) -> Result<()> {
        self.run_with_hook(world, frames, |_| {})
    }

    /// Like [`Engine::run`], handing each frame's summary to `hook`.
    pub fn run_with_hook<F>(&mut self, world: &mut World, frames: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(FrameSummary),
    {
        for _ in 0..frames {
            let summary = self.step(world)?;
            hook(summary);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameSummary {
    pub frame: u64,
    pub systems: Vec<SystemRunReport>,
    pub collision: CollisionStats,
    pub events: usize,
    pub entities: usize,
    pub deleted: usize,
}

pub struct SystemContext<'a> {
    pub frame: u64,
    pub dt: f32,
    pub level_name: &'a str,
    pub camera: Camera,
    pub scripts: &'a mut dyn ScriptDispatch,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        fail_on: Option<u64>,
    }

    impl System for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn run(&mut self, ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
            if self.fail_on == Some(ctx.frame) {
                anyhow::bail!("boom");
            }
            world.create_empty_entity();
            Ok(())
        }
    }

    #[test]
    fn hook_sees_every_frame() {
        let mut engine = EngineBuilder::new(EngineSettings::default())
            .with_system(Counter { fail_on: None })
            .build();
        let mut world = World::new();

        let mut frames = Vec::new();
        engine
            .run_with_hook(&mut world, 3, |summary| frames.push(summary.frame))
            .unwrap();
        assert_eq!(frames, vec![1, 2, 3]);
        assert_eq!(world.entity_count(), 3);
        assert_eq!(engine.system_names(), vec!["counter"]);
    }

    #[test]
    fn system_error_names_system_and_frame() {
        let mut engine = EngineBuilder::new(EngineSettings::default())
            .with_system(Counter { fail_on: Some(2) })
            .build();
        let mut world = World::new();
        let err = engine.run(&mut world, 5).unwrap_err();
        assert!(format!("{err:#}").contains("system `counter` failed on frame 2"));
        assert_eq!(world.frame(), 2);
    }

    #[test]
    fn default_pipeline_order() {
        let engine = EngineBuilder::new(EngineSettings::default())
            .with_default_pipeline(LayerRules::default())
            .build();
        assert_eq!(
            engine.system_names(),
            vec!["bounds", "partition", "collision", "motion", "status"]
        );
    }
}
