use std::sync::{Arc, Mutex};

use anyhow::Result;
use burrow::{
    camera::{Camera, FixedCamera},
    collision::{CollisionEventKind, CollisionLayer, LayerRules},
    components::{Aabb, Collectible, Goal, Motion, Status, Transform},
    config::PartitionConfig,
    ecs::Entity,
    engine::{EngineBuilder, EngineSettings, System, SystemContext},
    script::{ScriptArgs, ScriptTable},
    spatial::FixedBounds,
    world::World,
};
use glam::Vec2;

fn settings(dt: f32) -> EngineSettings {
    EngineSettings {
        level_name: "pipeline".into(),
        dt,
    }
}

fn small_world() -> World {
    let mut world = World::with_partition(PartitionConfig {
        cell_size: 4.0,
        max_entities: 8,
        bounds_margin: 0.0,
    });
    world
        .init_partition(&FixedBounds::new(Vec2::splat(-8.0), Vec2::new(16.0, 8.0)))
        .unwrap();
    world
}

fn spawn(world: &mut World, layer: CollisionLayer, position: Vec2, half: Vec2) -> Entity {
    let e = world.create_empty_entity();
    world.add_component(e, Transform::at(position)).unwrap();
    world.add_component(e, Aabb::new(layer, half)).unwrap();
    e
}

fn recording_scripts(names: &[&'static str]) -> (ScriptTable, Arc<Mutex<Vec<(String, u64)>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut scripts = ScriptTable::new();
    for &name in names {
        let sink = log.clone();
        scripts.register(name, move |args: &ScriptArgs| {
            sink.lock().unwrap().push((name.to_string(), args.frame));
        });
    }
    (scripts, log)
}

#[test]
fn player_stops_flush_against_wall() {
    let mut world = small_world();
    let player = spawn(&mut world, CollisionLayer::Player, Vec2::ZERO, Vec2::ONE);
    world
        .add_component(player, Motion::with_velocity(Vec2::new(10.0, 0.0)))
        .unwrap();
    spawn(&mut world, CollisionLayer::Tiles, Vec2::new(5.0, 0.0), Vec2::ONE);

    let mut engine = EngineBuilder::new(settings(1.0))
        .with_default_pipeline(LayerRules::default())
        .build();
    let summary = engine.step(&mut world).unwrap();

    assert_eq!(summary.collision.hits, 1);
    assert_eq!(
        world.get_component::<Transform>(player).unwrap().position,
        Vec2::new(3.0, 0.0)
    );
    assert_eq!(world.get_component::<Motion>(player).unwrap().velocity, Vec2::ZERO);

    // Resting against the wall on later frames stays put.
    engine.step(&mut world).unwrap();
    assert_eq!(
        world.get_component::<Transform>(player).unwrap().position,
        Vec2::new(3.0, 0.0)
    );
}

#[test]
fn player_slides_along_wall() {
    let mut world = small_world();
    let player = spawn(&mut world, CollisionLayer::Player, Vec2::ZERO, Vec2::ONE);
    world
        .add_component(player, Motion::with_velocity(Vec2::new(4.0, 2.0)))
        .unwrap();
    spawn(&mut world, CollisionLayer::Tiles, Vec2::new(3.0, 0.0), Vec2::new(1.0, 6.0));

    let mut engine = EngineBuilder::new(settings(1.0))
        .with_default_pipeline(LayerRules::default())
        .build();
    engine.step(&mut world).unwrap();

    let position = world.get_component::<Transform>(player).unwrap().position;
    assert_eq!(position, Vec2::new(1.0, 2.0));
    assert_eq!(
        world.get_component::<Motion>(player).unwrap().velocity,
        Vec2::new(0.0, 2.0)
    );
}

#[test]
fn fast_player_is_stopped_by_wall_cells_away() {
    let mut world = small_world();
    let player = spawn(&mut world, CollisionLayer::Player, Vec2::new(-6.0, 0.0), Vec2::ONE);
    world
        .add_component(player, Motion::with_velocity(Vec2::new(40.0, 0.0)))
        .unwrap();
    spawn(&mut world, CollisionLayer::Tiles, Vec2::new(6.0, 0.0), Vec2::new(0.5, 4.0));

    // 20 units in one frame: the wall sits three cells past the start box.
    let mut engine = EngineBuilder::new(settings(0.5))
        .with_default_pipeline(LayerRules::default())
        .build();
    let summary = engine.step(&mut world).unwrap();

    assert_eq!(summary.collision.hits, 1);
    assert_eq!(
        world.get_component::<Transform>(player).unwrap().position,
        Vec2::new(4.5, 0.0)
    );
    assert_eq!(world.get_component::<Motion>(player).unwrap().velocity, Vec2::ZERO);
}

struct Deleter {
    target: Entity,
}

impl System for Deleter {
    fn name(&self) -> &str {
        "deleter"
    }

    fn run(&mut self, _ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
        world.delete_entity(self.target);
        Ok(())
    }
}

struct LivenessCheck {
    target: Entity,
    seen: Arc<Mutex<Vec<bool>>>,
}

impl System for LivenessCheck {
    fn name(&self) -> &str {
        "liveness"
    }

    fn run(&mut self, _ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
        let alive = world.get_entity(self.target).is_some()
            && world.get_component::<Transform>(self.target).is_some();
        self.seen.lock().unwrap().push(alive);
        Ok(())
    }
}

#[test]
fn deletion_is_swept_after_all_systems() {
    let mut world = small_world();
    let doomed = spawn(&mut world, CollisionLayer::Enemy, Vec2::ZERO, Vec2::ONE);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut engine = EngineBuilder::new(settings(0.1))
        .with_system(Deleter { target: doomed })
        .with_system(LivenessCheck {
            target: doomed,
            seen: seen.clone(),
        })
        .build();

    let summary = engine.step(&mut world).unwrap();
    assert_eq!(summary.deleted, 1);
    assert!(world.get_entity(doomed).is_none());
    assert!(world.get_component::<Aabb>(doomed).is_none());

    engine.step(&mut world).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
}

#[test]
fn swept_entities_leave_partition_queries() {
    let mut world = small_world();
    let doomed = spawn(&mut world, CollisionLayer::Enemy, Vec2::ZERO, Vec2::ONE);
    let kept = spawn(&mut world, CollisionLayer::Enemy, Vec2::new(0.5, 0.0), Vec2::ONE);

    let mut engine = EngineBuilder::new(settings(0.1))
        .with_default_pipeline(LayerRules::default())
        .with_system(Deleter { target: doomed })
        .with_camera(FixedCamera(Camera::new(Vec2::ZERO, Vec2::splat(4.0))))
        .build();
    engine.step(&mut world).unwrap();

    assert!(!world.is_alive(doomed));
    let partition = world.partition();
    assert_eq!(partition.active_entities(), vec![kept]);
    assert!(!partition.is_active(doomed));
    let grid = partition.grid().unwrap();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            assert!(!partition.partitioned_entities(x, y).contains(&doomed));
            assert!(!partition.verify_partition(x, y));
        }
    }
}

#[test]
fn goal_script_runs_once() {
    let mut world = small_world();
    let player = spawn(&mut world, CollisionLayer::Player, Vec2::ZERO, Vec2::ONE);
    world.add_component(player, Motion::default()).unwrap();
    let goal = spawn(&mut world, CollisionLayer::Goal, Vec2::new(0.5, 0.0), Vec2::ONE);
    world.add_component(goal, Goal::default()).unwrap();

    let (scripts, log) = recording_scripts(&["goal_reached"]);
    let mut engine = EngineBuilder::new(settings(0.1))
        .with_default_pipeline(LayerRules::default())
        .with_scripts(scripts)
        .build();
    engine.run(&mut world, 3).unwrap();

    assert!(world.get_component::<Goal>(goal).unwrap().reached);
    assert_eq!(*log.lock().unwrap(), vec![("goal_reached".to_string(), 1)]);
    assert_eq!(world.events().len(), 1);
    assert_eq!(world.events()[0].kind, CollisionEventKind::GoalReached);
}

#[test]
fn collected_items_leave_the_partition() {
    let mut world = small_world();
    let player = spawn(&mut world, CollisionLayer::Player, Vec2::ZERO, Vec2::ONE);
    world.add_component(player, Motion::default()).unwrap();
    let coin = spawn(
        &mut world,
        CollisionLayer::Collectible,
        Vec2::new(1.0, 1.0),
        Vec2::splat(0.5),
    );
    world.add_component(coin, Collectible::default()).unwrap();

    let (scripts, log) = recording_scripts(&["item_collected"]);
    let mut engine = EngineBuilder::new(settings(0.1))
        .with_default_pipeline(LayerRules::default())
        .with_scripts(scripts)
        .build();

    let first = engine.step(&mut world).unwrap();
    assert_eq!(first.events, 1);
    assert!(world.get_component::<Collectible>(coin).unwrap().collected);
    assert!(!world.get_component::<Aabb>(coin).unwrap().alive);

    let second = engine.step(&mut world).unwrap();
    assert_eq!(second.events, 0);
    assert_eq!(log.lock().unwrap().len(), 1);
    assert!(world.is_alive(coin));
}

#[test]
fn enemy_hits_respect_invulnerability() {
    let mut world = small_world();
    let player = spawn(&mut world, CollisionLayer::Player, Vec2::ZERO, Vec2::ONE);
    world.add_component(player, Motion::default()).unwrap();
    world.add_component(player, Status::with_health(3)).unwrap();
    spawn(&mut world, CollisionLayer::Enemy, Vec2::new(1.5, 0.0), Vec2::ONE);

    let (scripts, log) = recording_scripts(&["player_hit"]);
    let mut engine = EngineBuilder::new(settings(0.01))
        .with_default_pipeline(LayerRules::default())
        .with_scripts(scripts)
        .build();
    engine.run(&mut world, 2).unwrap();

    let status = world.get_component::<Status>(player).unwrap();
    assert_eq!(status.health, 2);
    assert!(status.is_invulnerable());
    assert_eq!(log.lock().unwrap().len(), 1);

    let velocity = world.get_component::<Motion>(player).unwrap().velocity;
    assert!(velocity.x < 0.0, "knocked away from the enemy: {velocity}");
}

#[test]
fn camera_marks_visible_entities_active() {
    let mut world = small_world();
    let near = spawn(&mut world, CollisionLayer::Tiles, Vec2::new(-6.0, -6.0), Vec2::splat(0.5));
    let far = spawn(&mut world, CollisionLayer::Tiles, Vec2::new(14.0, 6.0), Vec2::splat(0.5));

    let camera = Camera::new(Vec2::new(-6.0, -6.0), Vec2::splat(1.0));
    let mut engine = EngineBuilder::new(settings(0.1))
        .with_default_pipeline(LayerRules::default())
        .with_camera(FixedCamera(camera))
        .build();
    engine.step(&mut world).unwrap();

    assert!(world.partition().is_active(near));
    assert!(!world.partition().is_active(far));
}

#[test]
fn uninitialised_partition_skips_collision() {
    let mut world = World::new();
    let player = spawn(&mut world, CollisionLayer::Player, Vec2::ZERO, Vec2::ONE);
    world
        .add_component(player, Motion::with_velocity(Vec2::new(10.0, 0.0)))
        .unwrap();
    spawn(&mut world, CollisionLayer::Tiles, Vec2::new(5.0, 0.0), Vec2::ONE);

    let mut engine = EngineBuilder::new(settings(1.0))
        .with_default_pipeline(LayerRules::default())
        .build();
    let summary = engine.step(&mut world).unwrap();

    assert_eq!(summary.collision.pairs_tested, 0);
    assert_eq!(
        world.get_component::<Transform>(player).unwrap().position,
        Vec2::new(10.0, 0.0)
    );
}
