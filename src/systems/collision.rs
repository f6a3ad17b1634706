use anyhow::Result;
use tracing::{debug, info, trace};

use crate::{
    collision::{
        partitioned_collision_map, Body, BodySet, CollisionEvent, CollisionEventKind,
        CollisionPass, LayerRules, ResponseTable,
    },
    components::{Aabb, Collectible, Gate, Goal, Motion, Status, Transform},
    engine::{System, SystemContext},
    script::ScriptArgs,
    world::World,
};

/// Broad phase over the partition's candidate cells, swept narrow phase and
/// layer-pair responses. Results are written back to transforms, motions and
/// AABB centres; gameplay events update components and run scripts.
pub struct CollisionSystem {
    rules: LayerRules,
    responses: ResponseTable,
}

impl CollisionSystem {
    pub fn new(rules: LayerRules) -> Self {
        Self::with_responses(rules, ResponseTable::default())
    }

    pub fn with_responses(rules: LayerRules, responses: ResponseTable) -> Self {
        Self { rules, responses }
    }

    pub fn rules(&self) -> &LayerRules {
        &self.rules
    }

    fn gather_bodies(world: &World) -> BodySet {
        let mut bodies = BodySet::new();
        let Some(aabbs) = world.component_array::<Aabb>() else {
            return bodies;
        };
        for (entity, aabb) in aabbs.iter() {
            if !aabb.alive || !aabb.layer.is_partitioned() {
                continue;
            }
            let mut body = Body::new(entity, aabb.layer, aabb.center, aabb.half_extents);
            if let Some(motion) = world.get_component::<Motion>(entity) {
                body = body.moving(motion.velocity);
            }
            if let Some(gate) = world.get_component::<Gate>(entity) {
                body.blocking = !gate.open;
            }
            if let Some(status) = world.get_component::<Status>(entity) {
                body.invulnerable = status.is_invulnerable();
            }
            bodies.insert(body);
        }
        bodies
    }

    fn write_back(world: &mut World, bodies: &BodySet) {
        for body in bodies.iter().filter(|body| body.dynamic) {
            let Some(aabb) = world.get_component_mut::<Aabb>(body.entity) else {
                continue;
            };
            let delta = body.center - aabb.center;
            aabb.center = body.center;

            if delta != glam::Vec2::ZERO {
                if let Some(transform) = world.get_component_mut::<Transform>(body.entity) {
                    transform.position += delta;
                }
            }
            if let Some(motion) = world.get_component_mut::<Motion>(body.entity) {
                motion.velocity = body.velocity;
            }
        }
    }

    /// Applies an event to the components it concerns. Returns whether its
    /// script should run.
    fn apply_event(world: &mut World, event: &CollisionEvent) -> bool {
        match event.kind {
            CollisionEventKind::GoalReached => match world.get_component_mut::<Goal>(event.other) {
                Some(goal) if !goal.reached => {
                    goal.reached = true;
                    info!(player = %event.subject, goal = %event.other, "goal reached");
                    true
                }
                Some(_) => false,
                None => true,
            },
            CollisionEventKind::ItemCollected => {
                let fresh = match world.get_component_mut::<Collectible>(event.other) {
                    Some(item) if !item.collected => {
                        item.collected = true;
                        true
                    }
                    Some(_) => false,
                    None => true,
                };
                if fresh {
                    if let Some(aabb) = world.get_component_mut::<Aabb>(event.other) {
                        aabb.alive = false;
                    }
                }
                fresh
            }
            CollisionEventKind::PlayerHit => {
                match world.get_component_mut::<Status>(event.subject) {
                    Some(status) => {
                        let landed = status.take_hit();
                        if landed && status.is_dead() {
                            info!(player = %event.subject, "player out of health");
                        }
                        landed
                    }
                    None => true,
                }
            }
            CollisionEventKind::GateEntered
            | CollisionEventKind::Interact
            | CollisionEventKind::Burrow => true,
        }
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(LayerRules::default())
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &str {
        "collision"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
        if !world.partition().is_ready() {
            debug!(frame = ctx.frame, "partition not initialised, skipping collision");
            return Ok(());
        }

        let mut bodies = Self::gather_bodies(world);
        let mut pass = CollisionPass::new(&self.rules, &self.responses, ctx.dt);
        if let Some(aabbs) = world.component_array::<Aabb>() {
            let partition = world.partition();
            for cell in partition.candidate_cells() {
                let groups = partitioned_collision_map(partition, aabbs, cell);
                if groups.values().map(Vec::len).sum::<usize>() < 2 {
                    continue;
                }
                pass.process_partitioned_entities(&groups, &mut bodies);
            }
        }
        let (stats, events) = pass.finish();

        Self::write_back(world, &bodies);
        for event in &events {
            if !Self::apply_event(world, event) {
                continue;
            }
            let args = ScriptArgs {
                subject: event.subject,
                other: event.other,
                frame: ctx.frame,
            };
            let name = event.kind.script_name();
            if !ctx.scripts.exec(name, &args) {
                trace!(script = name, "no script registered");
            }
        }
        world.record_collisions(stats, events);
        Ok(())
    }
}
