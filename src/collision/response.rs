//! Collision responses dispatched by ordered layer pair.
//!
//! Responses work on [`Body`] snapshots taken at the start of the collision
//! pass. They move and redirect bodies, and they report gameplay outcomes as
//! [`CollisionEvent`]s; they never create or delete entities.

use std::collections::HashMap;

use glam::Vec2;
use serde::Serialize;
use tracing::trace;

use super::{Axis, CollisionLayer, SweptHit};
use crate::ecs::Entity;

/// Contacts whose side-on overlap is at most this are grazes along a seam
/// between adjacent walls and are ignored.
pub const CONTACT_SLOP: f32 = 1e-3;

/// Speed given to a player knocked back by an enemy.
pub const KNOCKBACK_SPEED: f32 = 240.0;

/// Per-frame working copy of one collider.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub entity: Entity,
    pub layer: CollisionLayer,
    pub center: Vec2,
    pub half_extents: Vec2,
    pub velocity: Vec2,
    /// Has a `Motion` component, so responses may move it.
    pub dynamic: bool,
    /// Stops movement like a wall (closed gates).
    pub blocking: bool,
    pub invulnerable: bool,
}

impl Body {
    pub fn new(entity: Entity, layer: CollisionLayer, center: Vec2, half_extents: Vec2) -> Self {
        Self {
            entity,
            layer,
            center,
            half_extents,
            velocity: Vec2::ZERO,
            dynamic: false,
            blocking: layer.is_wall(),
            invulnerable: false,
        }
    }

    pub fn moving(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self.dynamic = true;
        self
    }

    fn center_at(&self, t: f32) -> Vec2 {
        self.center + self.velocity * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionEventKind {
    GoalReached,
    GateEntered,
    ItemCollected,
    PlayerHit,
    Interact,
    Burrow,
}

impl CollisionEventKind {
    /// Script invoked for this kind of event.
    pub fn script_name(self) -> &'static str {
        match self {
            Self::GoalReached => "goal_reached",
            Self::GateEntered => "gate_entered",
            Self::ItemCollected => "item_collected",
            Self::PlayerHit => "player_hit",
            Self::Interact => "interact",
            Self::Burrow => "burrow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollisionEvent {
    pub kind: CollisionEventKind,
    /// The acting body, usually the player.
    pub subject: Entity,
    pub other: Entity,
    pub t_first: f32,
}

pub struct Contact<'a> {
    pub hit: SweptHit,
    pub events: &'a mut Vec<CollisionEvent>,
}

impl Contact<'_> {
    fn emit(&mut self, kind: CollisionEventKind, subject: &Body, other: &Body) {
        self.events.push(CollisionEvent {
            kind,
            subject: subject.entity,
            other: other.entity,
            t_first: self.hit.t_first,
        });
    }
}

pub type ResponseFn = fn(&mut Body, &mut Body, &mut Contact<'_>);

/// Response functions keyed by ordered `(first, second)` layer pair.
pub struct ResponseTable {
    responses: HashMap<(CollisionLayer, CollisionLayer), ResponseFn>,
}

impl ResponseTable {
    pub fn empty() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    pub fn set(&mut self, first: CollisionLayer, second: CollisionLayer, response: ResponseFn) {
        self.responses.insert((first, second), response);
    }

    pub fn with(
        mut self,
        first: CollisionLayer,
        second: CollisionLayer,
        response: ResponseFn,
    ) -> Self {
        self.set(first, second, response);
        self
    }

    pub fn get(&self, first: CollisionLayer, second: CollisionLayer) -> Option<ResponseFn> {
        self.responses.get(&(first, second)).copied()
    }

    /// Runs the response registered for the pair, trying the swapped order
    /// when only that one exists. Unlisted pairs against a wall layer fall
    /// back to [`wall_slide`]. Returns whether anything ran.
    pub fn respond(&self, a: &mut Body, b: &mut Body, contact: &mut Contact<'_>) -> bool {
        if let Some(response) = self.get(a.layer, b.layer) {
            response(a, b, contact);
        } else if let Some(response) = self.get(b.layer, a.layer) {
            response(b, a, contact);
        } else if b.layer.is_wall() && !a.layer.is_wall() {
            wall_slide(a, b, contact);
        } else if a.layer.is_wall() && !b.layer.is_wall() {
            wall_slide(b, a, contact);
        } else {
            trace!(first = ?a.layer, second = ?b.layer, "no response for layer pair");
            return false;
        }
        true
    }
}

impl Default for ResponseTable {
    fn default() -> Self {
        use CollisionLayer::*;

        Self::empty()
            .with(Player, Tiles, wall_slide)
            .with(Player, SolidEnvironment, wall_slide)
            .with(Pushable, Tiles, wall_slide)
            .with(Pushable, SolidEnvironment, wall_slide)
            .with(Pushable, Gate, solid_gate)
            .with(Enemy, Tiles, enemy_wall)
            .with(Enemy, SolidEnvironment, enemy_wall)
            .with(Enemy, Pushable, enemy_wall)
            .with(Enemy, Gate, enemy_gate)
            .with(Player, Enemy, player_enemy)
            .with(Player, Gate, player_gate)
            .with(Player, Goal, player_goal)
            .with(Player, Collectible, player_collectible)
            .with(Player, Pushable, player_pushable)
            .with(Pushable, Pushable, pushable_pushable)
            .with(Player, Interactable, player_interactable)
            .with(Player, Burrowable, player_burrowable)
    }
}

/// Stops `mover` flush against `wall` on the hit axis and keeps its motion on
/// the other axis.
pub fn wall_slide(mover: &mut Body, wall: &mut Body, contact: &mut Contact<'_>) {
    if !mover.dynamic {
        return;
    }
    let axis = contact.hit.axis;
    let side = axis.other();
    let t = contact.hit.t_first;
    let (mover_at, wall_at) = (mover.center_at(t), wall.center_at(t));

    let reach = mover.half_extents + wall.half_extents;
    let side_overlap = side.of(reach) - (side.of(mover_at) - side.of(wall_at)).abs();
    if side_overlap <= CONTACT_SLOP {
        return;
    }

    let direction = if axis.of(wall_at) >= axis.of(mover_at) {
        1.0
    } else {
        -1.0
    };
    let flush = axis.of(wall_at) - direction * axis.of(reach);
    axis.set(&mut mover.center, flush);

    // Only cancel velocity heading into the wall.
    if axis.of(mover.velocity - wall.velocity) * direction > 0.0 {
        let wall_speed = axis.of(wall.velocity);
        axis.set(&mut mover.velocity, wall_speed);
    }
}

/// Patrolling enemies turn around when they walk into a wall.
pub fn enemy_wall(enemy: &mut Body, wall: &mut Body, contact: &mut Contact<'_>) {
    let before = enemy.velocity;
    wall_slide(enemy, wall, contact);
    if contact.hit.axis == Axis::X && enemy.velocity.x != before.x {
        enemy.velocity.x = -before.x;
    }
}

pub fn enemy_gate(enemy: &mut Body, gate: &mut Body, contact: &mut Contact<'_>) {
    if gate.blocking {
        enemy_wall(enemy, gate, contact);
    }
}

pub fn solid_gate(mover: &mut Body, gate: &mut Body, contact: &mut Contact<'_>) {
    if gate.blocking {
        wall_slide(mover, gate, contact);
    }
}

/// Knocks the player away from the enemy; damage is applied by the caller on
/// the emitted event.
pub fn player_enemy(player: &mut Body, enemy: &mut Body, contact: &mut Contact<'_>) {
    if player.invulnerable {
        return;
    }
    if player.dynamic {
        let away = (player.center - enemy.center).normalize_or_zero();
        let away = if away == Vec2::ZERO {
            -player.velocity.normalize_or_zero()
        } else {
            away
        };
        player.velocity = away * KNOCKBACK_SPEED;
    }
    contact.emit(CollisionEventKind::PlayerHit, player, enemy);
}

pub fn player_gate(player: &mut Body, gate: &mut Body, contact: &mut Contact<'_>) {
    if gate.blocking {
        wall_slide(player, gate, contact);
    } else {
        contact.emit(CollisionEventKind::GateEntered, player, gate);
    }
}

pub fn player_goal(player: &mut Body, goal: &mut Body, contact: &mut Contact<'_>) {
    contact.emit(CollisionEventKind::GoalReached, player, goal);
}

pub fn player_collectible(player: &mut Body, item: &mut Body, contact: &mut Contact<'_>) {
    contact.emit(CollisionEventKind::ItemCollected, player, item);
}

/// The crate picks up the player's speed along the push axis. A crate with
/// no `Motion` cannot move and stops the player like a wall.
pub fn player_pushable(player: &mut Body, crate_body: &mut Body, contact: &mut Contact<'_>) {
    if !crate_body.dynamic {
        trace!(pushable = %crate_body.entity, "pushable has no motion, blocking");
        wall_slide(player, crate_body, contact);
        return;
    }
    let axis = contact.hit.axis;
    let push = axis.of(player.velocity);
    let toward = axis.of(crate_body.center) - axis.of(player.center);
    if push * toward > 0.0 {
        axis.set(&mut crate_body.velocity, push);
    }
}

/// Two crates in contact move together at their mean speed on the hit axis.
/// A crate with no `Motion` is an obstacle for the other.
pub fn pushable_pushable(a: &mut Body, b: &mut Body, contact: &mut Contact<'_>) {
    match (a.dynamic, b.dynamic) {
        (true, true) => {
            let axis = contact.hit.axis;
            let shared = (axis.of(a.velocity) + axis.of(b.velocity)) * 0.5;
            axis.set(&mut a.velocity, shared);
            axis.set(&mut b.velocity, shared);
        }
        (true, false) => wall_slide(a, b, contact),
        (false, true) => wall_slide(b, a, contact),
        (false, false) => {}
    }
}

pub fn player_interactable(player: &mut Body, target: &mut Body, contact: &mut Contact<'_>) {
    contact.emit(CollisionEventKind::Interact, player, target);
}

pub fn player_burrowable(player: &mut Body, ground: &mut Body, contact: &mut Contact<'_>) {
    contact.emit(CollisionEventKind::Burrow, player, ground);
}
