//! Core component types read and written by the partition and collision
//! pipeline

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionLayer, Rect};
use crate::ecs::{Component, ComponentFactory, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl Component for Transform {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Motion {
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

impl Motion {
    pub fn with_velocity(velocity: Vec2) -> Self {
        Self {
            velocity,
            acceleration: Vec2::ZERO,
        }
    }
}

impl Component for Motion {}

fn default_alive() -> bool {
    true
}

/// Axis-aligned collider. `center` is derived from the owner's `Transform`
/// plus `offset` once per frame and is never read before that refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub layer: CollisionLayer,
    pub half_extents: Vec2,
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(skip)]
    pub center: Vec2,
    #[serde(skip)]
    owner: Entity,
}

impl Aabb {
    pub fn new(layer: CollisionLayer, half_extents: Vec2) -> Self {
        Self {
            layer,
            half_extents,
            offset: Vec2::ZERO,
            alive: true,
            center: Vec2::ZERO,
            owner: Entity::NULL,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn rect(&self) -> Rect {
        self.rect_at(self.center)
    }

    pub fn rect_at(&self, center: Vec2) -> Rect {
        Rect::from_center(center, self.half_extents)
    }
}

impl Component for Aabb {
    fn attach(&mut self, owner: Entity) {
        self.owner = owner;
    }
}

/// Seconds of invulnerability after taking a hit.
pub const INVULNERABILITY_SECONDS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub health: i32,
    pub invulnerable_for: f32,
    pub hits_taken: u32,
}

impl Status {
    pub fn with_health(health: i32) -> Self {
        Self {
            health,
            ..Self::default()
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    /// Applies one point of damage unless still invulnerable. Returns whether
    /// the hit landed.
    pub fn take_hit(&mut self) -> bool {
        if self.is_invulnerable() {
            return false;
        }
        self.health -= 1;
        self.hits_taken += 1;
        self.invulnerable_for = INVULNERABILITY_SECONDS;
        true
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

impl Default for Status {
    fn default() -> Self {
        Self {
            health: 3,
            invulnerable_for: 0.0,
            hits_taken: 0,
        }
    }
}

impl Component for Status {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goal {
    pub reached: bool,
}

impl Component for Goal {}

/// A closed gate blocks like a wall; an open one is a trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gate {
    pub open: bool,
}

impl Component for Gate {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collectible {
    pub value: u32,
    pub collected: bool,
}

impl Default for Collectible {
    fn default() -> Self {
        Self {
            value: 1,
            collected: false,
        }
    }
}

impl Component for Collectible {}

impl ComponentFactory {
    /// Factory with every core component registered under its level-file name.
    pub fn with_core_components() -> Self {
        ComponentFactory::new()
            .with::<Transform>("transform")
            .with::<Motion>("motion")
            .with::<Aabb>("aabb")
            .with::<Status>("status")
            .with::<Goal>("goal")
            .with::<Gate>("gate")
            .with::<Collectible>("collectible")
    }
}
