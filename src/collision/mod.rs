//! Collision engine: bounding-box refresh, per-cell layer grouping, swept
//! narrow phase and layer-pair response dispatch

pub mod layer;
pub mod response;
pub mod swept;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

pub use layer::{CollisionLayer, LayerRules};
pub use response::{Body, CollisionEvent, CollisionEventKind, Contact, ResponseFn, ResponseTable};
pub use swept::{check_collision, check_cursor_collision, Axis, Rect, SweptHit, VELOCITY_EPSILON};

use crate::components::{Aabb, Transform};
use crate::ecs::{ComponentMap, ComponentRegistry, Entity};
use crate::spatial::{Cell, Partition};

/// Recomputes every AABB centre from its owner's transform plus offset.
/// Returns how many boxes were refreshed.
pub fn update_bounding_boxes(components: &mut ComponentRegistry) -> usize {
    components.register::<Transform>();
    let Some((aabbs, transforms)) = components.pair_mut::<Aabb, Transform>() else {
        return 0;
    };
    let mut refreshed = 0;
    for (entity, aabb) in aabbs.iter_mut() {
        let base = transforms
            .get(entity)
            .map(|transform| transform.position)
            .unwrap_or_default();
        aabb.center = base + aabb.offset;
        refreshed += 1;
    }
    refreshed
}

/// Live entities registered in a cell, grouped by collision layer.
pub fn partitioned_collision_map(
    partition: &Partition,
    aabbs: &ComponentMap<Aabb>,
    cell: Cell,
) -> BTreeMap<CollisionLayer, Vec<Entity>> {
    let mut groups: BTreeMap<CollisionLayer, Vec<Entity>> = BTreeMap::new();
    for entity in partition.partitioned_entities(cell.x, cell.y) {
        match aabbs.get(entity) {
            Some(aabb) if aabb.alive => groups.entry(aabb.layer).or_default().push(entity),
            _ => {}
        }
    }
    groups
}

/// Bodies for one collision pass, addressable by entity.
#[derive(Debug, Default)]
pub struct BodySet {
    bodies: Vec<Body>,
    index: HashMap<Entity, usize>,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: Body) {
        match self.index.get(&body.entity) {
            Some(&i) => self.bodies[i] = body,
            None => {
                self.index.insert(body.entity, self.bodies.len());
                self.bodies.push(body);
            }
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&Body> {
        self.index.get(&entity).map(|&i| &self.bodies[i])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut Body> {
        let i = *self.index.get(&entity)?;
        Some(&mut self.bodies[i])
    }

    pub fn pair_mut(&mut self, a: Entity, b: Entity) -> Option<(&mut Body, &mut Body)> {
        let (i, j) = (*self.index.get(&a)?, *self.index.get(&b)?);
        if i == j {
            return None;
        }
        if i < j {
            let (left, right) = self.bodies.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.bodies.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollisionStats {
    pub cells_checked: usize,
    pub pairs_tested: usize,
    pub hits: usize,
    pub responses: usize,
}

/// One frame's narrow phase. Each unordered entity pair is tested at most
/// once, however many cells it shares.
pub struct CollisionPass<'a> {
    rules: &'a LayerRules,
    responses: &'a ResponseTable,
    dt: f32,
    tested: HashSet<(Entity, Entity)>,
    stats: CollisionStats,
    events: Vec<CollisionEvent>,
}

impl<'a> CollisionPass<'a> {
    pub fn new(rules: &'a LayerRules, responses: &'a ResponseTable, dt: f32) -> Self {
        Self {
            rules,
            responses,
            dt,
            tested: HashSet::new(),
            stats: CollisionStats::default(),
            events: Vec::new(),
        }
    }

    /// Tests every permitted layer pairing within one cell's groups.
    pub fn process_partitioned_entities(
        &mut self,
        groups: &BTreeMap<CollisionLayer, Vec<Entity>>,
        bodies: &mut BodySet,
    ) {
        self.stats.cells_checked += 1;
        for (&layer, members) in groups {
            if self.rules.collides_with_self(layer) {
                for (i, &a) in members.iter().enumerate() {
                    for &b in &members[i + 1..] {
                        self.test_pair(a, b, bodies);
                    }
                }
            }
            for (&other, others) in groups.range((
                std::ops::Bound::Excluded(layer),
                std::ops::Bound::Unbounded,
            )) {
                if !self.rules.allows(layer, other) {
                    continue;
                }
                for &a in members {
                    for &b in others {
                        self.test_pair(a, b, bodies);
                    }
                }
            }
        }
    }

    fn test_pair(&mut self, a: Entity, b: Entity, bodies: &mut BodySet) {
        let key = if a < b { (a, b) } else { (b, a) };
        if !self.tested.insert(key) {
            return;
        }
        let Some((first, second)) = bodies.pair_mut(a, b) else {
            return;
        };
        self.stats.pairs_tested += 1;

        let hit = check_collision(
            Rect::from_center(first.center, first.half_extents),
            first.velocity,
            Rect::from_center(second.center, second.half_extents),
            second.velocity,
            self.dt,
        );
        let Some(hit) = hit else {
            return;
        };
        self.stats.hits += 1;

        let mut contact = Contact {
            hit,
            events: &mut self.events,
        };
        if self.responses.respond(first, second, &mut contact) {
            self.stats.responses += 1;
        }
    }

    pub fn stats(&self) -> CollisionStats {
        self.stats
    }

    pub fn finish(self) -> (CollisionStats, Vec<CollisionEvent>) {
        debug!(
            cells = self.stats.cells_checked,
            pairs = self.stats.pairs_tested,
            hits = self.stats.hits,
            events = self.events.len(),
            "collision pass finished"
        );
        (self.stats, self.events)
    }
}
