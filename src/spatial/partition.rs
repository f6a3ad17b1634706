//! Per-axis bitset partition.
//!
//! Each grid column and each grid row owns an [`EntityBitset`] indexed by
//! entity slot. An entity occupies cell `(x, y)` iff its bit is set in both
//! `columns[x]` and `rows[y]`. The partition is cleared and rebuilt from the
//! AABB map every frame; a cell query is the AND of one column and one row.
//! Moving boxes are binned over the whole area they sweep during the frame.

use tracing::{debug, info};

use super::{Cell, CellRect, EntityBitset, GridBounds, LevelBounds, SpatialError};
use crate::camera::Camera;
use crate::collision::Rect;
use crate::components::{Aabb, Motion};
use crate::ecs::{ComponentMap, Entity};

pub struct Partition {
    grid: Option<GridBounds>,
    columns: Vec<EntityBitset>,
    rows: Vec<EntityBitset>,
    /// Handle currently registered under each slot index.
    occupants: Vec<Entity>,
    active: EntityBitset,
    active_rect: Option<CellRect>,
    capacity: usize,
}

impl Partition {
    pub fn new(capacity: usize) -> Self {
        Self {
            grid: None,
            columns: Vec::new(),
            rows: Vec::new(),
            occupants: vec![Entity::NULL; capacity],
            active: EntityBitset::new(capacity),
            active_rect: None,
            capacity,
        }
    }

    /// Sizes the grid from the level bounds. Called again on every level
    /// change; previous contents are discarded.
    pub fn init(&mut self, bounds: &dyn LevelBounds, cell_size: f32) -> Result<(), SpatialError> {
        let (bottom_left, top_right) = bounds.bounds();
        let grid = GridBounds::new(bottom_left, top_right, cell_size)?;

        self.columns = vec![EntityBitset::new(self.capacity); grid.width() as usize];
        self.rows = vec![EntityBitset::new(self.capacity); grid.height() as usize];
        self.occupants.fill(Entity::NULL);
        self.active.clear();
        self.active_rect = None;

        info!(
            width = grid.width(),
            height = grid.height(),
            cell_size,
            capacity = self.capacity,
            "partition initialised"
        );
        self.grid = Some(grid);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.grid.is_some()
    }

    pub fn grid(&self) -> Option<&GridBounds> {
        self.grid.as_ref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn column(&self, x: u32) -> Option<&EntityBitset> {
        self.columns.get(x as usize)
    }

    pub fn row(&self, y: u32) -> Option<&EntityBitset> {
        self.rows.get(y as usize)
    }

    fn ensure_capacity(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        debug!(from = self.capacity, to = capacity, "growing partition bitsets");
        for bits in self.columns.iter_mut().chain(self.rows.iter_mut()) {
            bits.grow(capacity);
        }
        self.active.grow(capacity);
        self.occupants.resize(capacity, Entity::NULL);
        self.capacity = capacity;
    }

    /// Clears every bitset, growing them first to hold `slot_capacity`
    /// entities.
    pub fn reset(&mut self, slot_capacity: usize) {
        self.ensure_capacity(slot_capacity);
        for bits in self.columns.iter_mut().chain(self.rows.iter_mut()) {
            bits.clear();
        }
        self.occupants.fill(Entity::NULL);
    }

    /// Registers `entity` in every cell `rect` touches. Returns `false` when
    /// the partition is not initialised or the box lies outside the grid.
    pub fn insert(&mut self, entity: Entity, rect: Rect) -> bool {
        if entity.is_null() || !rect.is_valid() {
            return false;
        }
        let Some(span) = self.grid.as_ref().and_then(|g| g.cell_span(rect.min, rect.max)) else {
            return false;
        };
        let index = entity.index() as usize;
        self.ensure_capacity(index + 1);

        for x in span.columns() {
            self.columns[x as usize].set(index);
        }
        for y in span.rows() {
            self.rows[y as usize].set(index);
        }
        self.occupants[index] = entity;
        true
    }

    /// Clears and refills the partition from the live, partitioned AABBs.
    /// A box with a `Motion` covers its start and its position after `dt`.
    /// Returns how many boxes were placed.
    pub fn rebuild(
        &mut self,
        aabbs: &ComponentMap<Aabb>,
        motions: Option<&ComponentMap<Motion>>,
        dt: f32,
        slot_capacity: usize,
    ) -> usize {
        self.reset(slot_capacity);
        if !self.is_ready() {
            return 0;
        }
        let mut placed = 0;
        for (entity, aabb) in aabbs.iter() {
            if !aabb.alive || !aabb.layer.is_partitioned() {
                continue;
            }
            let rect = match motions.and_then(|motions| motions.get(entity)) {
                Some(motion) if motion.velocity.is_finite() => {
                    aabb.rect().swept(motion.velocity * dt)
                }
                _ => aabb.rect(),
            };
            if self.insert(entity, rect) {
                placed += 1;
            }
        }
        placed
    }

    /// Drops `entity` from every cell and from the active set. Stale handles
    /// whose slot now belongs to another entity are ignored.
    pub fn evict(&mut self, entity: Entity) -> bool {
        let index = entity.index() as usize;
        if entity.is_null() || self.occupant(index) != Some(entity) {
            return false;
        }
        for bits in self.columns.iter_mut().chain(self.rows.iter_mut()) {
            bits.unset(index);
        }
        self.active.unset(index);
        self.occupants[index] = Entity::NULL;
        true
    }

    /// Recomputes the active set: every entity in a cell the camera sees.
    pub fn update_active(&mut self, camera: &Camera) {
        self.active.clear();
        let view = camera.viewport();
        self.active_rect = self
            .grid
            .as_ref()
            .and_then(|g| g.cell_span(view.min, view.max));

        if let Some(rect) = self.active_rect {
            for cell in rect.cells() {
                let (column, row) = (&self.columns[cell.x as usize], &self.rows[cell.y as usize]);
                self.active.union_intersection(column, row);
            }
        }
    }

    fn cell_bits(&self, x: u32, y: u32) -> Option<(&EntityBitset, &EntityBitset)> {
        Some((self.columns.get(x as usize)?, self.rows.get(y as usize)?))
    }

    fn occupant(&self, index: usize) -> Option<Entity> {
        self.occupants
            .get(index)
            .copied()
            .filter(|entity| !entity.is_null())
    }

    /// Entities registered in cell `(x, y)`; empty when out of range.
    pub fn partitioned_entities(&self, x: u32, y: u32) -> Vec<Entity> {
        let Some((column, row)) = self.cell_bits(x, y) else {
            return Vec::new();
        };
        EntityBitset::intersection(column, row)
            .filter_map(|index| self.occupant(index))
            .collect()
    }

    /// Whether cell `(x, y)` holds more than one entity, i.e. could produce a
    /// collision pair.
    pub fn verify_partition(&self, x: u32, y: u32) -> bool {
        self.cell_bits(x, y)
            .map(|(column, row)| EntityBitset::intersection_count(column, row) > 1)
            .unwrap_or(false)
    }

    /// Cells that pass [`Partition::verify_partition`], row-major.
    pub fn candidate_cells(&self) -> Vec<Cell> {
        let Some(grid) = &self.grid else {
            return Vec::new();
        };
        let mut cells = Vec::new();
        for y in 0..grid.height() {
            if self.rows[y as usize].count_ones() < 2 {
                continue;
            }
            for x in 0..grid.width() {
                if self.verify_partition(x, y) {
                    cells.push(Cell::new(x, y));
                }
            }
        }
        cells
    }

    pub fn active_rect(&self) -> Option<CellRect> {
        self.active_rect
    }

    pub fn active_entities(&self) -> Vec<Entity> {
        self.active
            .iter()
            .filter_map(|index| self.occupant(index))
            .collect()
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        let index = entity.index() as usize;
        self.active.contains(index) && self.occupant(index) == Some(entity)
    }
}

impl Default for Partition {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionLayer;
    use crate::spatial::FixedBounds;
    use glam::Vec2;

    fn ready_partition() -> Partition {
        let mut partition = Partition::new(8);
        partition
            .init(&FixedBounds::new(Vec2::ZERO, Vec2::splat(16.0)), 4.0)
            .unwrap();
        partition
    }

    fn square(center: Vec2, half: f32) -> Rect {
        Rect::from_center(center, Vec2::splat(half))
    }

    #[test]
    fn box_on_cell_edges_fills_both_neighbours() {
        let mut partition = ready_partition();
        let e = Entity::new(3, 1);
        assert!(partition.insert(e, square(Vec2::splat(9.0), 1.0)));

        for x in 0..4 {
            let expected = x == 1 || x == 2;
            assert_eq!(partition.column(x).unwrap().contains(3), expected, "column {x}");
            assert_eq!(partition.row(x).unwrap().contains(3), expected, "row {x}");
        }
        assert_eq!(partition.partitioned_entities(2, 1), vec![e]);
        assert!(partition.partitioned_entities(0, 0).is_empty());
    }

    #[test]
    fn verify_needs_two_occupants() {
        let mut partition = ready_partition();
        partition.insert(Entity::new(0, 1), square(Vec2::splat(2.0), 1.0));
        assert!(!partition.verify_partition(0, 0));

        partition.insert(Entity::new(1, 1), square(Vec2::splat(3.0), 0.5));
        assert!(partition.verify_partition(0, 0));
        assert_eq!(partition.candidate_cells(), vec![Cell::new(0, 0)]);
    }

    #[test]
    fn out_of_range_queries_are_empty() {
        let partition = ready_partition();
        assert!(partition.partitioned_entities(4, 0).is_empty());
        assert!(partition.partitioned_entities(0, 99).is_empty());
        assert!(!partition.verify_partition(17, 17));
    }

    #[test]
    fn uninitialised_partition_accepts_nothing() {
        let mut partition = Partition::new(4);
        assert!(!partition.is_ready());
        assert!(!partition.insert(Entity::new(0, 1), square(Vec2::ZERO, 1.0)));
        assert!(partition.candidate_cells().is_empty());
    }

    #[test]
    fn high_slot_index_grows_capacity() {
        let mut partition = ready_partition();
        let e = Entity::new(500, 2);
        assert!(partition.insert(e, square(Vec2::splat(1.0), 0.5)));
        assert!(partition.capacity() >= 501);
        assert_eq!(partition.partitioned_entities(0, 0), vec![e]);
    }

    #[test]
    fn rebuild_skips_dead_and_unpartitioned_boxes() {
        let mut partition = ready_partition();
        let mut aabbs = ComponentMap::<Aabb>::new();

        let mut place = |index: u32, layer: CollisionLayer, alive: bool| {
            let entity = Entity::new(index, 1);
            let mut aabb = Aabb::new(layer, Vec2::splat(1.0));
            aabb.center = Vec2::splat(2.0);
            aabb.alive = alive;
            aabbs.insert(entity, aabb).unwrap();
            entity
        };
        let player = place(0, CollisionLayer::Player, true);
        place(1, CollisionLayer::UiElements, true);
        place(2, CollisionLayer::Collectible, false);
        let wall = place(3, CollisionLayer::Tiles, true);

        assert_eq!(partition.rebuild(&aabbs, None, 1.0, 4), 2);
        let mut found = partition.partitioned_entities(0, 0);
        found.sort();
        assert_eq!(found, vec![player, wall]);

        // Second rebuild starts from a clean slate.
        aabbs.get_mut(wall).unwrap().center = Vec2::splat(14.0);
        partition.rebuild(&aabbs, None, 1.0, 4);
        assert_eq!(partition.partitioned_entities(0, 0), vec![player]);
    }

    #[test]
    fn moving_box_covers_its_path() {
        let mut partition = ready_partition();
        let mut aabbs = ComponentMap::<Aabb>::new();
        let mut motions = ComponentMap::<Motion>::new();

        let runner = Entity::new(0, 1);
        let mut aabb = Aabb::new(CollisionLayer::Player, Vec2::splat(1.0));
        aabb.center = Vec2::splat(2.0);
        aabbs.insert(runner, aabb).unwrap();
        motions
            .insert(runner, Motion::with_velocity(Vec2::new(20.0, 0.0)))
            .unwrap();

        partition.rebuild(&aabbs, Some(&motions), 0.5, 4);
        for x in 0..4 {
            assert_eq!(partition.partitioned_entities(x, 0), vec![runner], "cell ({x}, 0)");
        }
        assert!(partition.partitioned_entities(0, 1).is_empty());

        partition.rebuild(&aabbs, None, 0.5, 4);
        assert!(partition.partitioned_entities(2, 0).is_empty());
    }

    #[test]
    fn evicted_entity_leaves_cells_and_active_set() {
        let mut partition = ready_partition();
        let gone = Entity::new(0, 1);
        let kept = Entity::new(1, 1);
        partition.insert(gone, square(Vec2::splat(2.0), 0.5));
        partition.insert(kept, square(Vec2::splat(3.0), 0.5));
        partition.update_active(&Camera::new(Vec2::splat(2.0), Vec2::splat(1.0)));
        assert!(partition.verify_partition(0, 0));

        assert!(!partition.evict(Entity::new(0, 2)));
        assert!(partition.evict(gone));
        assert!(!partition.evict(gone));

        assert_eq!(partition.partitioned_entities(0, 0), vec![kept]);
        assert!(!partition.verify_partition(0, 0));
        assert_eq!(partition.active_entities(), vec![kept]);
        assert!(!partition.column(0).unwrap().contains(0));
    }

    #[test]
    fn camera_selects_active_entities() {
        let mut partition = ready_partition();
        let near = Entity::new(0, 1);
        let far = Entity::new(1, 1);
        partition.insert(near, square(Vec2::splat(2.0), 0.5));
        partition.insert(far, square(Vec2::splat(14.0), 0.5));

        partition.update_active(&Camera::new(Vec2::splat(2.0), Vec2::splat(1.0)));
        assert_eq!(partition.active_entities(), vec![near]);
        assert!(partition.is_active(near));
        assert!(!partition.is_active(far));
        assert!(!partition.is_active(Entity::new(0, 2)));
    }
}
