//! Navigation grid for enemy pathfinding, laid over the same cells as the
//! partition

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use glam::Vec2;
use tracing::debug;

use super::{Cell, GridBounds};
use crate::components::Aabb;
use crate::ecs::ComponentMap;

#[derive(Debug, Clone)]
pub struct NavGrid {
    grid: GridBounds,
    blocked: Vec<bool>,
}

impl NavGrid {
    pub fn new(grid: GridBounds) -> Self {
        let blocked = vec![false; grid.cell_count()];
        Self { grid, blocked }
    }

    /// Marks every cell whose interior a live wall box covers.
    pub fn build(grid: GridBounds, aabbs: &ComponentMap<Aabb>) -> Self {
        let mut nav = Self::new(grid);
        for (_, aabb) in aabbs.iter() {
            if !aabb.alive || !aabb.layer.is_wall() {
                continue;
            }
            let rect = aabb.rect();
            if !rect.is_valid() {
                continue;
            }
            if let Some(span) = nav.grid.interior_span(rect.min, rect.max) {
                for cell in span.cells() {
                    nav.set_blocked(cell, true);
                }
            }
        }
        debug!(
            blocked = nav.blocked.iter().filter(|b| **b).count(),
            cells = nav.blocked.len(),
            "navigation grid built"
        );
        nav
    }

    pub fn grid(&self) -> &GridBounds {
        &self.grid
    }

    /// Out-of-range cells count as blocked.
    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.grid
            .cell_index(cell)
            .map(|i| self.blocked[i])
            .unwrap_or(true)
    }

    pub fn set_blocked(&mut self, cell: Cell, blocked: bool) {
        if let Some(i) = self.grid.cell_index(cell) {
            self.blocked[i] = blocked;
        }
    }

    pub fn world_to_cell(&self, point: Vec2) -> Option<Cell> {
        self.grid.world_to_cell(point)
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        self.grid.cell_center(cell)
    }

    /// Open 4-connected neighbours.
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        self.grid
            .neighbors(cell)
            .into_iter()
            .filter(|n| !self.is_blocked(*n))
            .collect()
    }

    /// A* over open cells with a Manhattan heuristic. The path includes both
    /// endpoints; `None` when either endpoint is blocked or unreachable.
    pub fn find_path(&self, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        if self.is_blocked(start) || self.is_blocked(goal) {
            return None;
        }
        let start_index = self.grid.cell_index(start)?;
        let mut cost = vec![u32::MAX; self.blocked.len()];
        let mut came_from: Vec<Option<Cell>> = vec![None; self.blocked.len()];
        let mut open = BinaryHeap::new();

        cost[start_index] = 0;
        open.push(Reverse((GridBounds::manhattan(start, goal), 0u32, start)));

        while let Some(Reverse((_, g, cell))) = open.pop() {
            if cell == goal {
                return Some(self.reconstruct(&came_from, goal));
            }
            let index = self.grid.cell_index(cell)?;
            if g > cost[index] {
                continue;
            }
            for next in self.neighbors(cell) {
                let Some(next_index) = self.grid.cell_index(next) else {
                    continue;
                };
                let next_cost = g + 1;
                if next_cost < cost[next_index] {
                    cost[next_index] = next_cost;
                    came_from[next_index] = Some(cell);
                    let estimate = next_cost + GridBounds::manhattan(next, goal);
                    open.push(Reverse((estimate, next_cost, next)));
                }
            }
        }
        None
    }

    fn reconstruct(&self, came_from: &[Option<Cell>], goal: Cell) -> Vec<Cell> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(previous) = self
            .grid
            .cell_index(current)
            .and_then(|i| came_from[i])
        {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionLayer;
    use crate::ecs::Entity;

    fn open_grid(size: f32) -> NavGrid {
        NavGrid::new(GridBounds::new(Vec2::ZERO, Vec2::splat(size), 1.0).unwrap())
    }

    #[test]
    fn straight_path_on_open_grid() {
        let nav = open_grid(5.0);
        let path = nav.find_path(Cell::new(0, 0), Cell::new(3, 0)).unwrap();
        assert_eq!(path.first(), Some(&Cell::new(0, 0)));
        assert_eq!(path.last(), Some(&Cell::new(3, 0)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn path_routes_around_wall() {
        let mut nav = open_grid(5.0);
        for y in 0..4 {
            nav.set_blocked(Cell::new(2, y), true);
        }
        let path = nav.find_path(Cell::new(0, 0), Cell::new(4, 0)).unwrap();
        assert!(path.iter().all(|c| !nav.is_blocked(*c)));
        assert!(path.contains(&Cell::new(2, 4)));
        assert_eq!(path.len(), 13);
        for pair in path.windows(2) {
            assert_eq!(GridBounds::manhattan(pair[0], pair[1]), 1);
        }
    }

    #[test]
    fn sealed_goal_is_unreachable() {
        let mut nav = open_grid(3.0);
        nav.set_blocked(Cell::new(1, 2), true);
        nav.set_blocked(Cell::new(2, 1), true);
        assert!(nav.find_path(Cell::new(0, 0), Cell::new(2, 2)).is_none());
        assert!(nav.find_path(Cell::new(0, 0), Cell::new(1, 2)).is_none());
        assert!(nav.find_path(Cell::new(0, 0), Cell::new(9, 9)).is_none());
    }

    #[test]
    fn build_blocks_wall_interiors_only() {
        let grid = GridBounds::new(Vec2::ZERO, Vec2::splat(4.0), 1.0).unwrap();
        let mut aabbs = ComponentMap::<Aabb>::new();

        let mut wall = Aabb::new(CollisionLayer::Tiles, Vec2::new(1.0, 0.5));
        wall.center = Vec2::new(2.0, 1.5);
        aabbs.insert(Entity::new(0, 1), wall).unwrap();

        let mut player = Aabb::new(CollisionLayer::Player, Vec2::splat(0.5));
        player.center = Vec2::new(0.5, 0.5);
        aabbs.insert(Entity::new(1, 1), player).unwrap();

        let nav = NavGrid::build(grid, &aabbs);
        assert!(nav.is_blocked(Cell::new(1, 1)));
        assert!(nav.is_blocked(Cell::new(2, 1)));
        assert!(!nav.is_blocked(Cell::new(3, 1)));
        assert!(!nav.is_blocked(Cell::new(1, 0)));
        assert!(!nav.is_blocked(Cell::new(0, 0)));
        assert_eq!(nav.neighbors(Cell::new(1, 0)), vec![Cell::new(0, 0), Cell::new(2, 0)]);
    }
}
