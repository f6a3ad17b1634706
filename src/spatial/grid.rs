//! Uniform grid geometry shared by the partition and the navigation grid

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::SpatialError;

/// Cell position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min: Cell,
    pub max: Cell,
}

impl CellRect {
    pub fn columns(&self) -> std::ops::RangeInclusive<u32> {
        self.min.x..=self.max.x
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<u32> {
        self.min.y..=self.max.y
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.columns().contains(&cell.x) && self.rows().contains(&cell.y)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.rows()
            .flat_map(move |y| self.columns().map(move |x| Cell::new(x, y)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridBounds {
    bottom_left: Vec2,
    top_right: Vec2,
    cell_size: f32,
    width: u32,
    height: u32,
}

impl GridBounds {
    /// Derives `ceil(extent / cell_size)` cells per axis, at least one.
    pub fn new(bottom_left: Vec2, top_right: Vec2, cell_size: f32) -> Result<Self, SpatialError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(SpatialError::InvalidCellSize(cell_size));
        }
        if !bottom_left.is_finite() || !top_right.is_finite() || top_right.cmplt(bottom_left).any()
        {
            return Err(SpatialError::InvalidBounds {
                bottom_left,
                top_right,
            });
        }
        let extent = top_right - bottom_left;
        let width = ((extent.x / cell_size).ceil() as u32).max(1);
        let height = ((extent.y / cell_size).ceil() as u32).max(1);
        Ok(Self {
            bottom_left,
            top_right,
            cell_size,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn bottom_left(&self) -> Vec2 {
        self.bottom_left
    }

    pub fn top_right(&self) -> Vec2 {
        self.top_right
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    pub fn cell_index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.y as usize * self.width as usize + cell.x as usize)
        } else {
            None
        }
    }

    pub fn world_to_cell(&self, point: Vec2) -> Option<Cell> {
        if !point.is_finite() {
            return None;
        }
        let local = (point - self.bottom_left) / self.cell_size;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let cell = Cell::new(local.x.floor() as u32, local.y.floor() as u32);
        self.contains(cell).then_some(cell)
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        self.bottom_left
            + (Vec2::new(cell.x as f32, cell.y as f32) + Vec2::splat(0.5)) * self.cell_size
    }

    /// Cells a box touches, treating cells as closed squares so a box lying on
    /// a cell edge lands in both neighbours. Clamped to the grid; `None` when
    /// the box lies entirely outside.
    pub fn cell_span(&self, min: Vec2, max: Vec2) -> Option<CellRect> {
        let lo = (min - self.bottom_left) / self.cell_size;
        let hi = (max - self.bottom_left) / self.cell_size;
        self.clamp_span(
            (lo.x.ceil() - 1.0, lo.y.ceil() - 1.0),
            (hi.x.floor(), hi.y.floor()),
        )
    }

    /// Cells whose interior a box overlaps with positive area.
    pub fn interior_span(&self, min: Vec2, max: Vec2) -> Option<CellRect> {
        let lo = (min - self.bottom_left) / self.cell_size;
        let hi = (max - self.bottom_left) / self.cell_size;
        self.clamp_span(
            (lo.x.floor(), lo.y.floor()),
            (hi.x.ceil() - 1.0, hi.y.ceil() - 1.0),
        )
    }

    fn clamp_span(&self, lo: (f32, f32), hi: (f32, f32)) -> Option<CellRect> {
        let values = [lo.0, lo.1, hi.0, hi.1];
        if values.iter().any(|v| v.is_nan()) {
            return None;
        }
        let (max_x, max_y) = (self.width as f32 - 1.0, self.height as f32 - 1.0);
        if hi.0 < 0.0 || hi.1 < 0.0 || lo.0 > max_x || lo.1 > max_y || lo.0 > hi.0 || lo.1 > hi.1 {
            return None;
        }
        Some(CellRect {
            min: Cell::new(lo.0.max(0.0) as u32, lo.1.max(0.0) as u32),
            max: Cell::new(hi.0.min(max_x) as u32, hi.1.min(max_y) as u32),
        })
    }

    /// Neighboring cells (4-connectivity)
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        let mut neighbors = Vec::with_capacity(4);

        // South
        if cell.y > 0 {
            neighbors.push(Cell::new(cell.x, cell.y - 1));
        }
        // North
        if cell.y + 1 < self.height {
            neighbors.push(Cell::new(cell.x, cell.y + 1));
        }
        // West
        if cell.x > 0 {
            neighbors.push(Cell::new(cell.x - 1, cell.y));
        }
        // East
        if cell.x + 1 < self.width {
            neighbors.push(Cell::new(cell.x + 1, cell.y));
        }

        neighbors
    }

    /// Manhattan distance between two cells
    pub fn manhattan(a: Cell, b: Cell) -> u32 {
        a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
    }
}
