//! Spatial model - uniform grid broad phase and navigation grid

pub mod bitset;
pub mod bounds;
pub mod grid;
pub mod nav;
pub mod partition;

use glam::Vec2;
use thiserror::Error;

pub use bitset::EntityBitset;
pub use bounds::{ComputedBounds, FixedBounds, LevelBounds};
pub use grid::{Cell, CellRect, GridBounds};
pub use nav::NavGrid;
pub use partition::Partition;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    #[error("cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),

    #[error("level bounds {bottom_left:?}..{top_right:?} are not a valid rectangle")]
    InvalidBounds { bottom_left: Vec2, top_right: Vec2 },
}
