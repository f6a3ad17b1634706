//! Camera viewport used to compute the partition's active set

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    /// Half the viewport size in world units at zoom 1.
    pub half_viewport: Vec2,
}

impl Camera {
    pub fn new(position: Vec2, half_viewport: Vec2) -> Self {
        Self {
            position,
            zoom: 1.0,
            half_viewport,
        }
    }

    /// World-space rectangle the camera sees. A non-positive zoom is treated
    /// as 1.
    pub fn viewport(&self) -> Rect {
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        };
        Rect::from_center(self.position, self.half_viewport.abs() / zoom)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::new(640.0, 360.0))
    }
}

/// Source of the camera for the current frame.
pub trait CameraProvider {
    fn camera(&self) -> Camera;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedCamera(pub Camera);

impl CameraProvider for FixedCamera {
    fn camera(&self) -> Camera {
        self.0
    }
}
