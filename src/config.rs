//! Engine configuration read from the level file

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::collision::{CollisionLayer, LayerRules};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Initial bitset capacity; grows with the entity slot count.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,
    /// Padding around computed level bounds.
    #[serde(default = "default_bounds_margin")]
    pub bounds_margin: f32,
}

fn default_cell_size() -> f32 {
    64.0
}

fn default_max_entities() -> usize {
    1700
}

fn default_bounds_margin() -> f32 {
    32.0
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            max_entities: default_max_entities(),
            bounds_margin: default_bounds_margin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub position: Vec2,
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default = "default_half_viewport")]
    pub half_viewport: Vec2,
}

fn default_zoom() -> f32 {
    1.0
}

fn default_half_viewport() -> Vec2 {
    Vec2::new(640.0, 360.0)
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: default_zoom(),
            half_viewport: default_half_viewport(),
        }
    }
}

impl CameraConfig {
    pub fn camera(&self) -> Camera {
        Camera {
            position: self.position,
            zoom: self.zoom,
            half_viewport: self.half_viewport,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionConfig {
    /// Replaces the built-in layer table when present.
    #[serde(default)]
    pub rules: Option<Vec<[CollisionLayer; 2]>>,
}

impl CollisionConfig {
    pub fn layer_rules(&self) -> LayerRules {
        match &self.rules {
            Some(pairs) => LayerRules::from_pairs(pairs.iter().map(|[a, b]| (*a, *b))),
            None => LayerRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
