//! Level bounds providers consumed by `Partition::init`

use glam::Vec2;

use crate::components::{Aabb, Transform};
use crate::ecs::ComponentRegistry;

/// Supplies the world-space extrema of the current level.
pub trait LevelBounds {
    /// `(bottom_left, top_right)`
    fn bounds(&self) -> (Vec2, Vec2);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedBounds {
    pub bottom_left: Vec2,
    pub top_right: Vec2,
}

impl FixedBounds {
    pub fn new(bottom_left: Vec2, top_right: Vec2) -> Self {
        Self {
            bottom_left,
            top_right,
        }
    }
}

impl LevelBounds for FixedBounds {
    fn bounds(&self) -> (Vec2, Vec2) {
        (self.bottom_left, self.top_right)
    }
}

/// Extrema of every partitioned AABB, measured from transforms so it is
/// valid before the first bounding-box refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedBounds {
    bottom_left: Vec2,
    top_right: Vec2,
}

impl ComputedBounds {
    pub fn from_components(components: &ComponentRegistry, margin: f32) -> Self {
        let mut bottom_left = Vec2::splat(f32::INFINITY);
        let mut top_right = Vec2::splat(f32::NEG_INFINITY);

        if let Some(aabbs) = components.component_array::<Aabb>() {
            for (entity, aabb) in aabbs.iter() {
                if !aabb.layer.is_partitioned() {
                    continue;
                }
                let base = components
                    .get_component::<Transform>(entity)
                    .map(|t| t.position)
                    .unwrap_or(Vec2::ZERO);
                let center = base + aabb.offset;
                let rect = aabb.rect_at(center);
                if !rect.is_valid() {
                    continue;
                }
                bottom_left = bottom_left.min(rect.min);
                top_right = top_right.max(rect.max);
            }
        }

        if !bottom_left.is_finite() || !top_right.is_finite() {
            return Self {
                bottom_left: Vec2::ZERO,
                top_right: Vec2::ZERO,
            };
        }
        let margin = Vec2::splat(margin.max(0.0));
        Self {
            bottom_left: bottom_left - margin,
            top_right: top_right + margin,
        }
    }
}

impl LevelBounds for ComputedBounds {
    fn bounds(&self) -> (Vec2, Vec2) {
        (self.bottom_left, self.top_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionLayer;
    use crate::ecs::Entity;

    #[test]
    fn computed_bounds_cover_partitioned_boxes() {
        let mut components = ComponentRegistry::new();
        let a = Entity::new(0, 1);
        let b = Entity::new(1, 1);
        let ui = Entity::new(2, 1);

        components
            .add_component(a, Transform::at(Vec2::new(-4.0, 2.0)))
            .unwrap();
        components
            .add_component(a, Aabb::new(CollisionLayer::Tiles, Vec2::splat(1.0)))
            .unwrap();
        components
            .add_component(b, Transform::at(Vec2::new(10.0, 20.0)))
            .unwrap();
        components
            .add_component(b, Aabb::new(CollisionLayer::Player, Vec2::new(2.0, 3.0)))
            .unwrap();
        components
            .add_component(ui, Transform::at(Vec2::new(500.0, 500.0)))
            .unwrap();
        components
            .add_component(ui, Aabb::new(CollisionLayer::UiElements, Vec2::ONE))
            .unwrap();

        let bounds = ComputedBounds::from_components(&components, 1.0);
        assert_eq!(
            bounds.bounds(),
            (Vec2::new(-6.0, 0.0), Vec2::new(13.0, 24.0))
        );
    }

    #[test]
    fn empty_level_collapses_to_origin() {
        let components = ComponentRegistry::new();
        let bounds = ComputedBounds::from_components(&components, 5.0);
        assert_eq!(bounds.bounds(), (Vec2::ZERO, Vec2::ZERO));
    }
}
