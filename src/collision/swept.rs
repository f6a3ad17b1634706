//! Continuous (swept) AABB narrow phase

use glam::Vec2;

/// Relative speeds below this are treated as zero on that axis.
pub const VELOCITY_EPSILON: f32 = 1e-6;

/// Axis-aligned rectangle in world space. Edges are closed: touching counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Overlap depth per axis; negative on an axis means a gap.
    pub fn overlap(&self, other: &Rect) -> Vec2 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    pub fn translate(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    pub fn union(&self, other: &Rect) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Area covered while moving by `delta`: start and end boxes joined.
    pub fn swept(&self, delta: Vec2) -> Self {
        self.union(&self.translate(delta))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    pub fn set(self, v: &mut Vec2, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptHit {
    /// Earliest time in `[0, dt]` at which both axes overlap.
    pub t_first: f32,
    /// Time at which the boxes separate again, capped at `dt`.
    pub t_last: f32,
    /// Axis whose contact started last, i.e. the one that is being hit.
    pub axis: Axis,
}

/// Swept test of two moving boxes over `[0, dt]`.
///
/// For each axis, computes when `b` (moving at `vb - va` relative to `a`)
/// enters and leaves `a`'s extent; the boxes touch only while both axes
/// overlap. Argument order does not affect the outcome.
pub fn check_collision(a: Rect, va: Vec2, b: Rect, vb: Vec2, dt: f32) -> Option<SweptHit> {
    if !a.is_valid() || !b.is_valid() || !va.is_finite() || !vb.is_finite() {
        return None;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let relative = vb - va;

    let (enter_x, exit_x) = axis_interval(a.min.x, a.max.x, b.min.x, b.max.x, relative.x)?;
    let (enter_y, exit_y) = axis_interval(a.min.y, a.max.y, b.min.y, b.max.y, relative.y)?;

    let t_first = enter_x.max(enter_y).max(0.0);
    let t_last = exit_x.min(exit_y).min(dt);
    if t_first > t_last {
        return None;
    }

    let axis = if enter_x.max(enter_y) > 0.0 {
        if enter_x >= enter_y {
            Axis::X
        } else {
            Axis::Y
        }
    } else {
        // Already overlapping: resolve along the shallower axis.
        let depth = a.overlap(&b);
        if depth.x <= depth.y {
            Axis::X
        } else {
            Axis::Y
        }
    };

    Some(SweptHit {
        t_first,
        t_last,
        axis,
    })
}

/// Entry/exit times of `[b_min, b_max]` moving at `v` against a fixed
/// `[a_min, a_max]`. `None` when the ranges never overlap.
fn axis_interval(a_min: f32, a_max: f32, b_min: f32, b_max: f32, v: f32) -> Option<(f32, f32)> {
    if v.abs() < VELOCITY_EPSILON {
        return if b_min <= a_max && a_min <= b_max {
            Some((f32::NEG_INFINITY, f32::INFINITY))
        } else {
            None
        };
    }
    if v > 0.0 {
        Some(((a_min - b_max) / v, (a_max - b_min) / v))
    } else {
        Some(((a_max - b_min) / v, (a_min - b_max) / v))
    }
}

/// Point-in-box test for cursor picking; no sweep.
pub fn check_cursor_collision(point: Vec2, rect: Rect) -> bool {
    rect.is_valid() && rect.contains(point)
}
