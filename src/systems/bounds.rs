use anyhow::Result;
use tracing::trace;

use crate::{
    collision::update_bounding_boxes,
    engine::{System, SystemContext},
    world::World,
};

/// Refreshes every AABB centre from its owner's transform.
pub struct BoundsSystem;

impl BoundsSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BoundsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BoundsSystem {
    fn name(&self) -> &str {
        "bounds"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
        let refreshed = update_bounding_boxes(world.components_mut());
        trace!(frame = ctx.frame, refreshed, "bounding boxes updated");
        Ok(())
    }
}
