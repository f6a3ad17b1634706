use anyhow::Result;
use tracing::{debug, trace};

use crate::{
    engine::{System, SystemContext},
    world::World,
};

/// Clears and refills the spatial partition, then recomputes the camera's
/// active set.
pub struct PartitionSystem;

impl PartitionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PartitionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PartitionSystem {
    fn name(&self) -> &str {
        "partition"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
        if !world.partition().is_ready() {
            debug!(frame = ctx.frame, "partition not initialised, skipping rebuild");
            return Ok(());
        }
        let placed = world.rebuild_partition(&ctx.camera, ctx.dt);
        trace!(frame = ctx.frame, placed, "partition rebuilt");
        Ok(())
    }
}
