use anyhow::Result;

use crate::{
    components::{Motion, Transform},
    engine::{System, SystemContext},
    world::World,
};

/// Explicit Euler integration: `v += a * dt`, then `p += v * dt`.
pub struct MotionSystem;

impl MotionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MotionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MotionSystem {
    fn name(&self) -> &str {
        "motion"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
        let dt = ctx.dt;
        let Some((motions, transforms)) = world.components_mut().pair_mut::<Motion, Transform>()
        else {
            return Ok(());
        };
        for (entity, motion) in motions.iter_mut() {
            motion.velocity += motion.acceleration * dt;
            if let Some(transform) = transforms.get_mut(entity) {
                transform.position += motion.velocity * dt;
            }
        }
        Ok(())
    }
}
