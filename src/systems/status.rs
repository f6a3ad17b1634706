use anyhow::Result;

use crate::{
    components::Status,
    engine::{System, SystemContext},
    world::World,
};

/// Counts down invulnerability timers.
pub struct StatusSystem;

impl StatusSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StatusSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for StatusSystem {
    fn name(&self) -> &str {
        "status"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>, world: &mut World) -> Result<()> {
        let Some(statuses) = world.component_array_mut::<Status>() else {
            return Ok(());
        };
        for (_, status) in statuses.iter_mut() {
            status.invulnerable_for = (status.invulnerable_for - ctx.dt).max(0.0);
        }
        Ok(())
    }
}
