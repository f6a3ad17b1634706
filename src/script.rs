//! Named script hooks invoked for gameplay events

use std::collections::HashMap;

use crate::ecs::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptArgs {
    pub subject: Entity,
    pub other: Entity,
    pub frame: u64,
}

pub trait ScriptDispatch {
    /// Runs the script registered as `name`. Returns `false` when there is
    /// none.
    fn exec(&mut self, name: &str, args: &ScriptArgs) -> bool;
}

type Script = Box<dyn FnMut(&ScriptArgs) + Send>;

#[derive(Default)]
pub struct ScriptTable {
    scripts: HashMap<String, Script>,
}

impl ScriptTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        script: impl FnMut(&ScriptArgs) + Send + 'static,
    ) {
        self.scripts.insert(name.into(), Box::new(script));
    }

    pub fn with(
        mut self,
        name: impl Into<String>,
        script: impl FnMut(&ScriptArgs) + Send + 'static,
    ) -> Self {
        self.register(name, script);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl ScriptDispatch for ScriptTable {
    fn exec(&mut self, name: &str, args: &ScriptArgs) -> bool {
        match self.scripts.get_mut(name) {
            Some(script) => {
                script(args);
                true
            }
            None => false,
        }
    }
}
