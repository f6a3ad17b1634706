//! Entity handles and the entity registry

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Generation-checked entity handle.
///
/// The slot `index` is reused after a sweep, but the generation is bumped each
/// time, so a handle is never issued twice within a session. Generations start
/// at 1, which keeps `to_bits() == 0` free for [`Entity::NULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub const NULL: Self = Self {
        index: 0,
        generation: 0,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    pub fn is_null(self) -> bool {
        self.generation == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Authoritative per-entity record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityInfo {
    pub name: String,
    pub archetype: Option<String>,
}

impl EntityInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            archetype: None,
        }
    }
}

struct Slot {
    generation: u32,
    info: Option<EntityInfo>,
}

/// Issues entity handles and stages deletions until the frame sweep.
pub struct EntityRegistry {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    pending: BTreeSet<Entity>,
    live: usize,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            pending: BTreeSet::new(),
            live: 0,
        }
    }

    pub fn create(&mut self, info: EntityInfo) -> Entity {
        let entity = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.info = Some(info);
            Entity::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                info: Some(info),
            });
            Entity::new(index, 1)
        };
        self.live += 1;
        entity
    }

    pub fn get(&self, entity: Entity) -> Option<&EntityInfo> {
        let slot = self.slots.get(entity.index as usize)?;
        if slot.generation != entity.generation {
            return None;
        }
        slot.info.as_ref()
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityInfo> {
        let slot = self.slots.get_mut(entity.index as usize)?;
        if slot.generation != entity.generation {
            return None;
        }
        slot.info.as_mut()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Stages `entity` for removal at the next sweep. Returns `false` for
    /// handles that are not alive.
    pub fn mark_for_delete(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.pending.insert(entity);
        true
    }

    pub fn is_pending_delete(&self, entity: Entity) -> bool {
        self.pending.contains(&entity)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn take_pending(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Frees the slot behind `entity` and bumps its generation.
    pub(crate) fn free(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slots.get_mut(entity.index as usize) else {
            return false;
        };
        if slot.generation != entity.generation || slot.info.is_none() {
            return false;
        }
        slot.info = None;
        slot.generation = slot.generation.checked_add(1).unwrap_or(1);
        self.free_list.push(entity.index);
        self.live -= 1;
        true
    }

    pub fn count(&self) -> usize {
        self.live
    }

    /// Highest slot index ever issued plus one; sizes per-entity bitsets.
    pub fn slot_capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &EntityInfo)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.info
                .as_ref()
                .map(|info| (Entity::new(index as u32, slot.generation), info))
        })
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
