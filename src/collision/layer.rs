//! Collision layers and the static table of which layers may touch

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionLayer {
    Background,
    Tiles,
    Enemy,
    Player,
    Goal,
    UiElements,
    Gate,
    Collectible,
    Burrowable,
    SolidEnvironment,
    Pushable,
    Interactable,
}

impl CollisionLayer {
    pub const COUNT: usize = 12;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Background,
        Self::Tiles,
        Self::Enemy,
        Self::Player,
        Self::Goal,
        Self::UiElements,
        Self::Gate,
        Self::Collectible,
        Self::Burrowable,
        Self::SolidEnvironment,
        Self::Pushable,
        Self::Interactable,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Background art and UI never enter the spatial partition.
    pub fn is_partitioned(self) -> bool {
        !matches!(self, Self::Background | Self::UiElements)
    }

    /// Layers that stop movement and block navigation cells.
    pub fn is_wall(self) -> bool {
        matches!(self, Self::Tiles | Self::SolidEnvironment)
    }
}

/// Symmetric permission table, built once and consulted for every candidate
/// pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRules {
    masks: [u16; CollisionLayer::COUNT],
    self_collide: [bool; CollisionLayer::COUNT],
}

impl LayerRules {
    pub fn empty() -> Self {
        Self {
            masks: [0; CollisionLayer::COUNT],
            self_collide: [false; CollisionLayer::COUNT],
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (CollisionLayer, CollisionLayer)>) -> Self {
        let mut rules = Self::empty();
        for (a, b) in pairs {
            rules.allow(a, b);
        }
        rules
    }

    pub fn allow(&mut self, a: CollisionLayer, b: CollisionLayer) {
        if a == b {
            self.self_collide[a.index()] = true;
        } else {
            self.masks[a.index()] |= 1 << b.index();
            self.masks[b.index()] |= 1 << a.index();
        }
    }

    pub fn allows(&self, a: CollisionLayer, b: CollisionLayer) -> bool {
        if a == b {
            self.self_collide[a.index()]
        } else {
            self.masks[a.index()] & (1 << b.index()) != 0
        }
    }

    pub fn collides_with_self(&self, layer: CollisionLayer) -> bool {
        self.self_collide[layer.index()]
    }

    pub fn partners(&self, layer: CollisionLayer) -> impl Iterator<Item = CollisionLayer> + '_ {
        CollisionLayer::ALL
            .into_iter()
            .filter(move |other| self.allows(layer, *other))
    }
}

impl Default for LayerRules {
    fn default() -> Self {
        use CollisionLayer::*;

        Self::from_pairs([
            (Player, Tiles),
            (Player, SolidEnvironment),
            (Player, Enemy),
            (Player, Goal),
            (Player, Gate),
            (Player, Collectible),
            (Player, Burrowable),
            (Player, Pushable),
            (Player, Interactable),
            (Enemy, Tiles),
            (Enemy, SolidEnvironment),
            (Enemy, Gate),
            (Enemy, Pushable),
            (Pushable, Tiles),
            (Pushable, SolidEnvironment),
            (Pushable, Gate),
            (Pushable, Pushable),
        ])
    }
}
