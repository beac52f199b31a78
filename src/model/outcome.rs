use serde::{Deserialize, Serialize};

use super::inventory::{CatalystType, EssenceType};

/// A material granted by an action or boss reward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemDrop {
    Essence(EssenceType),
    Catalyst(CatalystType),
}

/// Result of resolving a character action. Narrative text is what the chat
/// layer would relay to the player.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActionOutcome {
    pub success: bool,
    pub xp_gained: i64,
    pub levels_gained: u32,
    pub damage_taken: i32,
    pub hp_restored: i32,
    #[serde(default)]
    pub drops: Vec<ItemDrop>,
    pub narrative: String,
    /// Set when the action killed the character.
    #[serde(default)]
    pub died: bool,
}

impl ActionOutcome {
    pub fn success(narrative: impl Into<String>) -> Self {
        Self {
            success: true,
            narrative: narrative.into(),
            ..Self::default()
        }
    }

    pub fn failure(narrative: impl Into<String>) -> Self {
        Self {
            success: false,
            narrative: narrative.into(),
            ..Self::default()
        }
    }

    pub fn with_xp(mut self, xp: i64, levels: u32) -> Self {
        self.xp_gained = xp;
        self.levels_gained = levels;
        self
    }

    pub fn with_drop(mut self, drop: ItemDrop) -> Self {
        self.drops.push(drop);
        self
    }
}
