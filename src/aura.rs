//! Legendary auras: guild-scoped blessings with hard holder caps.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{GameError, Result};
use crate::model::class::CharacterClass;

/// Shared boss-damage multiplier while the Song is held anywhere in the guild.
pub const SONG_DAMAGE_BONUS: f64 = 1.05;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuraType {
    /// Max 2 holders. The whole guild strikes bosses 5% harder; holders
    /// shrug off a sliver of every curse.
    SongOfNilfheim,
    /// Max 1 holder.
    HerosMark,
    /// Max 1 holder, Necromancers only.
    GraveboundPresence,
}

impl AuraType {
    pub fn display_name(&self) -> &'static str {
        match self {
            AuraType::SongOfNilfheim => "Song of Nilfheim",
            AuraType::HerosMark => "Hero's Mark",
            AuraType::GraveboundPresence => "Gravebound Presence",
        }
    }

    pub fn holder_cap(&self) -> usize {
        match self {
            AuraType::SongOfNilfheim => 2,
            AuraType::HerosMark | AuraType::GraveboundPresence => 1,
        }
    }

    fn allows_class(&self, class: CharacterClass) -> bool {
        match self {
            AuraType::GraveboundPresence => class == CharacterClass::Necromancer,
            _ => true,
        }
    }
}

impl fmt::Display for AuraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Tracks aura holders per guild.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AuraBoard {
    holders: HashMap<String, HashMap<AuraType, Vec<String>>>,
}

impl AuraBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants an aura, enforcing the holder cap and class gate.
    pub fn grant(
        &mut self,
        guild_id: &str,
        user_id: &str,
        class: CharacterClass,
        aura: AuraType,
    ) -> Result<()> {
        if !aura.allows_class(class) {
            return Err(GameError::ActionNotAllowed(format!(
                "{} cannot carry the {}",
                class,
                aura.display_name()
            )));
        }
        let holders = self
            .holders
            .entry(guild_id.to_string())
            .or_default()
            .entry(aura)
            .or_default();
        if holders.iter().any(|h| h == user_id) {
            return Ok(());
        }
        if holders.len() >= aura.holder_cap() {
            return Err(GameError::ActionNotAllowed(format!(
                "the {} already has {} holder(s)",
                aura.display_name(),
                aura.holder_cap()
            )));
        }
        holders.push(user_id.to_string());
        info!(
            "guild {}: {} now carries the {}",
            guild_id,
            user_id,
            aura.display_name()
        );
        Ok(())
    }

    pub fn revoke(&mut self, guild_id: &str, user_id: &str, aura: AuraType) {
        if let Some(guild) = self.holders.get_mut(guild_id) {
            if let Some(holders) = guild.get_mut(&aura) {
                holders.retain(|h| h != user_id);
            }
        }
    }

    pub fn holders(&self, guild_id: &str, aura: AuraType) -> &[String] {
        self.holders
            .get(guild_id)
            .and_then(|g| g.get(&aura))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has(&self, guild_id: &str, user_id: &str, aura: AuraType) -> bool {
        self.holders(guild_id, aura).iter().any(|h| h == user_id)
    }

    /// Guild-wide boss damage multiplier from the Song of Nilfheim.
    pub fn song_damage_bonus(&self, guild_id: &str) -> f64 {
        if self.holders(guild_id, AuraType::SongOfNilfheim).is_empty() {
            1.0
        } else {
            SONG_DAMAGE_BONUS
        }
    }

    /// Curse-effect reduction while the Song is held anywhere in the guild:
    /// a random factor in 0.98..=0.99 for every member. Guilds without a
    /// holder get 1.0.
    pub fn song_curse_reduction<R: Rng + ?Sized>(&self, guild_id: &str, rng: &mut R) -> f64 {
        if self.holders(guild_id, AuraType::SongOfNilfheim).is_empty() {
            1.0
        } else {
            rng.gen_range(0.98..=0.99)
        }
    }

    pub fn clear_guild(&mut self, guild_id: &str) {
        self.holders.remove(guild_id);
    }
}
