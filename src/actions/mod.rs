//! Character actions: validated parsing at the boundary, one resolver per
//! action behind a common trait, closed dispatch over the action enum.

pub mod battle;
pub mod donate;
pub mod duel;
pub mod explore;
pub mod rest;
pub mod resurrect;
pub mod train;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::aura::AuraBoard;
use crate::config::GuildConfig;
use crate::curse::{curse_resistance, WorldCurse};
use crate::data::GameData;
use crate::errors::Result;
use crate::model::character::Character;
use crate::model::outcome::ActionOutcome;

/// The closed set of player actions. Unknown input never reaches dispatch;
/// it fails at parse time with the valid set in the error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Explore,
    Train,
    Battle,
    Rest,
    Duel,
    Donate,
    Resurrect,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Explore,
        ActionKind::Train,
        ActionKind::Battle,
        ActionKind::Rest,
        ActionKind::Duel,
        ActionKind::Donate,
        ActionKind::Resurrect,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Explore => "explore",
            ActionKind::Train => "train",
            ActionKind::Battle => "battle",
            ActionKind::Rest => "rest",
            ActionKind::Duel => "duel",
            ActionKind::Donate => "donate",
            ActionKind::Resurrect => "resurrect",
        }
    }

    /// Actions that need a second character (opponent or recipient).
    pub fn needs_partner(&self) -> bool {
        matches!(self, ActionKind::Duel | ActionKind::Donate)
    }

    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "explore" => Ok(ActionKind::Explore),
            "train" => Ok(ActionKind::Train),
            "battle" | "fight" => Ok(ActionKind::Battle),
            "rest" => Ok(ActionKind::Rest),
            "duel" => Ok(ActionKind::Duel),
            "donate" => Ok(ActionKind::Donate),
            "resurrect" | "revive" => Ok(ActionKind::Resurrect),
            other => Err(other.to_string()),
        }
    }
}

/// Everything a resolver may read or mutate while resolving one action.
/// The engine holds the character (and partner, where one applies) under
/// exclusive access for the whole resolution.
pub struct ActionContext<'a> {
    pub guild_id: &'a str,
    pub config: &'a GuildConfig,
    pub curses: &'a [WorldCurse],
    pub auras: &'a AuraBoard,
    pub data: &'a GameData,
    pub now: DateTime<Utc>,
    pub character: &'a mut Character,
    pub partner: Option<&'a mut Character>,
    /// For donations: whether the recipient sits in the bottom half of the
    /// guild by available charges. Computed by the engine.
    pub donation_eligible: bool,
}

impl ActionContext<'_> {
    pub fn has_curse(&self, curse: WorldCurse) -> bool {
        self.curses.contains(&curse)
    }

    /// Combined softening factor for curse effects on this character:
    /// personal resistance times the guild-wide Song of Nilfheim reduction.
    pub fn curse_factor(&self, rng: &mut dyn RngCore) -> f64 {
        let song = self.auras.song_curse_reduction(self.guild_id, rng);
        curse_resistance(self.character) * song
    }
}

/// One resolver per action kind.
pub trait ActionResolver: Send + Sync {
    fn kind(&self) -> ActionKind;

    /// Whether performing this action costs an action charge.
    fn requires_charge(&self) -> bool {
        true
    }

    fn resolve(&self, ctx: &mut ActionContext<'_>, rng: &mut dyn RngCore)
        -> Result<ActionOutcome>;
}

/// Closed dispatch over the action enum.
pub fn resolver_for(kind: ActionKind) -> &'static dyn ActionResolver {
    match kind {
        ActionKind::Explore => &explore::ExploreResolver,
        ActionKind::Train => &train::TrainResolver,
        ActionKind::Battle => &battle::BattleResolver,
        ActionKind::Rest => &rest::RestResolver,
        ActionKind::Duel => &duel::DuelResolver,
        ActionKind::Donate => &donate::DonateResolver,
        ActionKind::Resurrect => &resurrect::ResurrectResolver,
    }
}

/// Shared XP pipeline: guild multiplier is already folded into `base`.
/// Applies the INT bonus (capped 15%), the LUCK floor, and the Clouded Mind
/// penalty (never below 90% of base).
pub fn xp_pipeline(base: f64, ctx: &ActionContext<'_>, curse_factor: f64) -> i64 {
    let character = &ctx.character;
    let int_bonus = ((character.effective_stat(crate::model::class::StatKind::Intelligence)
        as f64)
        * 0.01)
        .min(0.15);
    let mut xp = base * (1.0 + int_bonus);
    let luck_floor =
        base * (1.0 + (character.effective_stat(crate::model::class::StatKind::Luck) as f64) / 20.0);
    xp = xp.max(luck_floor);
    if ctx.has_curse(WorldCurse::CurseOfCloudedMind) {
        let penalty = 0.05 * curse_factor;
        xp = (xp * (1.0 - penalty)).max(base * 0.90);
    }
    xp.floor().max(0.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases_and_case() {
        assert_eq!("EXPLORE".parse::<ActionKind>().unwrap(), ActionKind::Explore);
        assert_eq!("fight".parse::<ActionKind>().unwrap(), ActionKind::Battle);
        assert_eq!("revive".parse::<ActionKind>().unwrap(), ActionKind::Resurrect);
        assert!("dance".parse::<ActionKind>().is_err());
    }

    #[test]
    fn dispatch_covers_every_kind() {
        for kind in ActionKind::ALL {
            assert_eq!(resolver_for(kind).kind(), kind);
        }
    }

    #[test]
    fn partner_requirement_is_duel_and_donate_only() {
        assert!(ActionKind::Duel.needs_partner());
        assert!(ActionKind::Donate.needs_partner());
        assert!(!ActionKind::Explore.needs_partner());
    }
}
