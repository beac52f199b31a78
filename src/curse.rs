//! World curses: guild-wide debuffs applied when a boss despawns undefeated.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::model::character::Character;
use crate::encounter::WorldFlag;

/// Curse weight class. Normal boss failures apply minor curses, super boss
/// failures apply major ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CurseSeverity {
    Minor,
    Major,
}

/// When a curse lifts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CurseDuration {
    UntilNextSpawn,
    UntilNextDefeat,
}

/// The curse catalog. Effects are read by the action resolvers and the boss
/// coordinator; this module only tracks which are active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorldCurse {
    // Minor (normal boss failure)
    /// Max HP temporarily reduced by 10%.
    CurseOfFrailty,
    /// STR effectiveness -10% for physical classes.
    CurseOfWeakness,
    /// AGI damage-reduction cap lowered from 30% to 25%.
    CurseOfSluggishSteps,
    /// XP gained -5% (floored at 90% of the base).
    CurseOfCloudedMind,
    /// Item drop chance -5%.
    CurseOfIllFortune,
    /// Battle defeat damage +10%.
    CurseOfBleedingWounds,
    /// Battle victory XP variance shifts lower.
    CurseOfWaningResolve,
    // Major (super boss failure)
    /// Enemies deal +10% damage; next boss HP +10%.
    EclipseOfNilfheim,
    /// Defeat damage +15%; the dead walk thicker.
    MarchOfTheDead,
    /// Resurrection recovery 24h -> 36h.
    FadingHope,
    /// Action charge refresh +2 hours slower.
    FrozenTime,
    /// Effectiveness multipliers compress: 1.3x -> 1.25x, 0.85x -> 0.8x.
    ShatteredReality,
    /// Damage variance widens to +/-35%.
    WorldAflame,
    /// Battle victories restore less HP.
    PriceOfSurvival,
}

impl WorldCurse {
    pub const MINOR: [WorldCurse; 7] = [
        WorldCurse::CurseOfFrailty,
        WorldCurse::CurseOfWeakness,
        WorldCurse::CurseOfSluggishSteps,
        WorldCurse::CurseOfCloudedMind,
        WorldCurse::CurseOfIllFortune,
        WorldCurse::CurseOfBleedingWounds,
        WorldCurse::CurseOfWaningResolve,
    ];

    pub const MAJOR: [WorldCurse; 7] = [
        WorldCurse::EclipseOfNilfheim,
        WorldCurse::MarchOfTheDead,
        WorldCurse::FadingHope,
        WorldCurse::FrozenTime,
        WorldCurse::ShatteredReality,
        WorldCurse::WorldAflame,
        WorldCurse::PriceOfSurvival,
    ];

    pub fn severity(&self) -> CurseSeverity {
        if WorldCurse::MINOR.contains(self) {
            CurseSeverity::Minor
        } else {
            CurseSeverity::Major
        }
    }

    pub fn duration(&self) -> CurseDuration {
        match self {
            // Frozen Time is the one major curse that lifts on spawn.
            WorldCurse::FrozenTime => CurseDuration::UntilNextSpawn,
            c if c.severity() == CurseSeverity::Minor => CurseDuration::UntilNextSpawn,
            _ => CurseDuration::UntilNextDefeat,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WorldCurse::CurseOfFrailty => "Curse of Frailty",
            WorldCurse::CurseOfWeakness => "Curse of Weakness",
            WorldCurse::CurseOfSluggishSteps => "Curse of Sluggish Steps",
            WorldCurse::CurseOfCloudedMind => "Curse of Clouded Mind",
            WorldCurse::CurseOfIllFortune => "Curse of Ill Fortune",
            WorldCurse::CurseOfBleedingWounds => "Curse of Bleeding Wounds",
            WorldCurse::CurseOfWaningResolve => "Curse of Waning Resolve",
            WorldCurse::EclipseOfNilfheim => "Eclipse of Nilfheim",
            WorldCurse::MarchOfTheDead => "March of the Dead",
            WorldCurse::FadingHope => "Fading Hope",
            WorldCurse::FrozenTime => "Frozen Time",
            WorldCurse::ShatteredReality => "Shattered Reality",
            WorldCurse::WorldAflame => "World Aflame",
            WorldCurse::PriceOfSurvival => "Price of Survival",
        }
    }

    pub fn flavor(&self) -> &'static str {
        match self {
            WorldCurse::CurseOfFrailty => "The cold seeps into bone and marrow.",
            WorldCurse::CurseOfWeakness => "Steel feels heavier in your grasp.",
            WorldCurse::CurseOfSluggishSteps => "The winds of Nilfheim resist every movement.",
            WorldCurse::CurseOfCloudedMind => "Thoughts scatter like frostbitten ash.",
            WorldCurse::CurseOfIllFortune => "Luck turns its gaze away.",
            WorldCurse::CurseOfBleedingWounds => "Wounds refuse to close.",
            WorldCurse::CurseOfWaningResolve => "Doubt gnaws at the spirit.",
            WorldCurse::EclipseOfNilfheim => "The sky darkens. Hope thins.",
            WorldCurse::MarchOfTheDead => "The fallen refuse to rest.",
            WorldCurse::FadingHope => "The light grows harder to summon.",
            WorldCurse::FrozenTime => "Time itself slows beneath the frost.",
            WorldCurse::ShatteredReality => "Reality fractures under eldritch strain.",
            WorldCurse::WorldAflame => "Nilfheim burns with unnatural fury.",
            WorldCurse::PriceOfSurvival => "Every victory exacts a toll.",
        }
    }

    pub fn random_minor<R: Rng + ?Sized>(rng: &mut R) -> WorldCurse {
        Self::MINOR[rng.gen_range(0..Self::MINOR.len())]
    }

    pub fn random_major<R: Rng + ?Sized>(rng: &mut R) -> WorldCurse {
        Self::MAJOR[rng.gen_range(0..Self::MAJOR.len())]
    }
}

impl fmt::Display for WorldCurse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Active curses per guild. At most one minor and one major at a time; a new
/// curse of the same severity replaces the old one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CurseBoard {
    active: HashMap<String, Vec<WorldCurse>>,
}

impl CurseBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, guild_id: &str, curse: WorldCurse) {
        let curses = self.active.entry(guild_id.to_string()).or_default();
        curses.retain(|c| c.severity() != curse.severity());
        curses.push(curse);
        info!("guild {}: {} takes hold", guild_id, curse.display_name());
    }

    pub fn active(&self, guild_id: &str) -> &[WorldCurse] {
        self.active.get(guild_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, guild_id: &str, curse: WorldCurse) -> bool {
        self.active(guild_id).contains(&curse)
    }

    pub fn clear_all(&mut self, guild_id: &str) {
        self.active.remove(guild_id);
    }

    /// Lifts `UntilNextSpawn` curses when a new boss rises.
    pub fn clear_on_spawn(&mut self, guild_id: &str) {
        self.retain_where(guild_id, |c| c.duration() != CurseDuration::UntilNextSpawn);
    }

    /// Lifts `UntilNextDefeat` curses when a boss falls.
    pub fn clear_on_defeat(&mut self, guild_id: &str) {
        self.retain_where(guild_id, |c| c.duration() != CurseDuration::UntilNextDefeat);
    }

    fn retain_where<F: Fn(&WorldCurse) -> bool>(&mut self, guild_id: &str, keep: F) {
        if let Some(curses) = self.active.get_mut(guild_id) {
            curses.retain(|c| keep(c));
            if curses.is_empty() {
                self.active.remove(guild_id);
            }
        }
    }
}

/// Resistance multiplier applied to a curse's effect on one character.
/// 1.0 means full effect; values below 1.0 soften it.
pub fn curse_resistance(character: &Character) -> f64 {
    if character.has_flag(WorldFlag::OathOfNull) {
        return 0.95;
    }
    if character.modifiers.curse_resistance > 1.0 {
        return 1.0 / character.modifiers.curse_resistance;
    }
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::class::CharacterClass;

    #[test]
    fn board_holds_one_minor_one_major() {
        let mut board = CurseBoard::new();
        board.apply("g", WorldCurse::CurseOfFrailty);
        board.apply("g", WorldCurse::EclipseOfNilfheim);
        assert_eq!(board.active("g").len(), 2);
        board.apply("g", WorldCurse::CurseOfIllFortune);
        let active = board.active("g");
        assert_eq!(active.len(), 2);
        assert!(active.contains(&WorldCurse::CurseOfIllFortune));
        assert!(!active.contains(&WorldCurse::CurseOfFrailty));
        assert!(active.contains(&WorldCurse::EclipseOfNilfheim));
    }

    #[test]
    fn spawn_and_defeat_lift_by_duration() {
        let mut board = CurseBoard::new();
        board.apply("g", WorldCurse::CurseOfFrailty);
        board.apply("g", WorldCurse::MarchOfTheDead);
        board.clear_on_spawn("g");
        assert_eq!(board.active("g"), &[WorldCurse::MarchOfTheDead]);
        board.clear_on_defeat("g");
        assert!(board.active("g").is_empty());
    }

    #[test]
    fn frozen_time_lifts_on_spawn() {
        let mut board = CurseBoard::new();
        board.apply("g", WorldCurse::FrozenTime);
        board.clear_on_spawn("g");
        assert!(board.active("g").is_empty());
    }

    #[test]
    fn oath_of_null_softens_curses() {
        let mut c = crate::model::character::Character::new("g", "u", "Hero", CharacterClass::Rogue);
        assert_eq!(curse_resistance(&c), 1.0);
        c.set_flag(WorldFlag::OathOfNull);
        assert_eq!(curse_resistance(&c), 0.95);
    }

    #[test]
    fn soul_anchor_resistance_divides_modifier() {
        let mut c = crate::model::character::Character::new("g", "u", "Hero", CharacterClass::Rogue);
        c.modifiers.curse_resistance = 1.15;
        let r = curse_resistance(&c);
        assert!((r - 1.0 / 1.15).abs() < 1e-9);
    }
}
