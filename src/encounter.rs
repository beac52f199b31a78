//! Irrevocable world encounters: deity pacts, relics, world flags, and the
//! stat interaction events woven into exploration.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::character::Character;
use crate::model::class::{CharacterClass, StatKind};

/// Chance per explore of a world encounter (1%).
pub const ENCOUNTER_CHANCE: f64 = 0.01;
/// Minimum level before encounters can appear.
pub const ENCOUNTER_MIN_LEVEL: u32 = 5;
/// Lifetime trigger cap per encounter type.
pub const ENCOUNTER_MAX_TRIGGERS: u8 = 3;

/// Minimum level before stat interactions can appear.
pub const INTERACTION_MIN_LEVEL: u32 = 10;
/// Lifetime trigger cap per interaction kind.
pub const INTERACTION_MAX_TRIGGERS: u8 = 3;

/// Permanent marks left on a character by the world itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorldFlag {
    /// Swore the Oath of Null: +5% curse resistance, forever.
    OathOfNull,
    /// Passed (or failed) a disguised god's test.
    DivineTested,
}

/// The three deities that may offer a pact at a stonebound shrine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeityType {
    /// War god: +15% STR effectiveness, -5% INT.
    Vaelgor,
    /// Wind goddess: +15% AGI effectiveness, -5% STR.
    Ilyra,
    /// Keeper of secrets: +15% INT effectiveness, -5% AGI.
    Nereth,
}

impl DeityType {
    pub fn display_name(&self) -> &'static str {
        match self {
            DeityType::Vaelgor => "Vaelgor, the Crimson Oath",
            DeityType::Ilyra => "Ilyra of the Endless Wind",
            DeityType::Nereth => "Nereth, Keeper of the Deep Word",
        }
    }

    /// Which deity would court a given class.
    pub fn preferred_for(class: CharacterClass) -> DeityType {
        match class {
            CharacterClass::Warrior | CharacterClass::Knight | CharacterClass::Oathbreaker => {
                DeityType::Vaelgor
            }
            CharacterClass::Rogue => DeityType::Ilyra,
            CharacterClass::Mage | CharacterClass::Priest | CharacterClass::Necromancer => {
                DeityType::Nereth
            }
        }
    }

    /// Applies the pact's permanent stat-effectiveness trade.
    pub fn apply(&self, character: &mut Character) {
        character.deity = Some(*self);
        let m = &mut character.modifiers;
        match self {
            DeityType::Vaelgor => {
                m.strength_eff *= 1.15;
                m.intelligence_eff *= 0.95;
            }
            DeityType::Ilyra => {
                m.agility_eff *= 1.15;
                m.strength_eff *= 0.95;
            }
            DeityType::Nereth => {
                m.intelligence_eff *= 1.15;
                m.agility_eff *= 0.95;
            }
        }
    }
}

impl fmt::Display for DeityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Blood relics: power at a price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelicType {
    /// +10% boss damage, -5% max HP.
    BloodForgedBlade,
    /// +10% agility defense cap, charges refresh one hour slower.
    FrozenCrown,
    /// +15% curse resistance, -10% XP rate.
    SoulAnchor,
}

impl RelicType {
    pub const ALL: [RelicType; 3] = [
        RelicType::BloodForgedBlade,
        RelicType::FrozenCrown,
        RelicType::SoulAnchor,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            RelicType::BloodForgedBlade => "Blood-Forged Blade",
            RelicType::FrozenCrown => "Frozen Crown",
            RelicType::SoulAnchor => "Soul Anchor",
        }
    }

    pub fn apply(&self, character: &mut Character) {
        character.relic = Some(*self);
        let m = &mut character.modifiers;
        match self {
            RelicType::BloodForgedBlade => {
                m.boss_damage *= 1.10;
                m.max_hp *= 0.95;
                let new_max = ((character.stats.max_hp as f64) * 0.95).floor() as i32;
                character.stats.max_hp = new_max.max(1);
                character.stats.current_hp = character.stats.current_hp.min(new_max);
            }
            RelicType::FrozenCrown => {
                m.agi_defense_cap_bonus += 0.10;
            }
            RelicType::SoulAnchor => {
                m.curse_resistance *= 1.15;
                m.xp_rate *= 0.90;
            }
        }
    }
}

impl fmt::Display for RelicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The four irrevocable encounter types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorldEncounterType {
    StoneboundDivinity,
    DisguisedGodTest,
    OathOfNull,
    BloodRelic,
}

impl WorldEncounterType {
    pub const ALL: [WorldEncounterType; 4] = [
        WorldEncounterType::StoneboundDivinity,
        WorldEncounterType::DisguisedGodTest,
        WorldEncounterType::OathOfNull,
        WorldEncounterType::BloodRelic,
    ];
}

/// Stat interaction events encountered while exploring. Each is governed by
/// one stat and has a base requirement that scales with level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatInteractionType {
    FrostboundBoulder,
    FrozenGate,
    CollapsingIceBridge,
    NarrowCrevice,
    WhisperingBarrier,
    AncientLibrary,
    BuriedCache,
    MysteriousGlimmer,
    BlizzardPassage,
    ToxicMiasma,
}

impl StatInteractionType {
    pub const ALL: [StatInteractionType; 10] = [
        StatInteractionType::FrostboundBoulder,
        StatInteractionType::FrozenGate,
        StatInteractionType::CollapsingIceBridge,
        StatInteractionType::NarrowCrevice,
        StatInteractionType::WhisperingBarrier,
        StatInteractionType::AncientLibrary,
        StatInteractionType::BuriedCache,
        StatInteractionType::MysteriousGlimmer,
        StatInteractionType::BlizzardPassage,
        StatInteractionType::ToxicMiasma,
    ];

    pub fn governing_stat(&self) -> StatKind {
        match self {
            StatInteractionType::FrostboundBoulder | StatInteractionType::FrozenGate => {
                StatKind::Strength
            }
            StatInteractionType::CollapsingIceBridge | StatInteractionType::NarrowCrevice => {
                StatKind::Agility
            }
            StatInteractionType::WhisperingBarrier | StatInteractionType::AncientLibrary => {
                StatKind::Intelligence
            }
            StatInteractionType::BuriedCache | StatInteractionType::MysteriousGlimmer => {
                StatKind::Luck
            }
            StatInteractionType::BlizzardPassage | StatInteractionType::ToxicMiasma => {
                StatKind::MaxHp
            }
        }
    }

    pub fn base_requirement(&self) -> i32 {
        match self {
            StatInteractionType::FrostboundBoulder => 10,
            StatInteractionType::FrozenGate => 12,
            StatInteractionType::CollapsingIceBridge => 10,
            StatInteractionType::NarrowCrevice => 15,
            StatInteractionType::WhisperingBarrier => 12,
            StatInteractionType::AncientLibrary => 18,
            StatInteractionType::BuriedCache => 10,
            StatInteractionType::MysteriousGlimmer => 15,
            StatInteractionType::BlizzardPassage => 100,
            StatInteractionType::ToxicMiasma => 120,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StatInteractionType::FrostboundBoulder => "Frostbound Boulder",
            StatInteractionType::FrozenGate => "Frozen Gate",
            StatInteractionType::CollapsingIceBridge => "Collapsing Ice Bridge",
            StatInteractionType::NarrowCrevice => "Narrow Crevice",
            StatInteractionType::WhisperingBarrier => "Whispering Barrier",
            StatInteractionType::AncientLibrary => "Ancient Library",
            StatInteractionType::BuriedCache => "Buried Cache",
            StatInteractionType::MysteriousGlimmer => "Mysterious Glimmer",
            StatInteractionType::BlizzardPassage => "Blizzard Passage",
            StatInteractionType::ToxicMiasma => "Toxic Miasma",
        }
    }

    /// Requirement at a given character level.
    pub fn requirement_at(&self, level: u32) -> i32 {
        self.base_requirement() + ((level as f64) * 1.5).floor() as i32
    }
}

/// Outcome of a resolved encounter or interaction, folded into the
/// exploration narrative.
#[derive(Debug, Clone)]
pub struct EncounterOutcome {
    pub xp: i64,
    pub narrative: String,
}

/// Rolls for a world encounter during exploration. Returns the type to
/// resolve, or None. The first encounter never fires for a character that
/// already carries a permanent choice.
pub fn roll_world_encounter<R: Rng + ?Sized>(
    character: &Character,
    rng: &mut R,
) -> Option<WorldEncounterType> {
    if character.level < ENCOUNTER_MIN_LEVEL {
        return None;
    }
    if rng.gen::<f64>() >= ENCOUNTER_CHANCE {
        return None;
    }
    let candidates: Vec<WorldEncounterType> = WorldEncounterType::ALL
        .iter()
        .copied()
        .filter(|t| {
            character.encounter_triggers.get(t).copied().unwrap_or(0) < ENCOUNTER_MAX_TRIGGERS
        })
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let pick = candidates[rng.gen_range(0..candidates.len())];
    // Irrevocable choices are once-in-a-lifetime crossroads; a character who
    // already chose cannot be offered another.
    let offers_choice = matches!(
        pick,
        WorldEncounterType::StoneboundDivinity
            | WorldEncounterType::OathOfNull
            | WorldEncounterType::BloodRelic
    );
    if offers_choice && character.has_permanent_choice() {
        return None;
    }
    Some(pick)
}

/// Resolves a world encounter, mutating the character.
pub fn resolve_world_encounter<R: Rng + ?Sized>(
    character: &mut Character,
    kind: WorldEncounterType,
    rng: &mut R,
) -> EncounterOutcome {
    *character.encounter_triggers.entry(kind).or_insert(0) += 1;
    info!(
        "world encounter {:?} for {} (level {})",
        kind, character.name, character.level
    );
    match kind {
        WorldEncounterType::StoneboundDivinity => resolve_divinity(character, rng),
        WorldEncounterType::DisguisedGodTest => {
            character.set_flag(WorldFlag::DivineTested);
            let xp = 40 + (character.level as i64) * 5;
            EncounterOutcome {
                xp,
                narrative: "A ragged traveler tests your charity, then sheds the disguise \
                            in a blaze of light. The god's blessing lingers as insight."
                    .to_string(),
            }
        }
        WorldEncounterType::OathOfNull => {
            character.set_flag(WorldFlag::OathOfNull);
            character.modifiers.curse_resistance *= 1.05;
            EncounterOutcome {
                xp: 0,
                narrative: "At a silent obelisk you swear the Oath of Null. The world's \
                            curses will grip you a little less tightly, forever."
                    .to_string(),
            }
        }
        WorldEncounterType::BloodRelic => {
            let relic = RelicType::ALL[rng.gen_range(0..RelicType::ALL.len())];
            relic.apply(character);
            EncounterOutcome {
                xp: 0,
                narrative: format!(
                    "Half-buried in red ice you find the {}. Its power binds to you; \
                     its price is yours to carry.",
                    relic.display_name()
                ),
            }
        }
    }
}

fn resolve_divinity<R: Rng + ?Sized>(character: &mut Character, rng: &mut R) -> EncounterOutcome {
    let deity = DeityType::preferred_for(character.class);
    if character.class == CharacterClass::Oathbreaker {
        // A broken oath precedes this one. The deity may refuse outright;
        // even an offered pact is often spurned.
        if rng.gen::<f64>() < 0.30 {
            return EncounterOutcome {
                xp: 0,
                narrative: format!(
                    "{} regards your broken oath in silence, then turns away.",
                    deity.display_name()
                ),
            };
        }
        if rng.gen::<f64>() >= 0.70 {
            character.add_corruption(2);
            return EncounterOutcome {
                xp: 0,
                narrative: format!(
                    "You spit at the feet of {}. The refusal feeds the rot within.",
                    deity.display_name()
                ),
            };
        }
    }
    deity.apply(character);
    EncounterOutcome {
        xp: 0,
        narrative: format!(
            "A stonebound shrine wakes at your touch. You pledge yourself to {}.",
            deity.display_name()
        ),
    }
}

/// Rolls for a stat interaction during exploration (10-15% chance).
pub fn roll_stat_interaction<R: Rng + ?Sized>(
    character: &Character,
    rng: &mut R,
) -> Option<StatInteractionType> {
    if character.level < INTERACTION_MIN_LEVEL {
        return None;
    }
    let chance = rng.gen_range(0.10..0.15);
    if rng.gen::<f64>() >= chance {
        return None;
    }
    let candidates: Vec<StatInteractionType> = StatInteractionType::ALL
        .iter()
        .copied()
        .filter(|t| {
            character.interaction_triggers.get(t).copied().unwrap_or(0) < INTERACTION_MAX_TRIGGERS
        })
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

/// Resolves a stat interaction against the character's effective stat.
pub fn resolve_stat_interaction(
    character: &mut Character,
    kind: StatInteractionType,
    xp_multiplier: f64,
) -> EncounterOutcome {
    *character.interaction_triggers.entry(kind).or_insert(0) += 1;

    let requirement = kind.requirement_at(character.level);
    let stat = kind.governing_stat();
    let value = match stat {
        StatKind::MaxHp => character.stats.max_hp,
        other => character.effective_stat(other),
    };
    let base_xp = (30.0 + (character.level as f64) * 5.0) * xp_multiplier;
    if value >= requirement {
        let xp = (base_xp * 1.3).floor() as i64;
        EncounterOutcome {
            xp,
            narrative: format!(
                "{}: your {} ({}) overcomes the trial (needed {}).",
                kind.display_name(),
                stat,
                value,
                requirement
            ),
        }
    } else {
        // Failure still teaches, with an XP floor at 90% of base, but the
        // trial takes a bite of health on the way out. It never kills.
        let xp = (base_xp * 0.7).max(base_xp * 0.9).floor() as i64;
        let nick = (character.stats.max_hp / 20).max(1);
        character.stats.current_hp = (character.stats.current_hp - nick).max(1);
        EncounterOutcome {
            xp,
            narrative: format!(
                "{}: your {} ({}) falls short of {}. You withdraw bruised, wiser for it.",
                kind.display_name(),
                stat,
                value,
                requirement
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::character::Character;

    fn hero(class: CharacterClass, level: u32) -> Character {
        let mut c = Character::new("g", "u", "Hero", class);
        c.level = level;
        c
    }

    #[test]
    fn encounters_gated_by_level() {
        let c = hero(CharacterClass::Warrior, 4);
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            assert!(roll_world_encounter(&c, &mut rng).is_none());
        }
    }

    #[test]
    fn deity_pact_trades_effectiveness() {
        let mut c = hero(CharacterClass::Mage, 10);
        DeityType::Nereth.apply(&mut c);
        assert!(c.modifiers.intelligence_eff > 1.0);
        assert!(c.modifiers.agility_eff < 1.0);
        assert!(c.has_permanent_choice());
    }

    #[test]
    fn blood_forged_blade_costs_hp() {
        let mut c = hero(CharacterClass::Knight, 10);
        let before = c.stats.max_hp;
        RelicType::BloodForgedBlade.apply(&mut c);
        assert!(c.stats.max_hp < before);
        assert!(c.modifiers.boss_damage > 1.0);
    }

    #[test]
    fn interaction_requirement_scales_with_level() {
        let kind = StatInteractionType::AncientLibrary;
        assert_eq!(kind.requirement_at(10), 18 + 15);
        assert_eq!(kind.governing_stat(), StatKind::Intelligence);
    }

    #[test]
    fn interaction_success_and_failure_xp() {
        let mut c = hero(CharacterClass::Warrior, 10);
        c.stats.strength = 100;
        let win = resolve_stat_interaction(&mut c, StatInteractionType::FrostboundBoulder, 1.0);
        assert_eq!(win.xp, ((30.0 + 50.0) * 1.3) as i64);
        c.stats.strength = 1;
        let hp_before = c.stats.current_hp;
        let lose = resolve_stat_interaction(&mut c, StatInteractionType::FrozenGate, 1.0);
        // Failure pays out no less than 90% of the base award.
        assert_eq!(lose.xp, ((30.0 + 50.0) * 0.9) as i64);
        assert!(lose.xp < win.xp);
        assert!(c.stats.current_hp < hp_before);
    }

    #[test]
    fn interaction_failure_never_kills() {
        let mut c = hero(CharacterClass::Warrior, 10);
        c.stats.strength = 1;
        c.stats.current_hp = 1;
        resolve_stat_interaction(&mut c, StatInteractionType::FrostboundBoulder, 1.0);
        assert_eq!(c.stats.current_hp, 1);
    }

    #[test]
    fn lifetime_trigger_cap_exhausts_pool() {
        let mut c = hero(CharacterClass::Warrior, 20);
        for t in StatInteractionType::ALL {
            c.interaction_triggers.insert(t, INTERACTION_MAX_TRIGGERS);
        }
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            assert!(roll_stat_interaction(&c, &mut rng).is_none());
        }
    }
}
