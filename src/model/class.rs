use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::stats::Stats;

/// The five character attributes that classes and events key off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Strength,
    Agility,
    Intelligence,
    Luck,
    MaxHp,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatKind::Strength => "STR",
            StatKind::Agility => "AGI",
            StatKind::Intelligence => "INT",
            StatKind::Luck => "LUCK",
            StatKind::MaxHp => "HP",
        };
        write!(f, "{}", label)
    }
}

/// Playable character classes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Warrior,
    Knight,
    Mage,
    Rogue,
    Necromancer,
    Priest,
    /// Alternate branch; accrues corruption from acting under curses and
    /// from spurned deities.
    Oathbreaker,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 7] = [
        CharacterClass::Warrior,
        CharacterClass::Knight,
        CharacterClass::Mage,
        CharacterClass::Rogue,
        CharacterClass::Necromancer,
        CharacterClass::Priest,
        CharacterClass::Oathbreaker,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            CharacterClass::Warrior => "Warrior",
            CharacterClass::Knight => "Knight",
            CharacterClass::Mage => "Mage",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Necromancer => "Necromancer",
            CharacterClass::Priest => "Priest",
            CharacterClass::Oathbreaker => "Oathbreaker",
        }
    }

    /// Starting stat block for a level-1 character of this class.
    pub fn base_stats(&self) -> Stats {
        match self {
            CharacterClass::Warrior => Stats::new(110, 17, 8, 5, 7),
            CharacterClass::Knight => Stats::new(135, 13, 6, 6, 5),
            CharacterClass::Mage => Stats::new(70, 5, 7, 20, 5),
            CharacterClass::Rogue => Stats::new(85, 8, 16, 7, 12),
            CharacterClass::Necromancer => Stats::new(75, 6, 10, 15, 10),
            CharacterClass::Priest => Stats::new(90, 5, 6, 15, 10),
            CharacterClass::Oathbreaker => Stats::new(100, 14, 9, 9, 8),
        }
    }

    /// The stat that drives this class's boss damage and duel power.
    pub fn primary_stat(&self) -> StatKind {
        match self {
            CharacterClass::Warrior
            | CharacterClass::Knight
            | CharacterClass::Oathbreaker => StatKind::Strength,
            CharacterClass::Mage | CharacterClass::Priest | CharacterClass::Necromancer => {
                StatKind::Intelligence
            }
            CharacterClass::Rogue => StatKind::Agility,
        }
    }

    /// Secondary stat used for duel power.
    pub fn secondary_stat(&self) -> StatKind {
        match self {
            CharacterClass::Warrior
            | CharacterClass::Necromancer
            | CharacterClass::Oathbreaker => StatKind::Luck,
            CharacterClass::Knight | CharacterClass::Mage | CharacterClass::Priest => {
                StatKind::Agility
            }
            CharacterClass::Rogue => StatKind::Strength,
        }
    }

    /// Battle power from effective stats: primary doubled plus secondary.
    pub fn battle_power(&self, stats: &Stats) -> i32 {
        stats.get(self.primary_stat()) * 2 + stats.get(self.secondary_stat())
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for CharacterClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warrior" => Ok(CharacterClass::Warrior),
            "knight" => Ok(CharacterClass::Knight),
            "mage" => Ok(CharacterClass::Mage),
            "rogue" => Ok(CharacterClass::Rogue),
            "necromancer" => Ok(CharacterClass::Necromancer),
            "priest" => Ok(CharacterClass::Priest),
            "oathbreaker" => Ok(CharacterClass::Oathbreaker),
            other => Err(format!("unknown class: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_stats_match_class_table() {
        let w = CharacterClass::Warrior.base_stats();
        assert_eq!(w.max_hp, 110);
        assert_eq!(w.strength, 17);
        let k = CharacterClass::Knight.base_stats();
        assert_eq!(k.max_hp, 135);
        let m = CharacterClass::Mage.base_stats();
        assert_eq!(m.intelligence, 20);
    }

    #[test]
    fn battle_power_uses_primary_doubled() {
        let rogue = CharacterClass::Rogue;
        let stats = rogue.base_stats();
        assert_eq!(rogue.battle_power(&stats), 16 * 2 + 8);
    }

    #[test]
    fn class_parses_case_insensitive() {
        assert_eq!(
            "OathBreaker".parse::<CharacterClass>().unwrap(),
            CharacterClass::Oathbreaker
        );
        assert!("bard".parse::<CharacterClass>().is_err());
    }
}
