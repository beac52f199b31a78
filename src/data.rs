//! Seed data tables: the boss catalog, class-vs-enemy effectiveness tuning,
//! and narrative line pools. Embedded defaults ship in the binary; operators
//! can override any table by dropping a TOML file of the same name into the
//! data directory.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{GameError, Result};
use crate::model::boss::BossType;
use crate::model::class::CharacterClass;
use crate::model::enemy::EnemyType;

const EMBEDDED_BOSSES: &str = include_str!("../data/bosses.toml");
const EMBEDDED_EFFECTIVENESS: &str = include_str!("../data/effectiveness.toml");
const EMBEDDED_NARRATIVES: &str = include_str!("../data/narratives.toml");

// ===== Boss catalog =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalBossEntry {
    pub tier: u32,
    pub name: String,
    pub boss_type: BossType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperBossEntry {
    pub name: String,
    pub boss_type: BossType,
}

/// One class-affinity entry: the listed classes hit the listed boss types
/// for the catalog's `affinity_bonus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffinityRule {
    pub classes: Vec<CharacterClass>,
    pub strong: Vec<BossType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossCatalog {
    #[serde(default = "default_affinity_bonus")]
    pub affinity_bonus: f64,
    pub normal: Vec<NormalBossEntry>,
    pub super_bosses: Vec<SuperBossEntry>,
    #[serde(default)]
    pub affinity: Vec<AffinityRule>,
}

fn default_affinity_bonus() -> f64 {
    1.2
}

impl BossCatalog {
    fn validate(&self) -> Result<()> {
        if self.normal.is_empty() || self.super_bosses.is_empty() {
            return Err(GameError::InvalidSeedData {
                table: "bosses",
                reason: "normal and super_bosses must both be non-empty".to_string(),
            });
        }
        if self.normal.iter().any(|b| b.tier == 0) {
            return Err(GameError::InvalidSeedData {
                table: "bosses",
                reason: "boss tiers start at 1".to_string(),
            });
        }
        if self.affinity_bonus < 1.0 {
            return Err(GameError::InvalidSeedData {
                table: "bosses",
                reason: "affinity_bonus must be at least 1.0".to_string(),
            });
        }
        Ok(())
    }

    /// Damage multiplier when a class strikes a boss type it counters.
    pub fn class_bonus(&self, class: CharacterClass, boss_type: BossType) -> f64 {
        for rule in &self.affinity {
            if rule.classes.contains(&class) && rule.strong.contains(&boss_type) {
                return self.affinity_bonus;
            }
        }
        1.0
    }

    /// Picks a normal boss for a tier. Tiers above the highest listed reuse
    /// the top group.
    pub fn pick_normal<R: Rng + ?Sized>(&self, tier: u32, rng: &mut R) -> &NormalBossEntry {
        let max_tier = self.normal.iter().map(|b| b.tier).max().unwrap_or(1);
        let effective = tier.min(max_tier).max(1);
        let pool: Vec<&NormalBossEntry> =
            self.normal.iter().filter(|b| b.tier == effective).collect();
        // validate() guarantees a non-empty catalog; the filter can only be
        // empty for a gap tier, in which case fall back to the whole list.
        if pool.is_empty() {
            &self.normal[rng.gen_range(0..self.normal.len())]
        } else {
            pool[rng.gen_range(0..pool.len())]
        }
    }

    pub fn pick_super<R: Rng + ?Sized>(&self, rng: &mut R) -> &SuperBossEntry {
        &self.super_bosses[rng.gen_range(0..self.super_bosses.len())]
    }
}

// ===== Effectiveness table =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivenessRule {
    pub classes: Vec<CharacterClass>,
    pub strong: Vec<EnemyType>,
    pub weak: Vec<EnemyType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivenessTable {
    pub strong_multiplier: f64,
    pub weak_multiplier: f64,
    pub rules: Vec<EffectivenessRule>,
}

impl EffectivenessTable {
    fn validate(&self) -> Result<()> {
        if self.strong_multiplier <= 1.0 || !(0.0..1.0).contains(&self.weak_multiplier) {
            return Err(GameError::InvalidSeedData {
                table: "effectiveness",
                reason: "strong_multiplier must exceed 1.0 and weak_multiplier sit below it"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Multiplier for one class attacking one enemy archetype.
    pub fn lookup(&self, class: CharacterClass, enemy: EnemyType) -> f64 {
        for rule in &self.rules {
            if rule.classes.contains(&class) {
                if rule.strong.contains(&enemy) {
                    return self.strong_multiplier;
                }
                if rule.weak.contains(&enemy) {
                    return self.weak_multiplier;
                }
                return 1.0;
            }
        }
        1.0
    }
}

// ===== Narrative pools =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativePools {
    pub explore: Vec<String>,
    pub train: Vec<String>,
    pub enemy_names: Vec<String>,
    pub duel_win: Vec<String>,
    pub rest: Vec<String>,
}

impl NarrativePools {
    fn validate(&self) -> Result<()> {
        let pools: [(&str, &Vec<String>); 5] = [
            ("explore", &self.explore),
            ("train", &self.train),
            ("enemy_names", &self.enemy_names),
            ("duel_win", &self.duel_win),
            ("rest", &self.rest),
        ];
        for (name, pool) in pools {
            if pool.is_empty() {
                return Err(GameError::InvalidSeedData {
                    table: "narratives",
                    reason: format!("pool '{}' is empty", name),
                });
            }
        }
        Ok(())
    }

    pub fn pick<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> &'a str {
        &pool[rng.gen_range(0..pool.len())]
    }
}

// ===== Bundle =====

/// All seed tables, validated and ready for the engine.
#[derive(Debug, Clone)]
pub struct GameData {
    pub bosses: BossCatalog,
    pub effectiveness: EffectivenessTable,
    pub narratives: NarrativePools,
}

impl GameData {
    /// Parses the tables compiled into the binary.
    pub fn embedded() -> Result<Self> {
        let data = Self {
            bosses: parse_table("bosses", EMBEDDED_BOSSES)?,
            effectiveness: parse_table("effectiveness", EMBEDDED_EFFECTIVENESS)?,
            narratives: parse_table("narratives", EMBEDDED_NARRATIVES)?,
        };
        data.validate()?;
        Ok(data)
    }

    /// Embedded defaults with per-table overrides from `dir` when present.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut data = Self::embedded()?;
        if let Some(raw) = read_override(dir, "bosses.toml")? {
            data.bosses = parse_table("bosses", &raw)?;
            info!("boss catalog overridden from {}", dir.display());
        }
        if let Some(raw) = read_override(dir, "effectiveness.toml")? {
            data.effectiveness = parse_table("effectiveness", &raw)?;
            info!("effectiveness table overridden from {}", dir.display());
        }
        if let Some(raw) = read_override(dir, "narratives.toml")? {
            data.narratives = parse_table("narratives", &raw)?;
            info!("narrative pools overridden from {}", dir.display());
        }
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<()> {
        self.bosses.validate()?;
        self.effectiveness.validate()?;
        self.narratives.validate()?;
        Ok(())
    }
}

fn parse_table<T: serde::de::DeserializeOwned>(name: &'static str, raw: &str) -> Result<T> {
    toml::from_str(raw).map_err(|e| GameError::InvalidSeedData {
        table: name,
        reason: e.to_string(),
    })
}

fn read_override(dir: &Path, file: &str) -> Result<Option<String>> {
    let path = dir.join(file);
    if path.is_file() {
        debug!("loading seed override {}", path.display());
        Ok(Some(std::fs::read_to_string(path)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_tables_parse_and_validate() {
        let data = GameData::embedded().unwrap();
        assert!(!data.bosses.normal.is_empty());
        assert_eq!(data.bosses.super_bosses.len(), 7);
    }

    #[test]
    fn effectiveness_matches_counter_matrix() {
        let data = GameData::embedded().unwrap();
        let t = &data.effectiveness;
        assert_eq!(t.lookup(CharacterClass::Warrior, EnemyType::Physical), 1.3);
        assert_eq!(t.lookup(CharacterClass::Warrior, EnemyType::Magical), 0.85);
        assert_eq!(t.lookup(CharacterClass::Warrior, EnemyType::Undead), 1.0);
        assert_eq!(t.lookup(CharacterClass::Rogue, EnemyType::Beast), 1.3);
        assert_eq!(t.lookup(CharacterClass::Necromancer, EnemyType::Undead), 1.3);
    }

    #[test]
    fn class_affinity_matches_counter_table() {
        let data = GameData::embedded().unwrap();
        let b = &data.bosses;
        assert_eq!(b.class_bonus(CharacterClass::Warrior, BossType::Beast), 1.2);
        assert_eq!(b.class_bonus(CharacterClass::Knight, BossType::Undead), 1.2);
        assert_eq!(b.class_bonus(CharacterClass::Priest, BossType::Demon), 1.2);
        assert_eq!(
            b.class_bonus(CharacterClass::Oathbreaker, BossType::Demon),
            1.2
        );
        assert_eq!(b.class_bonus(CharacterClass::Mage, BossType::Giant), 1.0);
    }

    #[test]
    fn tier_picks_clamp_to_catalog_range() {
        let data = GameData::embedded().unwrap();
        let mut rng = rand::thread_rng();
        let boss = data.bosses.pick_normal(99, &mut rng);
        assert_eq!(boss.tier, 10);
        let low = data.bosses.pick_normal(0, &mut rng);
        assert_eq!(low.tier, 1);
    }
}
