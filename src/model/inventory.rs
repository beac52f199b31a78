use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Common crafting materials dropped by exploration and bosses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EssenceType {
    EmberShard,
    MindCrystal,
    VitalAsh,
    FrostSliver,
    StormDust,
}

impl EssenceType {
    pub const ALL: [EssenceType; 5] = [
        EssenceType::EmberShard,
        EssenceType::MindCrystal,
        EssenceType::VitalAsh,
        EssenceType::FrostSliver,
        EssenceType::StormDust,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EssenceType::EmberShard => "Ember Shard",
            EssenceType::MindCrystal => "Mind Crystal",
            EssenceType::VitalAsh => "Vital Ash",
            EssenceType::FrostSliver => "Frost Sliver",
            EssenceType::StormDust => "Storm Dust",
        }
    }
}

impl fmt::Display for EssenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Rare crafting binders, mostly from boss rewards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CatalystType {
    AncientVial,
    RunicBinding,
    MonsterCore,
    EtherLens,
    ObsidianSeal,
}

impl CatalystType {
    pub const ALL: [CatalystType; 5] = [
        CatalystType::AncientVial,
        CatalystType::RunicBinding,
        CatalystType::MonsterCore,
        CatalystType::EtherLens,
        CatalystType::ObsidianSeal,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CatalystType::AncientVial => "Ancient Vial",
            CatalystType::RunicBinding => "Runic Binding",
            CatalystType::MonsterCore => "Monster Core",
            CatalystType::EtherLens => "Ether Lens",
            CatalystType::ObsidianSeal => "Obsidian Seal",
        }
    }
}

impl fmt::Display for CatalystType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Permanent stat infusions produced by the crafting recipes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CraftedItemType {
    EmberInfusion,
    GaleEtching,
    MindSigil,
    CharmOfFortune,
    VitalRune,
}

impl CraftedItemType {
    pub fn display_name(&self) -> &'static str {
        match self {
            CraftedItemType::EmberInfusion => "Ember Infusion",
            CraftedItemType::GaleEtching => "Gale Etching",
            CraftedItemType::MindSigil => "Mind Sigil",
            CraftedItemType::CharmOfFortune => "Charm of Fortune",
            CraftedItemType::VitalRune => "Vital Rune",
        }
    }
}

impl fmt::Display for CraftedItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Material pouch carried by every character.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inventory {
    #[serde(default)]
    essences: HashMap<EssenceType, u32>,
    #[serde(default)]
    catalysts: HashMap<CatalystType, u32>,
    #[serde(default)]
    crafted: HashMap<CraftedItemType, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_essence(&mut self, kind: EssenceType, count: u32) {
        *self.essences.entry(kind).or_insert(0) += count;
    }

    pub fn add_catalyst(&mut self, kind: CatalystType, count: u32) {
        *self.catalysts.entry(kind).or_insert(0) += count;
    }

    pub fn essence_count(&self, kind: EssenceType) -> u32 {
        self.essences.get(&kind).copied().unwrap_or(0)
    }

    pub fn catalyst_count(&self, kind: CatalystType) -> u32 {
        self.catalysts.get(&kind).copied().unwrap_or(0)
    }

    pub fn crafted_count(&self, kind: CraftedItemType) -> u32 {
        self.crafted.get(&kind).copied().unwrap_or(0)
    }

    /// Removes essences if enough are held. Returns false without touching
    /// the pouch otherwise.
    pub fn remove_essences(&mut self, kind: EssenceType, count: u32) -> bool {
        match self.essences.get_mut(&kind) {
            Some(held) if *held >= count => {
                *held -= count;
                if *held == 0 {
                    self.essences.remove(&kind);
                }
                true
            }
            _ => false,
        }
    }

    /// Removes catalysts if enough are held. Returns false without touching
    /// the pouch otherwise.
    pub fn remove_catalysts(&mut self, kind: CatalystType, count: u32) -> bool {
        match self.catalysts.get_mut(&kind) {
            Some(held) if *held >= count => {
                *held -= count;
                if *held == 0 {
                    self.catalysts.remove(&kind);
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.essences.is_empty() && self.catalysts.is_empty() && self.crafted.is_empty()
    }

    pub fn record_crafted(&mut self, kind: CraftedItemType) {
        *self.crafted.entry(kind).or_insert(0) += 1;
    }

    pub fn essences(&self) -> impl Iterator<Item = (&EssenceType, &u32)> {
        self.essences.iter()
    }

    pub fn catalysts(&self) -> impl Iterator<Item = (&CatalystType, &u32)> {
        self.catalysts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_fails_without_enough_held() {
        let mut inv = Inventory::new();
        inv.add_essence(EssenceType::EmberShard, 3);
        assert!(!inv.remove_essences(EssenceType::EmberShard, 5));
        assert_eq!(inv.essence_count(EssenceType::EmberShard), 3);
        assert!(inv.remove_essences(EssenceType::EmberShard, 3));
        assert_eq!(inv.essence_count(EssenceType::EmberShard), 0);
    }

    #[test]
    fn catalyst_counts_round_trip() {
        let mut inv = Inventory::new();
        inv.add_catalyst(CatalystType::MonsterCore, 2);
        assert!(inv.remove_catalysts(CatalystType::MonsterCore, 1));
        assert_eq!(inv.catalyst_count(CatalystType::MonsterCore), 1);
    }
}
