//! Crafting: turning essences and catalysts into permanent stat infusions.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::character::Character;
use crate::model::class::StatKind;
use crate::model::inventory::{CatalystType, CraftedItemType, EssenceType};

/// The five infusion recipes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Recipe {
    EmberInfusion,
    GaleEtching,
    MindSigil,
    CharmOfFortune,
    VitalRune,
}

impl Recipe {
    pub const ALL: [Recipe; 5] = [
        Recipe::EmberInfusion,
        Recipe::GaleEtching,
        Recipe::MindSigil,
        Recipe::CharmOfFortune,
        Recipe::VitalRune,
    ];

    pub fn essence_cost(&self) -> (EssenceType, u32) {
        match self {
            Recipe::EmberInfusion => (EssenceType::EmberShard, 5),
            Recipe::GaleEtching => (EssenceType::FrostSliver, 5),
            Recipe::MindSigil => (EssenceType::MindCrystal, 4),
            Recipe::CharmOfFortune => (EssenceType::StormDust, 4),
            Recipe::VitalRune => (EssenceType::VitalAsh, 3),
        }
    }

    pub fn catalyst_cost(&self) -> CatalystType {
        match self {
            Recipe::EmberInfusion => CatalystType::AncientVial,
            Recipe::GaleEtching => CatalystType::EtherLens,
            Recipe::MindSigil => CatalystType::RunicBinding,
            Recipe::CharmOfFortune => CatalystType::ObsidianSeal,
            Recipe::VitalRune => CatalystType::MonsterCore,
        }
    }

    /// The stat the infusion improves and by how much per craft.
    pub fn bonus(&self) -> (StatKind, i32) {
        match self {
            Recipe::EmberInfusion => (StatKind::Strength, 1),
            Recipe::GaleEtching => (StatKind::Agility, 1),
            Recipe::MindSigil => (StatKind::Intelligence, 1),
            Recipe::CharmOfFortune => (StatKind::Luck, 1),
            Recipe::VitalRune => (StatKind::MaxHp, 5),
        }
    }

    pub fn product(&self) -> CraftedItemType {
        match self {
            Recipe::EmberInfusion => CraftedItemType::EmberInfusion,
            Recipe::GaleEtching => CraftedItemType::GaleEtching,
            Recipe::MindSigil => CraftedItemType::MindSigil,
            Recipe::CharmOfFortune => CraftedItemType::CharmOfFortune,
            Recipe::VitalRune => CraftedItemType::VitalRune,
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.product().display_name()
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Recipe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "ember_infusion" => Ok(Recipe::EmberInfusion),
            "gale_etching" => Ok(Recipe::GaleEtching),
            "mind_sigil" => Ok(Recipe::MindSigil),
            "charm_of_fortune" => Ok(Recipe::CharmOfFortune),
            "vital_rune" => Ok(Recipe::VitalRune),
            other => Err(format!("unknown recipe: {}", other)),
        }
    }
}

/// Three-way craft result. Nothing is consumed unless the craft succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CraftOutcome {
    Success {
        recipe: Recipe,
        stat: StatKind,
        gained: i32,
        /// Intellect sometimes spares the catalyst (INT/2 % chance).
        catalyst_preserved: bool,
    },
    MissingMaterials {
        recipe: Recipe,
        essences_missing: u32,
        catalyst_missing: bool,
    },
    BonusCapReached {
        recipe: Recipe,
        stat: StatKind,
    },
}

/// Attempts a craft. Material checks, consumption, and the stat bump happen
/// against one exclusively-held character, so the result is all-or-nothing.
pub fn craft<R: Rng + ?Sized>(
    character: &mut Character,
    recipe: Recipe,
    rng: &mut R,
) -> CraftOutcome {
    let (essence, needed) = recipe.essence_cost();
    let catalyst = recipe.catalyst_cost();
    let (stat, delta) = recipe.bonus();

    let held = character.inventory.essence_count(essence);
    let essences_missing = needed.saturating_sub(held);
    let catalyst_missing = character.inventory.catalyst_count(catalyst) == 0;
    if essences_missing > 0 || catalyst_missing {
        return CraftOutcome::MissingMaterials {
            recipe,
            essences_missing,
            catalyst_missing,
        };
    }

    if character.crafted_bonus_units(stat) >= crate::model::stats::CRAFTED_BONUS_CAP {
        return CraftOutcome::BonusCapReached { recipe, stat };
    }

    // All checks passed; consume, then apply.
    if !character.inventory.remove_essences(essence, needed) {
        return CraftOutcome::MissingMaterials {
            recipe,
            essences_missing: needed,
            catalyst_missing: false,
        };
    }
    let preserve_chance = (character.effective_stat(StatKind::Intelligence) as f64) * 0.5 / 100.0;
    let catalyst_preserved = rng.gen::<f64>() < preserve_chance;
    if !catalyst_preserved {
        // Held counts were checked above under the same exclusive access.
        let removed = character.inventory.remove_catalysts(catalyst, 1);
        debug_assert!(removed);
    }

    character.apply_crafted_bonus(stat, delta);
    character.inventory.record_crafted(recipe.product());
    debug!(
        "{} crafted {} (+{} {}), catalyst preserved: {}",
        character.name,
        recipe.display_name(),
        delta,
        stat,
        catalyst_preserved
    );

    CraftOutcome::Success {
        recipe,
        stat,
        gained: delta,
        catalyst_preserved,
    }
}
