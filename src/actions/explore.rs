//! Exploration: XP, essence drops, and the chance of stat interactions and
//! world encounters.

use rand::{Rng, RngCore};

use super::{xp_pipeline, ActionContext, ActionKind, ActionResolver};
use crate::curse::WorldCurse;
use crate::data::NarrativePools;
use crate::encounter;
use crate::errors::Result;
use crate::model::class::StatKind;
use crate::model::inventory::EssenceType;
use crate::model::outcome::{ActionOutcome, ItemDrop};

/// Base drop chance before the agility bonus.
const BASE_DROP_CHANCE: f64 = 0.125;
/// Agility adds 0.5% per point, capped at +15%.
const AGI_DROP_CAP: f64 = 0.15;

pub struct ExploreResolver;

impl ActionResolver for ExploreResolver {
    fn kind(&self) -> ActionKind {
        ActionKind::Explore
    }

    fn resolve(
        &self,
        ctx: &mut ActionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<ActionOutcome> {
        let curse_factor = ctx.curse_factor(rng);
        let level = ctx.character.level;

        let variance: i64 = rng.gen_range(-10..=10);
        let base = ((30 + level as i64 * 5 + variance).max(1) as f64) * ctx.config.xp_multiplier;
        let mut xp = xp_pipeline(base, ctx, curse_factor);

        let mut narrative =
            NarrativePools::pick(&ctx.data.narratives.explore, rng).to_string();
        let mut outcome = ActionOutcome::success("");

        // Essence drops
        let agi_bonus =
            ((ctx.character.effective_stat(StatKind::Agility) as f64) * 0.005).min(AGI_DROP_CAP);
        let mut drop_chance = BASE_DROP_CHANCE + agi_bonus;
        if ctx.has_curse(WorldCurse::CurseOfIllFortune) {
            drop_chance -= 0.05 * curse_factor;
        }
        if rng.gen::<f64>() < drop_chance.max(0.0) {
            let count = rng.gen_range(1..=2);
            for _ in 0..count {
                let essence = EssenceType::random(rng);
                ctx.character.inventory.add_essence(essence, 1);
                outcome.drops.push(ItemDrop::Essence(essence));
                narrative.push_str(&format!(" You pocket a {}.", essence));
            }
        }

        // Stat interaction events
        if let Some(kind) = encounter::roll_stat_interaction(ctx.character, rng) {
            let resolved = encounter::resolve_stat_interaction(
                ctx.character,
                kind,
                ctx.config.xp_multiplier,
            );
            xp += resolved.xp;
            narrative.push_str(&format!("\n{}", resolved.narrative));
        }

        // World encounters
        if let Some(kind) = encounter::roll_world_encounter(ctx.character, rng) {
            let resolved = encounter::resolve_world_encounter(ctx.character, kind, rng);
            xp += resolved.xp;
            narrative.push_str(&format!("\n{}", resolved.narrative));
        }

        let levels = ctx.character.gain_xp(xp);
        outcome.xp_gained = xp;
        outcome.levels_gained = levels;
        outcome.narrative = narrative;
        Ok(outcome)
    }
}
