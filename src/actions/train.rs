//! Training: steady XP and a small random stat gain.

use rand::{Rng, RngCore};

use super::{xp_pipeline, ActionContext, ActionKind, ActionResolver};
use crate::data::NarrativePools;
use crate::errors::Result;
use crate::model::class::StatKind;
use crate::model::outcome::ActionOutcome;

const TRAINABLE: [StatKind; 4] = [
    StatKind::Strength,
    StatKind::Agility,
    StatKind::Intelligence,
    StatKind::Luck,
];

pub struct TrainResolver;

impl ActionResolver for TrainResolver {
    fn kind(&self) -> ActionKind {
        ActionKind::Train
    }

    fn resolve(
        &self,
        ctx: &mut ActionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<ActionOutcome> {
        let curse_factor = ctx.curse_factor(rng);
        let level = ctx.character.level;

        let variance: i64 = rng.gen_range(-7..=7);
        let base = ((25 + level as i64 * 4 + variance).max(1) as f64) * ctx.config.xp_multiplier;
        let xp = xp_pipeline(base, ctx, curse_factor);

        let stat = TRAINABLE[rng.gen_range(0..TRAINABLE.len())];
        let gain: i32 = rng.gen_range(1..=3);
        ctx.character.stats.add(stat, gain);

        let levels = ctx.character.gain_xp(xp);
        let narrative = format!(
            "{} Your {} improves by {}.",
            NarrativePools::pick(&ctx.data.narratives.train, rng),
            stat,
            gain
        );
        Ok(ActionOutcome::success(narrative).with_xp(xp, levels))
    }
}
