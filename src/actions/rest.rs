//! Rest: trade a charge for a full heal.

use rand::RngCore;

use super::{ActionContext, ActionKind, ActionResolver};
use crate::data::NarrativePools;
use crate::errors::Result;
use crate::model::outcome::ActionOutcome;

pub struct RestResolver;

impl ActionResolver for RestResolver {
    fn kind(&self) -> ActionKind {
        ActionKind::Rest
    }

    fn resolve(
        &self,
        ctx: &mut ActionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<ActionOutcome> {
        let missing = ctx.character.stats.max_hp - ctx.character.stats.current_hp;
        ctx.character.stats.heal_full();
        let mut outcome =
            ActionOutcome::success(NarrativePools::pick(&ctx.data.narratives.rest, rng));
        outcome.hp_restored = missing;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraBoard;
    use crate::config::GuildConfig;
    use crate::data::GameData;
    use crate::model::character::Character;
    use crate::model::class::CharacterClass;
    use chrono::Utc;

    #[test]
    fn rest_heals_to_full_without_xp() {
        let data = GameData::embedded().unwrap();
        let config = GuildConfig::for_guild("g");
        let auras = AuraBoard::new();
        let mut character = Character::new("g", "u", "Sleeper", CharacterClass::Priest);
        character.stats.take_damage(50);
        let mut ctx = ActionContext {
            guild_id: "g",
            config: &config,
            curses: &[],
            auras: &auras,
            data: &data,
            now: Utc::now(),
            character: &mut character,
            partner: None,
            donation_eligible: false,
        };
        let mut rng = rand::thread_rng();
        let outcome = RestResolver.resolve(&mut ctx, &mut rng).unwrap();
        assert_eq!(outcome.xp_gained, 0);
        assert_eq!(outcome.hp_restored, 50);
        assert_eq!(character.stats.current_hp, character.stats.max_hp);
    }
}
