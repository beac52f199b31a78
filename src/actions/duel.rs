//! Duels: charge-free sparring between two characters, rate-limited to
//! three per rolling day for each participant.

use rand::{Rng, RngCore};

use super::{ActionContext, ActionKind, ActionResolver};
use crate::data::NarrativePools;
use crate::errors::{GameError, Result};
use crate::model::character::Character;
use crate::model::class::StatKind;
use crate::model::outcome::ActionOutcome;

pub struct DuelResolver;

impl ActionResolver for DuelResolver {
    fn kind(&self) -> ActionKind {
        ActionKind::Duel
    }

    fn requires_charge(&self) -> bool {
        false
    }

    fn resolve(
        &self,
        ctx: &mut ActionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<ActionOutcome> {
        let now = ctx.now;
        let opponent = ctx
            .partner
            .as_deref_mut()
            .ok_or_else(|| GameError::ActionNotAllowed("duel needs an opponent".to_string()))?;

        if !opponent.is_alive() {
            return Err(GameError::ActionNotAllowed(
                "your opponent is in no state to fight".to_string(),
            ));
        }
        if !opponent.can_duel(now) {
            return Err(GameError::ActionNotAllowed(format!(
                "{} has dueled too often in the last day",
                opponent.name
            )));
        }
        if !ctx.character.can_duel(now) {
            return Err(GameError::ActionNotAllowed(
                "you have dueled too often in the last day".to_string(),
            ));
        }

        let challenger_power = duel_power(ctx.character, rng);
        let opponent_power = duel_power(opponent, rng);

        ctx.character.record_duel(now);
        opponent.record_duel(now);

        let (winner, loser) = if challenger_power >= opponent_power {
            (ctx.character.name.clone(), opponent.name.clone())
        } else {
            (opponent.name.clone(), ctx.character.name.clone())
        };

        let flourish = NarrativePools::pick(&ctx.data.narratives.duel_win, rng);
        let narrative = format!(
            "{} bests {} in a duel ({} to {}). {}",
            winner, loser, challenger_power.max(opponent_power), challenger_power.min(opponent_power), flourish
        );
        let mut outcome = ActionOutcome::success(narrative);
        outcome.success = challenger_power >= opponent_power;
        Ok(outcome)
    }
}

/// Duel power: class primary doubled plus secondary, luck doubled on top,
/// and a swing of fortune either way.
fn duel_power(character: &Character, rng: &mut dyn RngCore) -> i32 {
    let primary = character.effective_stat(character.class.primary_stat());
    let secondary = character.effective_stat(character.class.secondary_stat());
    let luck = character.effective_stat(StatKind::Luck);
    let swing: i32 = rng.gen_range(-10..=10);
    (primary * 2 + secondary + luck * 2 + swing).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraBoard;
    use crate::config::GuildConfig;
    use crate::data::GameData;
    use crate::model::class::CharacterClass;
    use chrono::Utc;

    fn duel(
        challenger: &mut Character,
        opponent: &mut Character,
    ) -> Result<ActionOutcome> {
        let data = GameData::embedded().unwrap();
        let config = GuildConfig::for_guild("g");
        let auras = AuraBoard::new();
        let mut ctx = ActionContext {
            guild_id: "g",
            config: &config,
            curses: &[],
            auras: &auras,
            data: &data,
            now: Utc::now(),
            character: challenger,
            partner: Some(opponent),
            donation_eligible: false,
        };
        let mut rng = rand::thread_rng();
        DuelResolver.resolve(&mut ctx, &mut rng)
    }

    #[test]
    fn duel_records_window_on_both_sides() {
        let mut a = Character::new("g", "a", "Ash", CharacterClass::Rogue);
        let mut b = Character::new("g", "b", "Birch", CharacterClass::Knight);
        duel(&mut a, &mut b).unwrap();
        assert_eq!(a.duel_times.len(), 1);
        assert_eq!(b.duel_times.len(), 1);
    }

    #[test]
    fn fourth_duel_in_a_day_is_rejected() {
        let mut a = Character::new("g", "a", "Ash", CharacterClass::Rogue);
        let mut b = Character::new("g", "b", "Birch", CharacterClass::Knight);
        for _ in 0..3 {
            duel(&mut a, &mut b).unwrap();
        }
        assert!(duel(&mut a, &mut b).is_err());
    }

    #[test]
    fn dead_opponents_cannot_be_challenged() {
        let mut a = Character::new("g", "a", "Ash", CharacterClass::Rogue);
        let mut b = Character::new("g", "b", "Birch", CharacterClass::Knight);
        b.die(Utc::now());
        assert!(duel(&mut a, &mut b).is_err());
    }
}
