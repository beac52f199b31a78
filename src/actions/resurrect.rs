//! Resurrection: bring a dead character back at half health, then wait
//! out a recovery period before acting again.

use rand::RngCore;

use super::{ActionContext, ActionKind, ActionResolver};
use crate::curse::WorldCurse;
use crate::errors::{GameError, Result};
use crate::model::character::LifeState;
use crate::model::class::CharacterClass;
use crate::model::outcome::ActionOutcome;

const RECOVERY_HOURS: i64 = 24;
const FADING_HOPE_RECOVERY_HOURS: i64 = 36;

pub struct ResurrectResolver;

impl ActionResolver for ResurrectResolver {
    fn kind(&self) -> ActionKind {
        ActionKind::Resurrect
    }

    fn requires_charge(&self) -> bool {
        false
    }

    fn resolve(
        &self,
        ctx: &mut ActionContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<ActionOutcome> {
        let now = ctx.now;
        match ctx.character.life {
            LifeState::Dead { .. } => {
                let mut hours = if ctx.has_curse(WorldCurse::FadingHope) {
                    FADING_HOPE_RECOVERY_HOURS
                } else {
                    RECOVERY_HOURS
                };
                if ctx.character.class == CharacterClass::Priest {
                    hours /= 2;
                }
                ctx.character.resurrect(now, hours);
                Ok(ActionOutcome::success(format!(
                    "{} claws back from the dark at half strength, and must recover for {} hours.",
                    ctx.character.name, hours
                )))
            }
            LifeState::Recovering { until } => {
                if ctx.character.tick_recovery(now) {
                    Ok(ActionOutcome::success(format!(
                        "{} shakes off the last of the chill and stands ready.",
                        ctx.character.name
                    )))
                } else {
                    Err(GameError::Recovering {
                        minutes_left: (until - now).num_minutes().max(1),
                    })
                }
            }
            LifeState::Alive => Err(GameError::ActionNotAllowed(
                "you are already among the living".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraBoard;
    use crate::config::GuildConfig;
    use crate::data::GameData;
    use crate::model::character::Character;
    use chrono::{Duration, Utc};

    fn resurrect(
        character: &mut Character,
        curses: &[WorldCurse],
        now: chrono::DateTime<Utc>,
    ) -> Result<ActionOutcome> {
        let data = GameData::embedded().unwrap();
        let config = GuildConfig::for_guild("g");
        let auras = AuraBoard::new();
        let mut ctx = ActionContext {
            guild_id: "g",
            config: &config,
            curses,
            auras: &auras,
            data: &data,
            now,
            character,
            partner: None,
            donation_eligible: false,
        };
        let mut rng = rand::thread_rng();
        ResurrectResolver.resolve(&mut ctx, &mut rng)
    }

    #[test]
    fn dead_characters_revive_at_half_health_and_recover() {
        let now = Utc::now();
        let mut c = Character::new("g", "u", "Lazarus", CharacterClass::Warrior);
        c.die(now);
        resurrect(&mut c, &[], now).unwrap();
        assert_eq!(c.stats.current_hp, c.stats.max_hp / 2);
        assert!(matches!(c.life, LifeState::Recovering { .. }));
        // Still waiting inside the window.
        let err = resurrect(&mut c, &[], now + Duration::hours(1)).unwrap_err();
        assert!(matches!(err, GameError::Recovering { .. }));
        // Done after the full day.
        resurrect(&mut c, &[], now + Duration::hours(25)).unwrap();
        assert!(c.is_alive());
    }

    #[test]
    fn fading_hope_stretches_recovery() {
        let now = Utc::now();
        let mut c = Character::new("g", "u", "Lazarus", CharacterClass::Warrior);
        c.die(now);
        resurrect(&mut c, &[WorldCurse::FadingHope], now).unwrap();
        match c.life {
            LifeState::Recovering { until } => {
                assert_eq!(until, now + Duration::hours(36));
            }
            _ => panic!("expected recovery"),
        }
    }

    #[test]
    fn priests_recover_in_half_the_time() {
        let now = Utc::now();
        let mut c = Character::new("g", "u", "Vesper", CharacterClass::Priest);
        c.die(now);
        resurrect(&mut c, &[], now).unwrap();
        match c.life {
            LifeState::Recovering { until } => {
                assert_eq!(until, now + Duration::hours(12));
            }
            _ => panic!("expected recovery"),
        }
    }

    #[test]
    fn living_characters_cannot_resurrect() {
        let now = Utc::now();
        let mut c = Character::new("g", "u", "Hale", CharacterClass::Rogue);
        assert!(resurrect(&mut c, &[], now).is_err());
    }
}
