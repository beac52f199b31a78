//! Charge donation: a high-level player gives one action charge to a
//! struggling guildmate.

use chrono::Duration;
use rand::RngCore;

use super::{ActionContext, ActionKind, ActionResolver};
use crate::errors::{GameError, Result};
use crate::model::outcome::ActionOutcome;

/// Donors must have reached this level.
const DONOR_MIN_LEVEL: u32 = 10;
/// Recipients must have acted within this window.
const RECIPIENT_ACTIVE_HOURS: i64 = 24;
/// One donation received per cycle.
const DONATION_CYCLE_HOURS: i64 = 24;

pub struct DonateResolver;

impl ActionResolver for DonateResolver {
    fn kind(&self) -> ActionKind {
        ActionKind::Donate
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
        let refresh_hours = ctx.config.charge_refresh_hours;
        let recipient = ctx
            .partner
            .as_deref_mut()
            .ok_or_else(|| GameError::ActionNotAllowed("donate needs a recipient".to_string()))?;

        if ctx.character.level < DONOR_MIN_LEVEL {
            return Err(GameError::ActionNotAllowed(format!(
                "donations open at level {}",
                DONOR_MIN_LEVEL
            )));
        }
        if !recipient.is_alive() {
            return Err(GameError::ActionNotAllowed(
                "the recipient is beyond the help of charges".to_string(),
            ));
        }
        let active = recipient
            .last_active
            .map(|t| now - t <= Duration::hours(RECIPIENT_ACTIVE_HOURS))
            .unwrap_or(false);
        if !active {
            return Err(GameError::ActionNotAllowed(
                "the recipient has not been active in the last day".to_string(),
            ));
        }
        if let Some(received) = recipient.last_donation_received {
            if now - received < Duration::hours(DONATION_CYCLE_HOURS) {
                return Err(GameError::ActionNotAllowed(
                    "the recipient already received a donation this cycle".to_string(),
                ));
            }
        }
        if !ctx.donation_eligible {
            return Err(GameError::ActionNotAllowed(
                "donations go to those shortest on charges".to_string(),
            ));
        }

        // Move one charge, atomically under the engine's exclusive access.
        ctx.character
            .try_spend_charge(now, refresh_hours)
            .map_err(|minutes_until_refresh| GameError::NoCharges {
                minutes_until_refresh,
            })?;
        if !recipient.receive_charge(now) {
            // Recipient at cap; refund the donor.
            ctx.character.charges = (ctx.character.charges + 1).min(crate::model::character::MAX_CHARGES);
            return Err(GameError::ActionNotAllowed(
                "the recipient's charges are already full".to_string(),
            ));
        }

        Ok(ActionOutcome::success(format!(
            "{} passes a spark of resolve to {}. ({} charges remain.)",
            ctx.character.name, recipient.name, ctx.character.charges
        )))
    }
}
