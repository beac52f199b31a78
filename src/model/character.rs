use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::class::{CharacterClass, StatKind};
use super::inventory::Inventory;
use super::stats::{Stats, CRAFTED_BONUS_CAP};
use crate::encounter::{DeityType, RelicType, StatInteractionType, WorldEncounterType, WorldFlag};

pub const CHARACTER_SCHEMA_VERSION: u8 = 2;

/// Hard ceiling on banked action charges.
pub const MAX_CHARGES: u32 = 3;

/// Duels allowed inside a rolling 24 hour window.
pub const DUEL_WINDOW_LIMIT: usize = 3;

/// Whether a character can currently act.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Alive,
    Dead { since: DateTime<Utc> },
    Recovering { until: DateTime<Utc> },
}

impl Default for LifeState {
    fn default() -> Self {
        LifeState::Alive
    }
}

/// Multiplicative modifiers accumulated from irrevocable encounter choices.
/// All default to 1.0 (no effect).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Modifiers {
    #[serde(default = "unity")]
    pub strength_eff: f64,
    #[serde(default = "unity")]
    pub agility_eff: f64,
    #[serde(default = "unity")]
    pub intelligence_eff: f64,
    #[serde(default = "unity")]
    pub luck_eff: f64,
    /// Above 1.0 grants resistance (curse effect is divided by this).
    #[serde(default = "unity")]
    pub curse_resistance: f64,
    #[serde(default = "unity")]
    pub boss_damage: f64,
    #[serde(default = "unity")]
    pub xp_rate: f64,
    #[serde(default = "unity")]
    pub max_hp: f64,
    /// Additive bump to the 30% agility defense cap (Frozen Crown).
    #[serde(default)]
    pub agi_defense_cap_bonus: f64,
}

fn unity() -> f64 {
    1.0
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            strength_eff: 1.0,
            agility_eff: 1.0,
            intelligence_eff: 1.0,
            luck_eff: 1.0,
            curse_resistance: 1.0,
            boss_damage: 1.0,
            xp_rate: 1.0,
            max_hp: 1.0,
            agi_defense_cap_bonus: 0.0,
        }
    }
}

/// A player character. One per user, shared across guild bosses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
    pub user_id: String,
    pub guild_id: String,
    pub name: String,
    pub class: CharacterClass,
    /// Registration time; breaks leaderboard ties in favor of the older
    /// character.
    pub created_at: DateTime<Utc>,
    pub level: u32,
    pub xp: i64,
    pub stats: Stats,
    #[serde(default)]
    pub life: LifeState,

    // Charge economy. `charges` is the banked count as of `last_refresh`;
    // accrual is computed lazily from elapsed whole refresh periods.
    pub charges: u32,
    pub last_refresh: DateTime<Utc>,
    #[serde(default)]
    pub lose_charge_on_next_refresh: bool,

    #[serde(default)]
    pub corruption: u32,
    #[serde(default)]
    pub deity: Option<DeityType>,
    #[serde(default)]
    pub relic: Option<RelicType>,
    #[serde(default)]
    pub world_flags: Vec<WorldFlag>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub crafted_bonuses: HashMap<StatKind, i32>,
    #[serde(default)]
    pub inventory: Inventory,

    #[serde(default)]
    pub encounter_triggers: HashMap<WorldEncounterType, u8>,
    #[serde(default)]
    pub interaction_triggers: HashMap<StatInteractionType, u8>,

    #[serde(default)]
    pub duel_times: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub last_donation_received: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,

    #[serde(default)]
    pub normal_boss_kills: u32,
    #[serde(default)]
    pub super_boss_kills: u32,
    #[serde(default)]
    pub battles_won: u32,
    #[serde(default)]
    pub battles_lost: u32,
}

fn default_schema_version() -> u8 {
    CHARACTER_SCHEMA_VERSION
}

impl Character {
    pub fn new(guild_id: &str, user_id: &str, name: &str, class: CharacterClass) -> Self {
        let now = Utc::now();
        Self {
            schema_version: CHARACTER_SCHEMA_VERSION,
            user_id: user_id.to_string(),
            guild_id: guild_id.to_string(),
            name: name.to_string(),
            class,
            created_at: now,
            level: 1,
            xp: 0,
            stats: class.base_stats(),
            life: LifeState::Alive,
            charges: MAX_CHARGES,
            last_refresh: now,
            lose_charge_on_next_refresh: false,
            corruption: 0,
            deity: None,
            relic: None,
            world_flags: Vec::new(),
            modifiers: Modifiers::default(),
            crafted_bonuses: HashMap::new(),
            inventory: Inventory::new(),
            encounter_triggers: HashMap::new(),
            interaction_triggers: HashMap::new(),
            duel_times: Vec::new(),
            last_donation_received: None,
            last_active: Some(now),
            normal_boss_kills: 0,
            super_boss_kills: 0,
            battles_won: 0,
            battles_lost: 0,
        }
    }

    // ===== Progression =====

    /// XP required to advance from the given level.
    pub fn xp_for_next_level(level: u32) -> i64 {
        (100.0 * (level as f64).powf(1.5)).floor() as i64
    }

    /// Grants XP (after the character's XP-rate modifier) and applies any
    /// level-ups. Returns the number of levels gained.
    pub fn gain_xp(&mut self, amount: i64) -> u32 {
        let scaled = ((amount as f64) * self.modifiers.xp_rate).floor() as i64;
        self.xp += scaled.max(0);
        let mut gained = 0;
        while self.xp >= Self::xp_for_next_level(self.level) {
            self.xp -= Self::xp_for_next_level(self.level);
            self.level += 1;
            self.stats.apply_level_up();
            gained += 1;
        }
        gained
    }

    // ===== Charges =====

    /// Folds elapsed whole refresh periods into the banked count, consuming
    /// the elite-defeat penalty flag if set. Idempotent for a fixed `now`.
    pub fn refresh_charges(&mut self, now: DateTime<Utc>, refresh_hours: i64) {
        let refresh_hours = refresh_hours.max(1);
        let elapsed = now.signed_duration_since(self.last_refresh);
        let periods = elapsed.num_hours() / refresh_hours;
        if periods > 0 {
            let mut accrued = self.charges.saturating_add(periods.min(u32::MAX as i64) as u32);
            if self.lose_charge_on_next_refresh {
                accrued = accrued.saturating_sub(1);
                self.lose_charge_on_next_refresh = false;
            }
            self.charges = accrued.min(MAX_CHARGES);
            self.last_refresh += Duration::hours(periods * refresh_hours);
        }
        // A full bank does not keep banking time.
        if self.charges >= MAX_CHARGES {
            self.last_refresh = now;
        }
    }

    /// Current charge count without mutating refresh bookkeeping.
    pub fn available_charges(&self, now: DateTime<Utc>, refresh_hours: i64) -> u32 {
        let refresh_hours = refresh_hours.max(1);
        let periods = now
            .signed_duration_since(self.last_refresh)
            .num_hours()
            / refresh_hours;
        let mut accrued = self
            .charges
            .saturating_add(periods.max(0).min(u32::MAX as i64) as u32);
        if self.lose_charge_on_next_refresh && periods > 0 {
            accrued = accrued.saturating_sub(1);
        }
        accrued.min(MAX_CHARGES)
    }

    /// Refreshes and spends one charge in a single step. On failure returns
    /// the minutes until the next charge accrues.
    pub fn try_spend_charge(&mut self, now: DateTime<Utc>, refresh_hours: i64) -> Result<(), i64> {
        self.refresh_charges(now, refresh_hours);
        if self.charges > 0 {
            self.charges -= 1;
            Ok(())
        } else {
            let next = self.last_refresh + Duration::hours(refresh_hours.max(1));
            Err((next - now).num_minutes().max(0))
        }
    }

    /// Moves a charge in from a donation, respecting the cap.
    pub fn receive_charge(&mut self, now: DateTime<Utc>) -> bool {
        if self.charges >= MAX_CHARGES {
            return false;
        }
        self.charges += 1;
        self.last_donation_received = Some(now);
        true
    }

    // ===== Life state =====

    pub fn is_alive(&self) -> bool {
        matches!(self.life, LifeState::Alive)
    }

    pub fn die(&mut self, now: DateTime<Utc>) {
        self.stats.current_hp = 0;
        self.life = LifeState::Dead { since: now };
    }

    /// Revives at half HP and starts the recovery window.
    pub fn resurrect(&mut self, now: DateTime<Utc>, recovery_hours: i64) {
        self.stats.current_hp = (self.stats.max_hp / 2).max(1);
        self.life = LifeState::Recovering {
            until: now + Duration::hours(recovery_hours),
        };
    }

    /// Completes an elapsed recovery window. Returns true on transition.
    pub fn tick_recovery(&mut self, now: DateTime<Utc>) -> bool {
        if let LifeState::Recovering { until } = self.life {
            if now >= until {
                self.life = LifeState::Alive;
                return true;
            }
        }
        false
    }

    // ===== Duel window =====

    /// Prunes expired timestamps and reports whether another duel fits in
    /// the rolling window.
    pub fn can_duel(&mut self, now: DateTime<Utc>) -> bool {
        let cutoff = now - Duration::hours(24);
        self.duel_times.retain(|t| *t > cutoff);
        self.duel_times.len() < DUEL_WINDOW_LIMIT
    }

    pub fn record_duel(&mut self, now: DateTime<Utc>) {
        self.duel_times.push(now);
    }

    // ===== Crafted bonuses =====

    /// Units of crafted bonus already applied to a stat.
    pub fn crafted_bonus_units(&self, stat: StatKind) -> i32 {
        self.crafted_bonuses.get(&stat).copied().unwrap_or(0)
    }

    /// Records one more crafted unit if under the cap and applies the stat
    /// delta. Returns false at the cap, leaving stats untouched.
    pub fn apply_crafted_bonus(&mut self, stat: StatKind, delta: i32) -> bool {
        let units = self.crafted_bonuses.entry(stat).or_insert(0);
        if *units >= CRAFTED_BONUS_CAP {
            return false;
        }
        *units += 1;
        self.stats.add(stat, delta);
        true
    }

    // ===== Encounter bookkeeping =====

    pub fn has_flag(&self, flag: WorldFlag) -> bool {
        self.world_flags.contains(&flag)
    }

    pub fn set_flag(&mut self, flag: WorldFlag) {
        if !self.world_flags.contains(&flag) {
            self.world_flags.push(flag);
        }
    }

    /// True once any irrevocable choice has been made.
    pub fn has_permanent_choice(&self) -> bool {
        self.deity.is_some() || self.relic.is_some() || !self.world_flags.is_empty()
    }

    pub fn add_corruption(&mut self, amount: u32) {
        self.corruption += amount;
    }

    /// Effective stat value after encounter modifiers.
    pub fn effective_stat(&self, kind: StatKind) -> i32 {
        let base = self.stats.get(kind) as f64;
        let scaled = match kind {
            StatKind::Strength => base * self.modifiers.strength_eff,
            StatKind::Agility => base * self.modifiers.agility_eff,
            StatKind::Intelligence => base * self.modifiers.intelligence_eff,
            StatKind::Luck => base * self.modifiers.luck_eff,
            StatKind::MaxHp => base * self.modifiers.max_hp,
        };
        scaled.floor() as i32
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> Character {
        Character::new("guild", "user", "Hero", CharacterClass::Warrior)
    }

    #[test]
    fn xp_threshold_follows_power_curve() {
        assert_eq!(Character::xp_for_next_level(1), 100);
        assert_eq!(Character::xp_for_next_level(4), 800);
        assert_eq!(Character::xp_for_next_level(9), 2700);
    }

    #[test]
    fn gain_xp_levels_up_and_heals() {
        let mut c = character();
        c.stats.take_damage(40);
        let gained = c.gain_xp(100);
        assert_eq!(gained, 1);
        assert_eq!(c.level, 2);
        assert_eq!(c.stats.current_hp, c.stats.max_hp);
        assert_eq!(c.stats.max_hp, 115);
    }

    #[test]
    fn gain_xp_can_chain_levels() {
        let mut c = character();
        // 100 + 282 covers levels 1 and 2 with room to spare.
        let gained = c.gain_xp(500);
        assert_eq!(gained, 2);
        assert_eq!(c.level, 3);
    }

    #[test]
    fn charges_cap_at_three() {
        let mut c = character();
        c.charges = 0;
        c.last_refresh = Utc::now() - Duration::hours(12 * 10);
        c.refresh_charges(Utc::now(), 12);
        assert_eq!(c.charges, MAX_CHARGES);
    }

    #[test]
    fn spend_fails_when_empty_with_eta() {
        let mut c = character();
        c.charges = 0;
        c.last_refresh = Utc::now();
        let err = c.try_spend_charge(Utc::now(), 12).unwrap_err();
        assert!(err > 0 && err <= 12 * 60);
    }

    #[test]
    fn penalty_flag_eats_one_accrued_charge() {
        let mut c = character();
        c.charges = 0;
        c.lose_charge_on_next_refresh = true;
        c.last_refresh = Utc::now() - Duration::hours(24);
        c.refresh_charges(Utc::now(), 12);
        assert_eq!(c.charges, 1);
        assert!(!c.lose_charge_on_next_refresh);
    }

    #[test]
    fn duel_window_prunes_and_limits() {
        let mut c = character();
        let now = Utc::now();
        c.duel_times = vec![now - Duration::hours(30), now - Duration::hours(2), now];
        assert!(c.can_duel(now));
        assert_eq!(c.duel_times.len(), 2);
        c.record_duel(now);
        assert!(!c.can_duel(now));
    }

    #[test]
    fn crafted_bonus_stops_at_cap() {
        let mut c = character();
        for _ in 0..CRAFTED_BONUS_CAP {
            assert!(c.apply_crafted_bonus(StatKind::Strength, 1));
        }
        assert!(!c.apply_crafted_bonus(StatKind::Strength, 1));
        assert_eq!(c.stats.strength, 17 + CRAFTED_BONUS_CAP);
    }

    #[test]
    fn resurrect_enters_recovery_at_half_hp() {
        let mut c = character();
        let now = Utc::now();
        c.die(now);
        assert!(!c.is_alive());
        c.resurrect(now, 24);
        assert_eq!(c.stats.current_hp, c.stats.max_hp / 2);
        assert!(matches!(c.life, LifeState::Recovering { .. }));
        assert!(!c.tick_recovery(now + Duration::hours(23)));
        assert!(c.tick_recovery(now + Duration::hours(25)));
        assert!(c.is_alive());
    }
}
