use serde::{Deserialize, Serialize};

use super::class::StatKind;

/// Maximum crafted bonus per stat. The HP rune counts each +5 as one unit.
pub const CRAFTED_BONUS_CAP: i32 = 5;

/// A character's attribute block. Current HP travels with it so that
/// healing and damage stay in one place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    pub max_hp: i32,
    pub current_hp: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub luck: i32,
}

impl Stats {
    pub fn new(max_hp: i32, strength: i32, agility: i32, intelligence: i32, luck: i32) -> Self {
        Self {
            max_hp,
            current_hp: max_hp,
            strength,
            agility,
            intelligence,
            luck,
        }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Strength => self.strength,
            StatKind::Agility => self.agility,
            StatKind::Intelligence => self.intelligence,
            StatKind::Luck => self.luck,
            StatKind::MaxHp => self.max_hp,
        }
    }

    /// Adds to a stat. MaxHp additions heal by the same amount.
    pub fn add(&mut self, kind: StatKind, amount: i32) {
        match kind {
            StatKind::Strength => self.strength += amount,
            StatKind::Agility => self.agility += amount,
            StatKind::Intelligence => self.intelligence += amount,
            StatKind::Luck => self.luck += amount,
            StatKind::MaxHp => {
                self.max_hp += amount;
                self.current_hp = (self.current_hp + amount).min(self.max_hp);
            }
        }
    }

    /// Per-level growth: +5 max HP, +1 to every stat, full heal.
    pub fn apply_level_up(&mut self) {
        self.max_hp += 5;
        self.strength += 1;
        self.agility += 1;
        self.intelligence += 1;
        self.luck += 1;
        self.current_hp = self.max_hp;
    }

    pub fn heal_full(&mut self) {
        self.current_hp = self.max_hp;
    }

    /// Applies damage and reports whether it was lethal. HP never goes
    /// below zero.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.current_hp = (self.current_hp - amount.max(0)).max(0);
        self.current_hp == 0
    }

    pub fn heal(&mut self, amount: i32) {
        self.current_hp = (self.current_hp + amount.max(0)).min(self.max_hp);
    }

    pub fn is_below_half(&self) -> bool {
        self.current_hp * 2 < self.max_hp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_at_zero() {
        let mut s = Stats::new(50, 10, 10, 10, 10);
        assert!(!s.take_damage(30));
        assert_eq!(s.current_hp, 20);
        assert!(s.take_damage(100));
        assert_eq!(s.current_hp, 0);
    }

    #[test]
    fn level_up_grows_and_heals() {
        let mut s = Stats::new(100, 10, 10, 10, 10);
        s.take_damage(60);
        s.apply_level_up();
        assert_eq!(s.max_hp, 105);
        assert_eq!(s.current_hp, 105);
        assert_eq!(s.strength, 11);
    }

    #[test]
    fn max_hp_addition_heals_in_step() {
        let mut s = Stats::new(100, 10, 10, 10, 10);
        s.take_damage(10);
        s.add(StatKind::MaxHp, 5);
        assert_eq!(s.max_hp, 105);
        assert_eq!(s.current_hp, 95);
    }
}
