use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;


/// Hours a boss stays up before despawning undefeated.
pub const BOSS_LIFETIME_HOURS: i64 = 24;

/// HP per tier for normal and super bosses.
pub const NORMAL_BOSS_HP_PER_TIER: i64 = 10_000;
pub const SUPER_BOSS_HP_PER_TIER: i64 = 50_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BossKind {
    Normal,
    Super,
}

/// Boss archetypes. Classes deal bonus damage to the types they counter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BossType {
    Beast,
    Giant,
    Undead,
    Spirit,
    Elemental,
    Humanoid,
    Eldritch,
    Construct,
    Dragon,
    Demon,
}

impl BossType {
    pub fn display_name(&self) -> &'static str {
        match self {
            BossType::Beast => "Beast",
            BossType::Giant => "Giant",
            BossType::Undead => "Undead",
            BossType::Spirit => "Spirit",
            BossType::Elemental => "Elemental",
            BossType::Humanoid => "Humanoid",
            BossType::Eldritch => "Eldritch",
            BossType::Construct => "Construct",
            BossType::Dragon => "Dragon",
            BossType::Demon => "Demon",
        }
    }

}

/// Per-contributor damage totals for the active boss.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DamageLedger {
    totals: HashMap<String, i64>,
}

impl DamageLedger {
    pub fn record(&mut self, user_id: &str, damage: i64) {
        *self.totals.entry(user_id.to_string()).or_insert(0) += damage.max(0);
    }

    pub fn total(&self, user_id: &str) -> i64 {
        self.totals.get(user_id).copied().unwrap_or(0)
    }

    pub fn contributors(&self) -> impl Iterator<Item = (&String, &i64)> {
        self.totals.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn grand_total(&self) -> i64 {
        self.totals.values().sum()
    }

    /// Highest-damage contributor, if any.
    pub fn top_contributor(&self) -> Option<(&String, i64)> {
        self.totals
            .iter()
            .max_by_key(|(_, dmg)| **dmg)
            .map(|(id, dmg)| (id, *dmg))
    }

    /// Contributors ranked by damage dealt, highest first, capped at
    /// `limit`. Equal totals tie-break on user id for a stable order.
    pub fn top_dealers(&self, limit: usize) -> Vec<(String, i64)> {
        let mut ranked: Vec<(String, i64)> = self
            .totals
            .iter()
            .map(|(id, dmg)| (id.clone(), *dmg))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }
}

/// A shared boss instance for one guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: Uuid,
    pub name: String,
    pub boss_type: BossType,
    pub kind: BossKind,
    pub tier: u32,
    pub max_hp: i64,
    pub current_hp: i64,
    pub spawned_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub ledger: DamageLedger,
}

impl Boss {
    pub fn spawn(
        name: &str,
        boss_type: BossType,
        kind: BossKind,
        tier: u32,
        hp_bonus: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let per_tier = match kind {
            BossKind::Normal => NORMAL_BOSS_HP_PER_TIER,
            BossKind::Super => SUPER_BOSS_HP_PER_TIER,
        };
        let max_hp = ((per_tier * tier.max(1) as i64) as f64 * hp_bonus).round() as i64;
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            boss_type,
            kind,
            tier: tier.max(1),
            max_hp,
            current_hp: max_hp,
            spawned_at: now,
            expires_at: now + Duration::hours(BOSS_LIFETIME_HOURS),
            ledger: DamageLedger::default(),
        }
    }

    /// Applies damage from one attacker. HP clamps at zero; returns true
    /// when this hit defeated the boss.
    pub fn take_damage(&mut self, user_id: &str, damage: i64) -> bool {
        if self.current_hp == 0 {
            return false;
        }
        let dealt = damage.max(0).min(self.current_hp);
        self.ledger.record(user_id, dealt);
        self.current_hp -= dealt;
        self.current_hp == 0
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at && !self.is_defeated()
    }
}
