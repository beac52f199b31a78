//! Guild boss coordination: spawn rotation, tier progression, attack damage,
//! defeat rewards, and the curses left behind by an undefeated boss.

use chrono::{DateTime, Duration, Utc};
use log::info;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::aura::AuraBoard;
use crate::curse::{CurseBoard, WorldCurse};
use crate::data::GameData;
use crate::model::boss::{Boss, BossKind, BossType};
use crate::model::character::Character;
use crate::model::class::{CharacterClass, StatKind};
use crate::model::inventory::{CatalystType, EssenceType};
use crate::model::outcome::ItemDrop;

/// Normal defeats needed before the next spawn is a super boss.
const NORMALS_PER_SUPER: u32 = 3;
/// Normal-tier advancement: defeats required per current tier.
const NORMAL_TIER_DEFEATS: u32 = 6;
/// Super-tier advancement: defeats required per current tier.
const SUPER_TIER_DEFEATS: u32 = 2;
/// Eclipse of Nilfheim inflates the next boss's HP.
const ECLIPSE_HP_BONUS: f64 = 1.10;
/// Top damage dealer's share of the XP pool is inflated by this factor.
const TOP_DEALER_BONUS: f64 = 1.20;
/// Chance each normal-boss contributor also receives a catalyst.
const NORMAL_CATALYST_CHANCE: f64 = 0.25;

/// Per-guild boss progression. The active boss lives here too; boss fights
/// are short-lived and rebuilt from the catalog, so none of this persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildBossState {
    pub tier: u32,
    pub super_tier: u32,
    pub normal_defeats: u32,
    pub super_defeats: u32,
    pub normals_since_super: u32,
    pub current: Option<Boss>,
}

impl GuildBossState {
    pub fn new() -> Self {
        Self {
            tier: 1,
            super_tier: 1,
            ..Default::default()
        }
    }

    /// Which kind the next spawn will be.
    pub fn next_kind(&self) -> BossKind {
        if self.normals_since_super >= NORMALS_PER_SUPER {
            BossKind::Super
        } else {
            BossKind::Normal
        }
    }

    /// Spawns the next boss from the catalog and lifts spawn-scoped curses.
    /// An active Eclipse of Nilfheim inflates the newcomer's HP.
    pub fn spawn_next(
        &mut self,
        guild_id: &str,
        data: &GameData,
        curses: &mut CurseBoard,
        now: DateTime<Utc>,
        lifetime_hours: i64,
        rng: &mut dyn RngCore,
    ) -> &Boss {
        let hp_bonus = if curses.has(guild_id, WorldCurse::EclipseOfNilfheim) {
            ECLIPSE_HP_BONUS
        } else {
            1.0
        };
        let kind = self.next_kind();
        let mut boss = match kind {
            BossKind::Normal => {
                let entry = data.bosses.pick_normal(self.tier, rng);
                Boss::spawn(&entry.name, entry.boss_type, kind, self.tier, hp_bonus, now)
            }
            BossKind::Super => {
                self.normals_since_super = 0;
                let entry = data.bosses.pick_super(rng);
                Boss::spawn(&entry.name, entry.boss_type, kind, self.super_tier, hp_bonus, now)
            }
        };
        boss.expires_at = now + Duration::hours(lifetime_hours.max(1));
        curses.clear_on_spawn(guild_id);
        info!(
            "guild {}: {} rises (tier {}, {} HP)",
            guild_id, boss.name, boss.tier, boss.max_hp
        );
        &*self.current.insert(boss)
    }

    /// Records a defeat and advances tiers once enough bosses have fallen.
    pub fn record_defeat(&mut self, kind: BossKind) {
        match kind {
            BossKind::Normal => {
                self.normal_defeats += 1;
                self.normals_since_super += 1;
                if self.normal_defeats >= NORMAL_TIER_DEFEATS * self.tier {
                    self.tier += 1;
                    info!("normal boss tier advances to {}", self.tier);
                }
            }
            BossKind::Super => {
                self.super_defeats += 1;
                if self.super_defeats >= SUPER_TIER_DEFEATS * self.super_tier {
                    self.super_tier += 1;
                    info!("super boss tier advances to {}", self.super_tier);
                }
            }
        }
    }

    /// Drops an undefeated boss and leaves a curse behind: minor for a
    /// normal boss, major for a super.
    pub fn despawn_undefeated(
        &mut self,
        guild_id: &str,
        curses: &mut CurseBoard,
        rng: &mut dyn RngCore,
    ) -> Option<WorldCurse> {
        let boss = self.current.take()?;
        let curse = match boss.kind {
            BossKind::Normal => WorldCurse::random_minor(rng),
            BossKind::Super => WorldCurse::random_major(rng),
        };
        curses.apply(guild_id, curse);
        info!(
            "guild {}: {} slips away undefeated, leaving the {}",
            guild_id,
            boss.name,
            curse.display_name()
        );
        Some(curse)
    }
}

// ===== Attacks =====

/// One swing against the boss: base scales with level and the class's
/// primary stat, luck pads it, then affinity, the Song, and any encounter
/// boss-damage modifier multiply in. Swings never land below 50.
pub fn attack_damage(
    character: &Character,
    boss_type: BossType,
    data: &GameData,
    guild_id: &str,
    auras: &AuraBoard,
    rng: &mut dyn RngCore,
) -> i64 {
    let primary = character.effective_stat(character.class.primary_stat()) as i64;
    let luck = character.effective_stat(StatKind::Luck) as i64;
    let base = 100 + character.level as i64 * 50 + primary * 10 + luck * 5;
    let variance = rng.gen_range(0.80..=1.20);
    let mut damage = (base as f64 * variance).max(50.0);
    damage *= data.bosses.class_bonus(character.class, boss_type);
    damage *= auras.song_damage_bonus(guild_id);
    damage *= character.modifiers.boss_damage;
    (damage.round() as i64).max(50)
}

// ===== Defeat rewards =====

/// One contributor's cut of a defeated boss.
#[derive(Debug, Clone)]
pub struct ContributorReward {
    pub user_id: String,
    pub damage: i64,
    pub xp: i64,
    pub drops: Vec<ItemDrop>,
    pub top_dealer: bool,
}

/// Splits the defeat XP pool proportionally to damage dealt, with a bonus
/// for the top dealer, and rolls item rewards per contributor.
pub fn distribute_rewards(boss: &Boss, rng: &mut dyn RngCore) -> Vec<ContributorReward> {
    let grand_total = boss.ledger.grand_total().max(1);
    let pool = match boss.kind {
        BossKind::Normal => 500 + 100 * boss.tier as i64,
        BossKind::Super => 1000 + 200 * boss.tier as i64,
    };
    let top = boss
        .ledger
        .top_contributor()
        .map(|(id, _)| id.clone())
        .unwrap_or_default();

    let mut rewards = Vec::new();
    for (user_id, damage) in boss.ledger.contributors() {
        let share = pool as f64 * (*damage as f64 / grand_total as f64);
        let top_dealer = *user_id == top;
        let xp = if top_dealer {
            (share * TOP_DEALER_BONUS).round() as i64
        } else {
            share.round() as i64
        };
        let mut drops = Vec::new();
        match boss.kind {
            BossKind::Normal => {
                drops.push(ItemDrop::Essence(EssenceType::random(rng)));
                if rng.gen_bool(NORMAL_CATALYST_CHANCE) {
                    drops.push(ItemDrop::Catalyst(CatalystType::random(rng)));
                }
            }
            BossKind::Super => {
                drops.push(ItemDrop::Catalyst(CatalystType::random(rng)));
                let essences = rng.gen_range(1..=3);
                for _ in 0..essences {
                    drops.push(ItemDrop::Essence(EssenceType::random(rng)));
                }
            }
        }
        rewards.push(ContributorReward {
            user_id: user_id.clone(),
            damage: *damage,
            xp: xp.max(1),
            drops,
            top_dealer,
        });
    }
    rewards
}

/// Legendary aura grants after a super boss falls: the top dealer earns the
/// Song of Nilfheim, and a top-dealing Necromancer the Gravebound Presence.
/// Full holder rosters simply mean no new grant.
pub fn grant_super_auras(
    guild_id: &str,
    top_dealer: &str,
    class: CharacterClass,
    auras: &mut AuraBoard,
) {
    use crate::aura::AuraType;
    if auras
        .grant(guild_id, top_dealer, class, AuraType::SongOfNilfheim)
        .is_err()
    {
        let _ = auras.grant(guild_id, top_dealer, class, AuraType::HerosMark);
    }
    if class == CharacterClass::Necromancer {
        let _ = auras.grant(guild_id, top_dealer, class, AuraType::GraveboundPresence);
    }
}
