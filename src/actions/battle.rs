//! Solo battle: a generated enemy, an opposed power roll, XP on either
//! result, and real damage that can kill.

use rand::{Rng, RngCore};

use super::{xp_pipeline, ActionContext, ActionKind, ActionResolver};
use crate::curse::WorldCurse;
use crate::data::NarrativePools;
use crate::errors::Result;
use crate::model::character::Character;
use crate::model::class::{CharacterClass, StatKind};
use crate::model::enemy::{Enemy, EnemyType};
use crate::model::outcome::ActionOutcome;

/// Chance the enemy is a pack (hits 15% harder).
const PACK_CHANCE: f64 = 0.08;
/// Chance the enemy is an elite (stronger, eases its own weaknesses).
const ELITE_CHANCE: f64 = 0.10;
const ELITE_POWER_MOD: f64 = 1.5;
const ELITE_RESISTANCE_MOD: f64 = 1.3;

/// Oathbreaker corruption stacks counted toward the damage bonus.
const CORRUPTION_CAP: u32 = 20;

pub struct BattleResolver;

impl ActionResolver for BattleResolver {
    fn kind(&self) -> ActionKind {
        ActionKind::Battle
    }

    fn resolve(
        &self,
        ctx: &mut ActionContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<ActionOutcome> {
        let curse_factor = ctx.curse_factor(rng);
        let enemy = generate_enemy(ctx, rng);
        let is_elite = rng.gen::<f64>() < ELITE_CHANCE;

        let mut enemy_power = enemy.power() as f64;
        if is_elite {
            enemy_power *= ELITE_POWER_MOD;
        }

        let player_power = player_power(ctx, &enemy, is_elite, curse_factor);

        // Opposed rolls. Luck rides on top of the player's roll.
        let luck = ctx.character.effective_stat(StatKind::Luck);
        let mut player_roll =
            rng.gen_range(0..player_power.max(1)) as f64 + (luck as f64) * 2.0;
        let enemy_roll = rng.gen_range(0..(enemy_power as i32).max(1)) as f64;

        // Critical strikes scale the roll: AGI/2 % chance, 1.5x (Rogue 2.0x).
        let crit_chance =
            (ctx.character.effective_stat(StatKind::Agility) as f64) * 0.5 / 100.0;
        let crit = rng.gen::<f64>() < crit_chance;
        if crit {
            let mult = if ctx.character.class == CharacterClass::Rogue {
                2.0
            } else {
                1.5
            };
            player_roll *= mult;
        }

        let victory = player_roll >= enemy_roll;

        let xp = battle_xp(ctx, &enemy, victory, curse_factor, rng);
        let damage = damage_taken(ctx, &enemy, enemy_power, victory, is_elite, curse_factor, rng);

        let mut narrative = battle_narrative(ctx.character, &enemy, victory, crit, is_elite);

        // Victories close some wounds; Price of Survival halves that.
        let mut hp_restored = 0;
        if victory {
            let mut heal = ctx.character.stats.max_hp / 10;
            if ctx.has_curse(WorldCurse::PriceOfSurvival) {
                heal = ((heal as f64) * 0.5 * curse_factor
                    + (heal as f64) * (1.0 - curse_factor))
                    .floor() as i32;
            }
            let before = ctx.character.stats.current_hp;
            ctx.character.stats.heal(heal);
            hp_restored = ctx.character.stats.current_hp - before;
        }

        let died = ctx.character.stats.take_damage(damage);
        if died {
            ctx.character.die(ctx.now);
            narrative.push_str(" The wounds are too deep. You fall in the snow.");
        }

        if victory {
            ctx.character.battles_won += 1;
        } else {
            ctx.character.battles_lost += 1;
            if is_elite {
                // Elite defeats sting into the next refresh.
                if rng.gen::<f64>() < 0.15 {
                    ctx.character.lose_charge_on_next_refresh = true;
                    narrative.push_str(" Something vital was spent; your next charge comes slower.");
                }
                if ctx.character.class == CharacterClass::Oathbreaker {
                    ctx.character.add_corruption(1);
                }
            }
        }

        // Acting while the world is cursed feeds a broken oath.
        if ctx.character.class == CharacterClass::Oathbreaker && !ctx.curses.is_empty() {
            ctx.character.add_corruption(1);
        }

        let levels = if died { 0 } else { ctx.character.gain_xp(xp) };

        let mut outcome = if victory {
            ActionOutcome::success(narrative)
        } else {
            ActionOutcome::failure(narrative)
        };
        outcome.xp_gained = if died { 0 } else { xp };
        outcome.levels_gained = levels;
        outcome.damage_taken = damage;
        outcome.hp_restored = hp_restored;
        outcome.died = died;
        Ok(outcome)
    }
}

fn generate_enemy(ctx: &ActionContext<'_>, rng: &mut dyn RngCore) -> Enemy {
    let level = ctx.character.level as i64 + rng.gen_range(-2..=2);
    let mut enemy_type = EnemyType::random(rng);
    // The dead walk thicker under March of the Dead.
    if ctx.has_curse(WorldCurse::MarchOfTheDead) && rng.gen::<f64>() < 0.35 {
        enemy_type = EnemyType::Undead;
    }
    Enemy {
        name: NarrativePools::pick(&ctx.data.narratives.enemy_names, rng).to_string(),
        enemy_type,
        level: level.max(1) as u32,
        is_pack: rng.gen::<f64>() < PACK_CHANCE,
    }
}

fn player_power(
    ctx: &ActionContext<'_>,
    enemy: &Enemy,
    is_elite: bool,
    curse_factor: f64,
) -> i32 {
    let character = &ctx.character;
    let effective = effective_stats(character);
    let mut power = character.class.battle_power(&effective) as f64;

    // Curse of Weakness saps the physical classes.
    if ctx.curses.contains(&WorldCurse::CurseOfWeakness)
        && matches!(
            character.class,
            CharacterClass::Warrior | CharacterClass::Knight
        )
    {
        power *= 1.0 - 0.10 * curse_factor;
    }

    let mut effectiveness = ctx
        .data
        .effectiveness
        .lookup(character.class, enemy.enemy_type);
    // Elites shore up the weaknesses attackers would exploit.
    if is_elite && effectiveness < 1.0 {
        effectiveness = 1.0 - (1.0 - effectiveness) / ELITE_RESISTANCE_MOD;
    }
    if ctx.curses.contains(&WorldCurse::ShatteredReality) {
        if effectiveness > 1.0 {
            effectiveness = 1.0 + (effectiveness - 1.0) * (0.25 / 0.30);
        } else if effectiveness < 1.0 {
            effectiveness = 1.0 - (1.0 - effectiveness) * (0.20 / 0.15);
        }
    }
    power *= effectiveness;

    // Corruption answers the call: +1% per stack, capped.
    if character.class == CharacterClass::Oathbreaker {
        let stacks = character.corruption.min(CORRUPTION_CAP);
        power *= 1.0 + (stacks as f64) * 0.01;
    }

    (power.floor() as i32).max(1)
}

fn effective_stats(character: &Character) -> crate::model::stats::Stats {
    let mut stats = character.stats.clone();
    stats.strength = character.effective_stat(StatKind::Strength);
    stats.agility = character.effective_stat(StatKind::Agility);
    stats.intelligence = character.effective_stat(StatKind::Intelligence);
    stats.luck = character.effective_stat(StatKind::Luck);
    stats
}

fn battle_xp(
    ctx: &ActionContext<'_>,
    enemy: &Enemy,
    victory: bool,
    curse_factor: f64,
    rng: &mut dyn RngCore,
) -> i64 {
    let base_raw = if victory {
        50 + enemy.level as i64 * 10
    } else {
        20 + enemy.level as i64 * 4
    };
    let base = (base_raw as f64) * ctx.config.xp_multiplier;
    let mut xp = xp_pipeline(base, ctx, curse_factor) as f64;

    if victory {
        if ctx.has_curse(WorldCurse::CurseOfWaningResolve) {
            xp *= 1.0 - 0.05 * curse_factor;
        }
        // A cornered Warrior fights best.
        if ctx.character.class == CharacterClass::Warrior && ctx.character.stats.is_below_half() {
            xp *= 1.10;
        }
        // Necromancer's Decay: sometimes the kill feeds twice.
        if ctx.character.class == CharacterClass::Necromancer && rng.gen::<f64>() < 0.10 {
            xp *= 2.0;
        }
    }
    xp.floor() as i64
}

#[allow(clippy::too_many_arguments)]
fn damage_taken(
    ctx: &ActionContext<'_>,
    enemy: &Enemy,
    enemy_power: f64,
    victory: bool,
    _is_elite: bool,
    curse_factor: f64,
    rng: &mut dyn RngCore,
) -> i32 {
    let mut base = if victory {
        enemy_power / 4.0 + (enemy.level as f64) * 2.0
    } else {
        enemy_power / 2.0 + (enemy.level as f64) * 4.0
    };

    if ctx.has_curse(WorldCurse::EclipseOfNilfheim) {
        base *= 1.0 + 0.10 * curse_factor;
    }
    if !victory {
        if ctx.has_curse(WorldCurse::CurseOfBleedingWounds) {
            base *= 1.0 + 0.10 * curse_factor;
        }
        if ctx.has_curse(WorldCurse::MarchOfTheDead) {
            base *= 1.0 + 0.15 * curse_factor;
        }
    }

    // +/-25% variance, widened to +/-35% under World Aflame.
    let spread = if ctx.has_curse(WorldCurse::WorldAflame) {
        0.35
    } else {
        0.25
    };
    let factor = rng.gen_range((1.0 - spread)..=(1.0 + spread));
    let mut damage = base * factor;
    if enemy.is_pack {
        damage *= 1.15;
    }

    // Agility turns blows aside, up to a cap.
    let mut cap = 0.30 + ctx.character.modifiers.agi_defense_cap_bonus;
    if ctx.has_curse(WorldCurse::CurseOfSluggishSteps) {
        let cursed_cap = 0.25 + ctx.character.modifiers.agi_defense_cap_bonus;
        cap = cap.min(cap - (cap - cursed_cap) * curse_factor);
    }
    let reduction = ((ctx.character.effective_stat(StatKind::Agility) as f64) * 0.01).min(cap);
    damage *= 1.0 - reduction;

    (damage.floor() as i32).max(1)
}

fn battle_narrative(
    character: &Character,
    enemy: &Enemy,
    victory: bool,
    crit: bool,
    is_elite: bool,
) -> String {
    let descriptor = match (is_elite, enemy.is_pack) {
        (true, _) => "an elite ",
        (false, true) => "a pack of ",
        (false, false) => "a ",
    };
    let mut text = if victory {
        format!(
            "{} brings down {}{} (Lv {}, {}).",
            character.name, descriptor, enemy.name, enemy.level, enemy.enemy_type
        )
    } else {
        format!(
            "{} is driven back by {}{} (Lv {}, {}).",
            character.name, descriptor, enemy.name, enemy.level, enemy.enemy_type
        )
    };
    if crit {
        text.push_str(" A perfect opening, ruthlessly taken.");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraBoard;
    use crate::config::GuildConfig;
    use crate::data::GameData;
    use chrono::Utc;

    fn run_battle(character: &mut Character, curses: &[WorldCurse]) -> ActionOutcome {
        let data = GameData::embedded().unwrap();
        let config = GuildConfig::for_guild("g");
        let auras = AuraBoard::new();
        let mut ctx = ActionContext {
            guild_id: "g",
            config: &config,
            curses,
            auras: &auras,
            data: &data,
            now: Utc::now(),
            character,
            partner: None,
            donation_eligible: false,
        };
        let mut rng = rand::thread_rng();
        BattleResolver.resolve(&mut ctx, &mut rng).unwrap()
    }

    #[test]
    fn battle_always_deals_some_damage() {
        let mut c = Character::new("g", "u", "Blade", CharacterClass::Warrior);
        let outcome = run_battle(&mut c, &[]);
        assert!(outcome.damage_taken >= 1);
        assert_eq!(c.battles_won + c.battles_lost, 1);
    }

    #[test]
    fn death_sets_life_state_and_withholds_xp() {
        let mut c = Character::new("g", "u", "Fragile", CharacterClass::Mage);
        c.stats.current_hp = 1;
        // With 1 HP any nonzero damage kills unless the victory heal outpaces
        // it; run until a death occurs.
        for _ in 0..200 {
            if run_battle(&mut c, &[]).died {
                assert!(!c.is_alive());
                return;
            }
            c.life = crate::model::character::LifeState::Alive;
            c.stats.current_hp = 1;
        }
        panic!("no death in 200 battles at 1 HP");
    }

    #[test]
    fn oathbreaker_accrues_corruption_under_curses() {
        let mut c = Character::new("g", "u", "Forsworn", CharacterClass::Oathbreaker);
        let before = c.corruption;
        run_battle(&mut c, &[WorldCurse::CurseOfFrailty]);
        assert!(c.corruption > before);
    }
}
