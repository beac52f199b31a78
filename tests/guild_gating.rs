//! Integration tests for per-guild configuration gates:
//! - the game is opt-in; nothing works until a guild enables it
//! - the role requirement blocks unroled users unless configured open
//! - out-of-range settings clamp to defaults on validation

mod common;

use std::sync::Arc;

use nilfheim::config::GuildConfig;
use nilfheim::data::GameData;
use nilfheim::engine::GameEngine;
use nilfheim::errors::GameError;
use nilfheim::model::class::CharacterClass;
use nilfheim::storage::{CharacterRepository, MemoryRepository};

#[test]
fn everything_is_disabled_until_opt_in() {
    let repo = Arc::new(MemoryRepository::new());
    let engine = GameEngine::new(repo, GameData::embedded().expect("seed data"));

    assert!(matches!(
        engine.register("g", "u", "Hero", CharacterClass::Mage, true),
        Err(GameError::GameDisabled(_))
    ));
    assert!(matches!(
        engine.spawn_boss("g"),
        Err(GameError::GameDisabled(_))
    ));
}

#[test]
fn role_requirement_is_enforced_by_default() {
    let repo = Arc::new(MemoryRepository::new());
    let mut config = GuildConfig::for_guild("g");
    config.enabled = true; // allow_unroled_users stays false
    repo.put_guild_config(&config).expect("seed config");
    let engine = GameEngine::new(repo, GameData::embedded().expect("seed data"));

    assert!(matches!(
        engine.register("g", "u", "Hero", CharacterClass::Mage, false),
        Err(GameError::ActionNotAllowed(_))
    ));
    engine
        .register("g", "u", "Hero", CharacterClass::Mage, true)
        .expect("roled user registers");
}

#[test]
fn registration_is_one_character_per_user() {
    let (engine, _repo) = common::memory_engine();
    common::register(&engine, "u", CharacterClass::Rogue);
    assert!(matches!(
        engine.register(common::GUILD, "u", "Again", CharacterClass::Mage, false),
        Err(GameError::AlreadyRegistered(_))
    ));
}

#[test]
fn out_of_range_settings_clamp_on_validate() {
    let mut config = GuildConfig::for_guild("g");
    config.charge_refresh_hours = 500;
    config.xp_multiplier = 99.0;
    config.validate();
    assert_eq!(config.charge_refresh_hours, 168);
    assert!((config.xp_multiplier - 10.0).abs() < f64::EPSILON);
}

#[test]
fn leaderboard_orders_by_level_then_xp_then_age() {
    let (engine, repo) = common::memory_engine();
    common::register(&engine, "a", CharacterClass::Mage);
    common::register(&engine, "b", CharacterClass::Rogue);
    common::register(&engine, "c", CharacterClass::Knight);
    common::register(&engine, "d", CharacterClass::Priest);
    repo.update("a", &mut |ch| {
        ch.level = 3;
        ch.xp = 10;
        Ok(())
    })
    .expect("stage a");
    repo.update("b", &mut |ch| {
        ch.level = 3;
        ch.xp = 50;
        Ok(())
    })
    .expect("stage b");
    // Identical level and XP to "a"; registered later, so ranked after.
    repo.update("d", &mut |ch| {
        ch.level = 3;
        ch.xp = 10;
        Ok(())
    })
    .expect("stage d");

    let board = engine.leaderboard(common::GUILD, 10).expect("leaderboard");
    let order: Vec<&str> = board.iter().map(|c| c.user_id.as_str()).collect();
    assert_eq!(order, vec!["b", "a", "d", "c"]);
}
