//! Test utilities & fixtures.
//! Builds engines against the in-memory repository with a guild that is
//! enabled and open to everyone, which is what most scenarios want. The
//! repository handle comes back too so tests can stage character state
//! directly.

use std::sync::Arc;

use nilfheim::config::GuildConfig;
use nilfheim::data::GameData;
use nilfheim::engine::GameEngine;
use nilfheim::model::character::Character;
use nilfheim::model::class::CharacterClass;
use nilfheim::storage::{CharacterRepository, MemoryRepository};

pub const GUILD: &str = "test-guild";

/// Engine over a fresh in-memory store with `GUILD` enabled.
pub fn memory_engine() -> (Arc<GameEngine>, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let mut config = GuildConfig::for_guild(GUILD);
    config.enabled = true;
    config.allow_unroled_users = true;
    repo.put_guild_config(&config).expect("seed guild config");
    let engine = GameEngine::new(repo.clone(), GameData::embedded().expect("seed data"));
    (Arc::new(engine), repo)
}

/// Registers a character in `GUILD` and returns the fresh sheet.
#[allow(dead_code)] // Not every test binary registers characters.
pub fn register(engine: &GameEngine, user: &str, class: CharacterClass) -> Character {
    engine
        .register(GUILD, user, &format!("Hero-{}", user), class, false)
        .expect("register character")
}
