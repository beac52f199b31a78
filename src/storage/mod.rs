//! Persistence layer: a pluggable character repository with a sled-backed
//! implementation for deployments and an in-memory one for tests and
//! volatile setups.
//!
//! Records carry a schema version; decoding a record written by a different
//! schema fails loudly with [`GameError::SchemaMismatch`] instead of
//! silently misreading fields.

use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::config::GuildConfig;
use crate::errors::{GameError, Result};
use crate::model::character::{Character, CHARACTER_SCHEMA_VERSION};

const CHARACTERS_TREE: &str = "characters";
const CONFIGS_TREE: &str = "guild_configs";

/// Storage interface the engine depends on. Implementations must make
/// `update` a read-modify-write with no interleaving for the same key.
pub trait CharacterRepository: Send + Sync {
    /// Inserts a new character; fails if the user already has one.
    fn insert(&self, character: &Character) -> Result<()>;

    fn get(&self, user_id: &str) -> Result<Character>;

    fn contains(&self, user_id: &str) -> Result<bool>;

    /// Unconditional write of an existing character.
    fn put(&self, character: &Character) -> Result<()>;

    /// Atomic read-modify-write. The closure may fail, in which case no
    /// write happens. Returns the updated character.
    fn update(
        &self,
        user_id: &str,
        f: &mut dyn FnMut(&mut Character) -> Result<()>,
    ) -> Result<Character>;

    fn all(&self) -> Result<Vec<Character>>;

    /// Removes every character, returning how many were dropped.
    fn clear(&self) -> Result<usize>;

    fn put_guild_config(&self, config: &GuildConfig) -> Result<()>;

    fn get_guild_config(&self, guild_id: &str) -> Result<Option<GuildConfig>>;

    fn remove_guild_config(&self, guild_id: &str) -> Result<()>;
}

fn check_schema(character: &Character) -> Result<()> {
    if character.schema_version != CHARACTER_SCHEMA_VERSION {
        return Err(GameError::SchemaMismatch {
            entity: "character",
            expected: CHARACTER_SCHEMA_VERSION,
            found: character.schema_version,
        });
    }
    Ok(())
}

// ===== Sled implementation =====

/// Sled-backed repository. Values are bincode; per-key atomicity for
/// `update` comes from a store-wide write lock, which is plenty for a
/// single-process chat engine.
pub struct SledRepository {
    characters: sled::Tree,
    configs: sled::Tree,
    _db: sled::Db,
    write_lock: Mutex<()>,
}

impl SledRepository {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        let characters = db.open_tree(CHARACTERS_TREE)?;
        let configs = db.open_tree(CONFIGS_TREE)?;
        info!(
            "opened character store at {} ({} characters)",
            path.display(),
            characters.len()
        );
        Ok(Self {
            characters,
            configs,
            _db: db,
            write_lock: Mutex::new(()),
        })
    }

    fn decode(bytes: &[u8]) -> Result<Character> {
        let character: Character = bincode::deserialize(bytes)?;
        check_schema(&character)?;
        Ok(character)
    }
}

impl CharacterRepository for SledRepository {
    fn insert(&self, character: &Character) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| GameError::Internal("character store lock poisoned".to_string()))?;
        if self.characters.contains_key(character.user_id.as_bytes())? {
            return Err(GameError::AlreadyRegistered(character.user_id.clone()));
        }
        let bytes = bincode::serialize(character)?;
        self.characters.insert(character.user_id.as_bytes(), bytes)?;
        Ok(())
    }

    fn get(&self, user_id: &str) -> Result<Character> {
        match self.characters.get(user_id.as_bytes())? {
            Some(bytes) => Self::decode(&bytes),
            None => Err(GameError::NotFound(format!("character {}", user_id))),
        }
    }

    fn contains(&self, user_id: &str) -> Result<bool> {
        Ok(self.characters.contains_key(user_id.as_bytes())?)
    }

    fn put(&self, character: &Character) -> Result<()> {
        let bytes = bincode::serialize(character)?;
        self.characters.insert(character.user_id.as_bytes(), bytes)?;
        Ok(())
    }

    fn update(
        &self,
        user_id: &str,
        f: &mut dyn FnMut(&mut Character) -> Result<()>,
    ) -> Result<Character> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| GameError::Internal("character store lock poisoned".to_string()))?;
        let mut character = match self.characters.get(user_id.as_bytes())? {
            Some(bytes) => Self::decode(&bytes)?,
            None => return Err(GameError::NotFound(format!("character {}", user_id))),
        };
        f(&mut character)?;
        let bytes = bincode::serialize(&character)?;
        self.characters.insert(user_id.as_bytes(), bytes)?;
        Ok(character)
    }

    fn all(&self) -> Result<Vec<Character>> {
        let mut out = Vec::new();
        for entry in self.characters.iter() {
            let (_, bytes) = entry?;
            match Self::decode(&bytes) {
                Ok(character) => out.push(character),
                Err(GameError::SchemaMismatch {
                    entity,
                    expected,
                    found,
                }) => {
                    // Skip unreadable records rather than failing the scan.
                    warn!(
                        "skipping {} record with schema {} (expected {})",
                        entity, found, expected
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn clear(&self) -> Result<usize> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| GameError::Internal("character store lock poisoned".to_string()))?;
        let count = self.characters.len();
        self.characters.clear()?;
        warn!("cleared all {} characters", count);
        Ok(count)
    }

    fn put_guild_config(&self, config: &GuildConfig) -> Result<()> {
        let bytes = bincode::serialize(config)?;
        self.configs.insert(config.guild_id.as_bytes(), bytes)?;
        Ok(())
    }

    fn get_guild_config(&self, guild_id: &str) -> Result<Option<GuildConfig>> {
        match self.configs.get(guild_id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn remove_guild_config(&self, guild_id: &str) -> Result<()> {
        self.configs.remove(guild_id.as_bytes())?;
        Ok(())
    }
}

// ===== In-memory implementation =====

/// HashMap-backed repository for tests and volatile deployments.
#[derive(Default)]
pub struct MemoryRepository {
    characters: Mutex<HashMap<String, Character>>,
    configs: Mutex<HashMap<String, GuildConfig>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn chars(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Character>>> {
        self.characters
            .lock()
            .map_err(|_| GameError::Internal("character map lock poisoned".to_string()))
    }

    fn confs(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, GuildConfig>>> {
        self.configs
            .lock()
            .map_err(|_| GameError::Internal("config map lock poisoned".to_string()))
    }
}

impl CharacterRepository for MemoryRepository {
    fn insert(&self, character: &Character) -> Result<()> {
        let mut map = self.chars()?;
        if map.contains_key(&character.user_id) {
            return Err(GameError::AlreadyRegistered(character.user_id.clone()));
        }
        map.insert(character.user_id.clone(), character.clone());
        Ok(())
    }

    fn get(&self, user_id: &str) -> Result<Character> {
        self.chars()?
            .get(user_id)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("character {}", user_id)))
    }

    fn contains(&self, user_id: &str) -> Result<bool> {
        Ok(self.chars()?.contains_key(user_id))
    }

    fn put(&self, character: &Character) -> Result<()> {
        self.chars()?
            .insert(character.user_id.clone(), character.clone());
        Ok(())
    }

    fn update(
        &self,
        user_id: &str,
        f: &mut dyn FnMut(&mut Character) -> Result<()>,
    ) -> Result<Character> {
        let mut map = self.chars()?;
        let mut character = map
            .get(user_id)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("character {}", user_id)))?;
        f(&mut character)?;
        map.insert(user_id.to_string(), character.clone());
        Ok(character)
    }

    fn all(&self) -> Result<Vec<Character>> {
        Ok(self.chars()?.values().cloned().collect())
    }

    fn clear(&self) -> Result<usize> {
        let mut map = self.chars()?;
        let count = map.len();
        map.clear();
        Ok(count)
    }

    fn put_guild_config(&self, config: &GuildConfig) -> Result<()> {
        self.confs()?
            .insert(config.guild_id.clone(), config.clone());
        Ok(())
    }

    fn get_guild_config(&self, guild_id: &str) -> Result<Option<GuildConfig>> {
        Ok(self.confs()?.get(guild_id).cloned())
    }

    fn remove_guild_config(&self, guild_id: &str) -> Result<()> {
        self.confs()?.remove(guild_id);
        Ok(())
    }
}
