use thiserror::Error;

/// Errors that can arise while running the game engine or its storage layer.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, data file reads).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Registration attempted for a user that already has a character.
    #[error("user {0} already has a character")]
    AlreadyRegistered(String),

    /// The game is disabled for this guild.
    #[error("the game is not enabled for guild {0}")]
    GameDisabled(String),

    /// Input did not parse as a known action.
    #[error("unknown action '{input}' (valid: {valid})")]
    UnknownAction { input: String, valid: String },

    /// Character has no charges left.
    #[error("no action charges available (next refresh in {minutes_until_refresh}m)")]
    NoCharges { minutes_until_refresh: i64 },

    /// Character is dead and must resurrect first.
    #[error("character is dead; resurrect first")]
    CharacterDead,

    /// Character is still recovering from resurrection.
    #[error("character is recovering for another {minutes_left}m")]
    Recovering { minutes_left: i64 },

    /// Action preconditions not met (level gates, duel window, donate rules).
    #[error("action not allowed: {0}")]
    ActionNotAllowed(String),

    /// No boss is active for the guild.
    #[error("no active boss for guild {0}")]
    NoActiveBoss(String),

    /// Seed data table failed to parse or failed validation.
    #[error("invalid seed data in {table}: {reason}")]
    InvalidSeedData { table: &'static str, reason: String },

    /// Internal error (lock poisoning, unexpected conditions).
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
