//! Configuration management: engine-wide settings plus per-guild game
//! tuning, with validation, defaults, and TOML persistence.
//!
//! Guild settings are clamped rather than rejected: an out-of-range value in
//! the file is pulled back into range with a logged warning so a typo cannot
//! take the game down.

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Bounds for the charge refresh interval, in hours.
pub const REFRESH_HOURS_MIN: i64 = 1;
pub const REFRESH_HOURS_MAX: i64 = 168;

/// Bounds for the XP multiplier.
pub const XP_MULTIPLIER_MIN: f64 = 0.1;
pub const XP_MULTIPLIER_MAX: f64 = 10.0;

/// Per-guild game tuning. The game is opt-in: `enabled` defaults to false.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildConfig {
    #[serde(default)]
    pub guild_id: String,
    /// Whether the game runs in this guild at all.
    #[serde(default)]
    pub enabled: bool,
    /// Hours between action charge accruals.
    #[serde(default = "default_refresh_hours")]
    pub charge_refresh_hours: i64,
    /// Global XP scaling for this guild.
    #[serde(default = "default_xp_multiplier")]
    pub xp_multiplier: f64,
    /// Allow users without a configured role to play.
    #[serde(default)]
    pub allow_unroled_users: bool,
    /// Hours between automatic boss spawn checks by the sweep task.
    #[serde(default = "default_spawn_check_hours")]
    pub boss_spawn_check_hours: i64,
    /// Hours a boss stays up before it despawns undefeated.
    #[serde(default = "default_despawn_hours")]
    pub boss_despawn_hours: i64,
}

fn default_refresh_hours() -> i64 {
    12
}

fn default_xp_multiplier() -> f64 {
    1.0
}

fn default_spawn_check_hours() -> i64 {
    1
}

fn default_despawn_hours() -> i64 {
    24
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            guild_id: String::new(),
            enabled: false,
            charge_refresh_hours: default_refresh_hours(),
            xp_multiplier: default_xp_multiplier(),
            allow_unroled_users: false,
            boss_spawn_check_hours: default_spawn_check_hours(),
            boss_despawn_hours: default_despawn_hours(),
        }
    }
}

impl GuildConfig {
    pub fn for_guild(guild_id: &str) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            ..Self::default()
        }
    }

    /// Pulls out-of-range values back into bounds, logging each clamp.
    pub fn validate(&mut self) {
        if !(REFRESH_HOURS_MIN..=REFRESH_HOURS_MAX).contains(&self.charge_refresh_hours) {
            warn!(
                "guild {}: charge_refresh_hours {} out of range, clamping",
                self.guild_id, self.charge_refresh_hours
            );
            self.charge_refresh_hours = self
                .charge_refresh_hours
                .clamp(REFRESH_HOURS_MIN, REFRESH_HOURS_MAX);
        }
        if !(XP_MULTIPLIER_MIN..=XP_MULTIPLIER_MAX).contains(&self.xp_multiplier) {
            warn!(
                "guild {}: xp_multiplier {} out of range, clamping",
                self.guild_id, self.xp_multiplier
            );
            self.xp_multiplier = self.xp_multiplier.clamp(XP_MULTIPLIER_MIN, XP_MULTIPLIER_MAX);
        }
        if self.boss_spawn_check_hours < 1 {
            warn!(
                "guild {}: boss_spawn_check_hours {} out of range, clamping",
                self.guild_id, self.boss_spawn_check_hours
            );
            self.boss_spawn_check_hours = 1;
        }
        if !(REFRESH_HOURS_MIN..=REFRESH_HOURS_MAX).contains(&self.boss_despawn_hours) {
            warn!(
                "guild {}: boss_despawn_hours {} out of range, clamping",
                self.guild_id, self.boss_despawn_hours
            );
            self.boss_despawn_hours = self
                .boss_despawn_hours
                .clamp(REFRESH_HOURS_MIN, REFRESH_HOURS_MAX);
        }
    }
}

/// Engine-wide configuration loaded from a TOML file by the binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-guild sections keyed by guild id in the file; flattened here.
    #[serde(default)]
    pub guilds: Vec<GuildConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/nilfheim".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub async fn load(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config file {}", path))?;
        let mut config: Config =
            toml::from_str(&raw).with_context(|| format!("parsing config file {}", path))?;
        for guild in &mut config.guilds {
            guild.validate();
        }
        Ok(config)
    }

    /// Writes a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let mut config = Config::default();
        config.guilds.push(GuildConfig::for_guild("example-guild"));
        let raw = toml::to_string_pretty(&config).context("serializing default config")?;
        fs::write(path, raw)
            .await
            .with_context(|| format!("writing config file {}", path))?;
        Ok(())
    }

    pub fn guild(&self, guild_id: &str) -> Option<&GuildConfig> {
        self.guilds.iter().find(|g| g.guild_id == guild_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_opt_in_and_in_range() {
        let config = GuildConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.charge_refresh_hours, 12);
        assert!((config.xp_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(!config.allow_unroled_users);
        assert_eq!(config.boss_despawn_hours, 24);
    }

    #[test]
    fn validate_clamps_out_of_range() {
        let mut config = GuildConfig::for_guild("g");
        config.charge_refresh_hours = 500;
        config.xp_multiplier = 0.0;
        config.boss_despawn_hours = 0;
        config.validate();
        assert_eq!(config.charge_refresh_hours, REFRESH_HOURS_MAX);
        assert!((config.xp_multiplier - XP_MULTIPLIER_MIN).abs() < f64::EPSILON);
        assert_eq!(config.boss_despawn_hours, REFRESH_HOURS_MIN);
    }

    #[test]
    fn toml_round_trip_preserves_guild_settings() {
        let mut config = Config::default();
        let mut guild = GuildConfig::for_guild("g1");
        guild.enabled = true;
        guild.xp_multiplier = 2.0;
        config.guilds.push(guild);
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        let g = parsed.guild("g1").unwrap();
        assert!(g.enabled);
        assert!((g.xp_multiplier - 2.0).abs() < f64::EPSILON);
    }
}
