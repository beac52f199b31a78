//! World sweep scheduler.
//!
//! Drives the periodic upkeep the shared world needs without any external
//! cron: expired bosses despawn (leaving their curse behind) and a fresh one
//! rises when the field is empty. Sweeps align to UTC hour boundaries and
//! run from a plain clock check, so the task behaves the same on any host.

use chrono::{DateTime, Timelike, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::GameEngine;
use crate::errors::Result;

/// How often the background task samples the clock.
const TICK_SECONDS: u64 = 60;

/// Tracks sweep state for a fixed set of guilds.
pub struct WorldSweeper {
    engine: Arc<GameEngine>,
    guild_ids: Vec<String>,
    /// Unix-epoch hour of the last sweep per guild, for boundary dedupe.
    last_sweep_hour: HashMap<String, i64>,
}

impl WorldSweeper {
    pub fn new(engine: Arc<GameEngine>, guild_ids: Vec<String>) -> Self {
        Self {
            engine,
            guild_ids,
            last_sweep_hour: HashMap::new(),
        }
    }

    /// Checks the clock and sweeps any guild whose boundary has arrived.
    /// Call this from a periodic tick; sweeping the same boundary twice is
    /// deduplicated. Returns the guilds swept.
    pub fn check_and_sweep(&mut self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let boundary_hour = now.timestamp() / 3600;
        let mut swept = Vec::new();
        for guild_id in &self.guild_ids {
            let config = self.engine.guild_config(guild_id)?;
            if !config.enabled {
                continue;
            }
            let cadence = config.boss_spawn_check_hours.max(1);
            if now.minute() != 0 || (now.hour() as i64) % cadence != 0 {
                continue;
            }
            if self.last_sweep_hour.get(guild_id) == Some(&boundary_hour) {
                debug!("guild {} already swept this boundary", guild_id);
                continue;
            }
            self.engine.sweep_guild(guild_id, now)?;
            self.last_sweep_hour.insert(guild_id.clone(), boundary_hour);
            swept.push(guild_id.clone());
        }
        if !swept.is_empty() {
            info!("world sweep covered {} guild(s)", swept.len());
        }
        Ok(swept)
    }

    /// Sweeps every enabled guild immediately, boundaries aside. Used at
    /// startup so a restart never leaves a guild without a boss.
    pub fn sweep_all(&mut self, now: DateTime<Utc>) -> Result<()> {
        for guild_id in &self.guild_ids {
            self.engine.sweep_guild(guild_id, now)?;
            self.last_sweep_hour
                .insert(guild_id.clone(), now.timestamp() / 3600);
        }
        Ok(())
    }
}

/// Spawns the sweep loop on the tokio runtime. The task samples the clock
/// once a minute and defers all decisions to [`WorldSweeper`].
pub fn spawn_sweeper(
    engine: Arc<GameEngine>,
    guild_ids: Vec<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sweeper = WorldSweeper::new(engine, guild_ids);
        if let Err(e) = sweeper.sweep_all(Utc::now()) {
            warn!("startup world sweep failed: {}", e);
        }
        let mut ticker = tokio::time::interval(Duration::from_secs(TICK_SECONDS));
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.check_and_sweep(Utc::now()) {
                warn!("world sweep failed: {}", e);
            }
        }
    })
}
