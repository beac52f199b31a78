//! # Nilfheim - Shared-World RPG Engine
//!
//! Nilfheim is a progression and combat engine for a shared, persistent
//! fantasy world run inside chat communities ("guilds"). Players register a
//! character in one of seven classes, spend slowly-refilling action charges
//! on exploration, training, battles, and boss raids, and leave permanent
//! marks on a world the whole guild shares: bosses that despawn undefeated
//! curse everyone, legendary auras pass between champions, and some
//! encounter choices can never be taken back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nilfheim::data::GameData;
//! use nilfheim::engine::GameEngine;
//! use nilfheim::storage::MemoryRepository;
//!
//! fn main() -> anyhow::Result<()> {
//!     let repo = Arc::new(MemoryRepository::new());
//!     let engine = GameEngine::new(repo, GameData::embedded()?);
//!     let boss = engine.spawn_boss("my-guild")?;
//!     println!("{} has {} HP", boss.name, boss.max_hp);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - The front door: registration, actions, bosses, crafting
//! - [`actions`] - One resolver per player action behind a common trait
//! - [`boss_service`] - Spawn rotation, tier progression, defeat rewards
//! - [`model`] - Characters, stats, bosses, enemies, inventories
//! - [`curse`] - Guild-wide curses left by undefeated bosses
//! - [`aura`] - Legendary auras with hard holder caps
//! - [`encounter`] - Rare world encounters and stat interactions
//! - [`crafting`] - Essence-and-catalyst stat infusions
//! - [`storage`] - Pluggable character persistence (sled or in-memory)
//! - [`config`] - File config and per-guild settings
//! - [`data`] - TOML seed tables with embedded defaults
//! - [`scheduler`] - The periodic world sweep task

pub mod actions;
pub mod aura;
pub mod boss_service;
pub mod config;
pub mod crafting;
pub mod curse;
pub mod data;
pub mod encounter;
pub mod engine;
pub mod errors;
pub mod model;
pub mod scheduler;
pub mod storage;
