//! Binary entrypoint for the Nilfheim CLI.
//!
//! Commands:
//! - `serve` - run the world sweep loop for every configured guild
//! - `init` - create a starter `config.toml`
//! - `register <guild> <user> <name> <class>` - create a character
//! - `act <guild> <user> <action> [--partner <user>]` - perform an action
//! - `boss status|spawn|attack` - interact with the guild boss
//! - `craft <guild> <user> <recipe>` - craft a stat infusion
//! - `leaderboard <guild>` / `world <guild>` / `character <user>` - inspect state
//!
//! See the library crate docs for module-level details: `nilfheim::`.
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::Path;
use std::sync::Arc;

use nilfheim::actions::ActionKind;
use nilfheim::config::Config;
use nilfheim::crafting::Recipe;
use nilfheim::data::GameData;
use nilfheim::engine::GameEngine;
use nilfheim::errors::GameError;
use nilfheim::model::class::CharacterClass;
use nilfheim::scheduler::spawn_sweeper;
use nilfheim::storage::SledRepository;

#[derive(Parser)]
#[command(name = "nilfheim")]
#[command(about = "Shared-world RPG progression and combat engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the world sweep loop for every configured guild
    Serve,
    /// Write a starter configuration file
    Init,
    /// Create a character
    Register {
        guild: String,
        user: String,
        name: String,
        /// warrior, knight, mage, rogue, necromancer, priest, or oathbreaker
        class: String,
        /// Whether the user holds the guild's game role
        #[arg(long)]
        has_role: bool,
    },
    /// Perform an action (explore, train, battle, rest, duel, donate, resurrect)
    Act {
        guild: String,
        user: String,
        action: String,
        /// Opponent or recipient for duels and donations
        #[arg(long)]
        partner: Option<String>,
    },
    /// Guild boss operations
    Boss {
        #[command(subcommand)]
        command: BossCommands,
    },
    /// Craft a stat infusion
    Craft {
        guild: String,
        user: String,
        recipe: String,
    },
    /// Guild standings by level and XP
    Leaderboard { guild: String },
    /// Active curses and boss status for a guild
    World { guild: String },
    /// One character's sheet
    Character {
        user: String,
        /// Emit the full sheet as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BossCommands {
    /// Show the active boss
    Status { guild: String },
    /// Raise the next boss in the rotation
    Spawn { guild: String },
    /// Spend a charge attacking the boss
    Attack { guild: String, user: String },
    /// Damage standings on the active boss
    Dealers { guild: String },
    /// Drive the boss off undefeated; the guild takes a curse
    Despawn { guild: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        Config::create_default(&cli.config).await?;
        println!("Wrote starter configuration to {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&config, cli.verbose);

    let engine = build_engine(&config)?;

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Serve => {
            info!("Starting Nilfheim v{}", env!("CARGO_PKG_VERSION"));
            let guild_ids: Vec<String> =
                config.guilds.iter().map(|g| g.guild_id.clone()).collect();
            if guild_ids.is_empty() {
                bail!("no guilds configured in {}", cli.config);
            }
            let handle = spawn_sweeper(engine, guild_ids);
            tokio::signal::ctrl_c().await?;
            handle.abort();
            info!("shutting down");
        }
        Commands::Register {
            guild,
            user,
            name,
            class,
            has_role,
        } => {
            let class: CharacterClass = class
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let character = engine.register(&guild, &user, &name, class, has_role)?;
            println!(
                "{} the {} enters Nilfheim at level {} with {} HP.",
                character.name, character.class, character.level, character.stats.max_hp
            );
        }
        Commands::Act {
            guild,
            user,
            action,
            partner,
        } => {
            let kind: ActionKind = action.parse().map_err(|input| GameError::UnknownAction {
                input,
                valid: ActionKind::valid_names(),
            })?;
            let outcome = engine.perform(&guild, &user, kind, partner.as_deref())?;
            println!("{}", outcome.narrative);
            if outcome.xp_gained > 0 {
                println!("  +{} XP", outcome.xp_gained);
            }
            for _ in 0..outcome.levels_gained {
                println!("  LEVEL UP!");
            }
            if outcome.damage_taken > 0 {
                println!("  -{} HP", outcome.damage_taken);
            }
            if outcome.died {
                println!("  You have died. Resurrect when you are ready.");
            }
        }
        Commands::Boss { command } => match command {
            BossCommands::Status { guild } => match engine.boss_status(&guild)? {
                Some(boss) => println!(
                    "{} ({:?} tier {}): {}/{} HP, expires {}",
                    boss.name, boss.kind, boss.tier, boss.current_hp, boss.max_hp, boss.expires_at
                ),
                None => println!("No boss stalks {} right now.", guild),
            },
            BossCommands::Spawn { guild } => {
                let boss = engine.spawn_boss(&guild)?;
                println!("{} rises with {} HP!", boss.name, boss.max_hp);
            }
            BossCommands::Attack { guild, user } => {
                let report = engine.attack_boss(&guild, &user)?;
                println!(
                    "You strike {} for {} damage ({} HP left).",
                    report.boss_name, report.damage, report.hp_remaining
                );
                if report.defeated {
                    println!("{} has fallen!", report.boss_name);
                    for reward in &report.rewards {
                        println!(
                            "  {} earns {} XP{}",
                            reward.user_id,
                            reward.xp,
                            if reward.top_dealer { " (top dealer)" } else { "" }
                        );
                    }
                }
            }
            BossCommands::Dealers { guild } => {
                for (rank, (user, damage)) in
                    engine.top_damage_dealers(&guild, 10)?.iter().enumerate()
                {
                    println!("{:>3}. {} - {} damage", rank + 1, user, damage);
                }
            }
            BossCommands::Despawn { guild } => match engine.despawn_boss(&guild)? {
                Some(curse) => println!(
                    "The boss slips away undefeated. {} settles over the guild.",
                    curse.display_name()
                ),
                None => println!("The boss slips away undefeated."),
            },
        },
        Commands::Craft {
            guild,
            user,
            recipe,
        } => {
            let recipe: Recipe = recipe
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let outcome = engine.craft(&guild, &user, recipe)?;
            println!("{:?}", outcome);
        }
        Commands::Leaderboard { guild } => {
            for (rank, c) in engine.leaderboard(&guild, 10)?.iter().enumerate() {
                println!(
                    "{:>3}. {} the {} - level {} ({} XP)",
                    rank + 1,
                    c.name,
                    c.class,
                    c.level,
                    c.xp
                );
            }
        }
        Commands::World { guild } => {
            match engine.boss_status(&guild)? {
                Some(boss) => println!("Boss: {} ({}/{} HP)", boss.name, boss.current_hp, boss.max_hp),
                None => println!("Boss: none"),
            }
            let curses = engine.active_curses(&guild)?;
            if curses.is_empty() {
                println!("Curses: none");
            } else {
                for curse in curses {
                    println!("Curse: {} - {}", curse.display_name(), curse.flavor());
                }
            }
        }
        Commands::Character { user, json } => {
            let c = engine.character(&user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&c)?);
                return Ok(());
            }
            println!("{} the {} (level {}, {} XP)", c.name, c.class, c.level, c.xp);
            println!(
                "  HP {}/{}  STR {}  AGI {}  INT {}  LUCK {}",
                c.stats.current_hp,
                c.stats.max_hp,
                c.stats.strength,
                c.stats.agility,
                c.stats.intelligence,
                c.stats.luck
            );
            println!("  Charges banked: {}", c.charges);
        }
    }

    Ok(())
}

/// Builds the engine from file config: opens the sled store, loads seed
/// tables (with overrides from the data directory), and seeds per-guild
/// settings from the config file into the store.
fn build_engine(config: &Config) -> Result<Arc<GameEngine>> {
    let data_dir = Path::new(&config.storage.data_dir);
    let repo = Arc::new(SledRepository::open(data_dir)?);
    let data = GameData::load(data_dir)?;
    let engine = GameEngine::new(repo, data);
    for guild in &config.guilds {
        engine.set_guild_config(guild.clone())?;
    }
    Ok(Arc::new(engine))
}

fn init_logging(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).try_init();
}
