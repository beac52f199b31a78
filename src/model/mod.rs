//! Domain model: classes, stats, characters, inventory, bosses, outcomes.

pub mod boss;
pub mod character;
pub mod class;
pub mod enemy;
pub mod inventory;
pub mod outcome;
pub mod stats;

pub use boss::{Boss, BossKind, BossType, DamageLedger};
pub use character::{Character, LifeState, CHARACTER_SCHEMA_VERSION};
pub use class::{CharacterClass, StatKind};
pub use enemy::{Enemy, EnemyType};
pub use inventory::{CatalystType, CraftedItemType, EssenceType, Inventory};
pub use outcome::{ActionOutcome, ItemDrop};
pub use stats::Stats;
