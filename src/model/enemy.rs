use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Archetypes for solo-battle enemies. Class effectiveness against each is
/// tuned in `data/effectiveness.toml`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    Physical,
    Magical,
    Agile,
    Undead,
    Beast,
    Construct,
}

impl EnemyType {
    pub const ALL: [EnemyType; 6] = [
        EnemyType::Physical,
        EnemyType::Magical,
        EnemyType::Agile,
        EnemyType::Undead,
        EnemyType::Beast,
        EnemyType::Construct,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EnemyType::Physical => "Physical",
            EnemyType::Magical => "Magical",
            EnemyType::Agile => "Agile",
            EnemyType::Undead => "Undead",
            EnemyType::Beast => "Beast",
            EnemyType::Construct => "Construct",
        }
    }
}

impl fmt::Display for EnemyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A generated opponent for one battle action.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub name: String,
    pub enemy_type: EnemyType,
    pub level: u32,
    /// Pack enemies hit 15% harder and read differently in narrative.
    pub is_pack: bool,
}

impl Enemy {
    /// Raw power curve shared by all enemy archetypes.
    pub fn power(&self) -> i32 {
        20 + (self.level as i32) * 8
    }
}
