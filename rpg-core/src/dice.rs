//! Dice rolling for combat resolution.
//!
//! Every roll the engine makes goes through a [`DiceRoller`], so a round can
//! be replayed exactly from a seed, or driven by a scripted sequence in tests
//! (see [`crate::testing::ScriptedDice`]).

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for die parsing.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid die notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
}

/// Standard polyhedral die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

impl FromStr for DieType {
    type Err = DiceError;

    /// Parses `d6`, `D6` or `1d6`. Multi-die expressions are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let notation = s.trim().to_lowercase();
        let (count, sides) = notation
            .split_once('d')
            .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;

        if !(count.is_empty() || count == "1") {
            return Err(DiceError::InvalidNotation(s.to_string()));
        }

        let sides: u32 = sides
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))
    }
}

/// Source of randomness for a combat encounter.
///
/// Implementations must return independent uniform draws. The engine calls
/// these in a fixed order (party then enemies, list order), so a given
/// sequence of results always replays the same round.
pub trait DiceRoller {
    /// Roll a single die, returning a value in `1..=die.sides()`.
    fn roll(&mut self, die: DieType) -> u32;

    /// Pick an index in `0..len` uniformly. Callers never pass zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl<D: DiceRoller + ?Sized> DiceRoller for Box<D> {
    fn roll(&mut self, die: DieType) -> u32 {
        (**self).roll(die)
    }

    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

/// A [`DiceRoller`] backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    /// Reproducible dice: the same seed yields the same roll sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }
}

impl RngDice<ThreadRng> {
    pub fn thread() -> Self {
        Self::from_rng(rand::thread_rng())
    }
}

impl<R: Rng> DiceRoller for RngDice<R> {
    fn roll(&mut self, die: DieType) -> u32 {
        self.rng.gen_range(1..=die.sides())
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}
