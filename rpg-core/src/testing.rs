//! Testing utilities for the combat engine.
//!
//! This module provides deterministic stand-ins for everything random or
//! external:
//! - `ScriptedDice` replays a forced die sequence
//! - `ScriptedDecisions` plays back companion decision lines
//! - `RecordingNarrator` / `FailingNarrator` for the narration seam
//! - Character fixtures for common scenarios

use crate::character::Character;
use crate::collaborators::{CollaboratorError, DecisionSource, Narrator};
use crate::dice::{DiceRoller, DieType};
use std::collections::VecDeque;

/// Dice that return a scripted sequence.
///
/// Rolls are consumed in order and panic when the script runs out, so a test
/// fails loudly if the engine rolls more than expected. Picks default to the
/// first candidate once their script is exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    picks: VecDeque<usize>,
    /// Every roll made so far, with the die it was made on.
    history: Vec<(DieType, u32)>,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Dice for a test that must not roll at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Script the results of random target selection.
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks = picks.into_iter().collect();
        self
    }

    /// Append more rolls to the script.
    pub fn push_rolls(&mut self, rolls: impl IntoIterator<Item = u32>) {
        self.rolls.extend(rolls);
    }

    /// Rolls not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }

    pub fn history(&self) -> &[(DieType, u32)] {
        &self.history
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self, die: DieType) -> u32 {
        let Some(value) = self.rolls.pop_front() else {
            panic!("ScriptedDice exhausted: no roll left for {die}");
        };
        assert!(
            (1..=die.sides()).contains(&value),
            "scripted roll {value} is not possible on a {die}"
        );
        self.history.push((die, value));
        value
    }

    fn pick(&mut self, len: usize) -> usize {
        let index = self.picks.pop_front().unwrap_or(0);
        assert!(index < len, "scripted pick {index} out of range for {len} candidates");
        index
    }
}

/// Plays back decision lines in order, recording every prompt it was shown.
///
/// Once the script is exhausted every further request fails, which the
/// resolver treats like any other unusable decision.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    lines: VecDeque<String>,
    /// (companion name, prompt) for every request.
    prompts: Vec<(String, String)>,
}

impl ScriptedDecisions {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    pub fn prompts(&self) -> &[(String, String)] {
        &self.prompts
    }
}

impl DecisionSource for ScriptedDecisions {
    fn decide(&mut self, companion: &Character, prompt: &str) -> Result<String, CollaboratorError> {
        self.prompts.push((companion.name.clone(), prompt.to_string()));
        self.lines
            .pop_front()
            .ok_or_else(|| CollaboratorError::Unavailable("decision script exhausted".to_string()))
    }
}

/// Narrator that records every context it receives and answers with a short
/// canned line.
#[derive(Debug, Clone, Default)]
pub struct RecordingNarrator {
    pub actions: Vec<String>,
    pub starts: Vec<String>,
    pub endings: Vec<String>,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Narrator for RecordingNarrator {
    fn narrate_action(&mut self, context: &str) -> Result<String, CollaboratorError> {
        self.actions.push(context.to_string());
        Ok(format!("[narrated action {}]", self.actions.len()))
    }

    fn narrate_start(&mut self, context: &str) -> Result<String, CollaboratorError> {
        self.starts.push(context.to_string());
        Ok("[the battle begins]".to_string())
    }

    fn narrate_end(&mut self, context: &str) -> Result<String, CollaboratorError> {
        self.endings.push(context.to_string());
        Ok("[the dust settles]".to_string())
    }
}

/// Narrator whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingNarrator;

impl Narrator for FailingNarrator {
    fn narrate_action(&mut self, _context: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Failed("narrator offline".to_string()))
    }

    fn narrate_start(&mut self, _context: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Failed("narrator offline".to_string()))
    }

    fn narrate_end(&mut self, _context: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Failed("narrator offline".to_string()))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Level 1 warrior hero: STR 16 (+3), AGI 12 (defense 11), 140 HP, weapon +2.
pub fn sample_hero() -> Character {
    Character::hero("Roland", "Warrior")
}

/// Cleric companion: INT 14 (+2), 120 HP, 70 mana.
pub fn sample_healer() -> Character {
    Character::companion("Ilse", "Cleric", "gentle but stubborn", "raised in a mountain temple")
}

/// Fighter companion: STR 15 (+2), armor +1, weapon +2.
pub fn sample_fighter() -> Character {
    Character::companion("Bram", "Fighter", "gruff", "deserted the king's army")
}

/// A weak rule-driven enemy with the given health.
pub fn goblin(name: &str, health: i32) -> Character {
    Character::enemy(name, "Raider").with_health(health, health)
}
