//! Contracts for the language-model collaborators around the engine.
//!
//! The engine never generates prose or decisions itself. It hands plain-text
//! context to a [`DecisionSource`] (for companions) and a [`Narrator`] (for
//! everything that happened), and treats whatever comes back as untrusted
//! text. Neither collaborator can stall or abort combat: a failed decision
//! becomes the fallback attack, and failed narration becomes the mechanical
//! [`CombatAction::summary`].

use crate::action::CombatAction;
use crate::character::{Character, Role};
use crate::encounter::{Encounter, EncounterStatus, Side};
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Collaborator failed: {0}")]
    Failed(String),
}

/// Instructions appended to every companion prompt.
pub const DECISION_FORMAT: &str = "Return your intended action as: \
\"ACTION: [ATTACK/HEAL/DEFEND] | TARGET: [target name] | REASON: [brief reason]\"";

/// Supplies a companion's intended action as one line of text.
///
/// The caller is responsible for awaiting any asynchronous generation; by
/// the time the engine asks, the answer must be available.
pub trait DecisionSource {
    fn decide(&mut self, companion: &Character, prompt: &str) -> Result<String, CollaboratorError>;
}

impl<F> DecisionSource for F
where
    F: FnMut(&Character, &str) -> Result<String, CollaboratorError>,
{
    fn decide(&mut self, companion: &Character, prompt: &str) -> Result<String, CollaboratorError> {
        self(companion, prompt)
    }
}

/// A decision source for sessions with no language model attached.
/// Every companion falls back to attacking a random living enemy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDecisions;

impl DecisionSource for OfflineDecisions {
    fn decide(&mut self, companion: &Character, _prompt: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable(format!(
            "no decision agent for {}",
            companion.name
        )))
    }
}

/// Turns structured combat context into prose.
///
/// Return values are advisory; the engine proceeds whether or not
/// narration succeeds.
pub trait Narrator {
    fn narrate_action(&mut self, context: &str) -> Result<String, CollaboratorError>;
    fn narrate_start(&mut self, context: &str) -> Result<String, CollaboratorError>;
    fn narrate_end(&mut self, context: &str) -> Result<String, CollaboratorError>;
}

/// Narrator that echoes the context's first line. Useful offline and as the
/// default for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainNarrator;

impl Narrator for PlainNarrator {
    fn narrate_action(&mut self, context: &str) -> Result<String, CollaboratorError> {
        Ok(first_line(context))
    }

    fn narrate_start(&mut self, context: &str) -> Result<String, CollaboratorError> {
        Ok(first_line(context))
    }

    fn narrate_end(&mut self, context: &str) -> Result<String, CollaboratorError> {
        Ok(first_line(context))
    }
}

fn first_line(context: &str) -> String {
    context.lines().next().unwrap_or_default().trim().to_string()
}

/// Narrate an action, substituting its mechanical summary on failure.
pub fn narrate_or_summarize(narrator: &mut dyn Narrator, action: &CombatAction) -> String {
    match narrator.narrate_action(&action.narration_context()) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => action.summary(),
        Err(e) => {
            tracing::warn!("Narration failed for {}'s action: {}", action.attacker.name, e);
            action.summary()
        }
    }
}

// ============================================================================
// Context builders
// ============================================================================

/// Living allies and enemies with their health, as shown to a companion.
pub fn combat_situation(encounter: &Encounter) -> String {
    let mut context = String::from("Combat situation:\n");
    for (header, side) in [("Allies", Side::Party), ("Enemies", Side::Enemies)] {
        let _ = writeln!(context, "{header}:");
        for id in encounter.living(side) {
            if let Some(c) = encounter.get(id) {
                let _ = writeln!(
                    context,
                    "- {} (HP: {}/{})",
                    c.name,
                    c.current_health(),
                    c.max_health()
                );
            }
        }
    }
    context
}

/// Full prompt for a companion's combat decision.
pub fn decision_prompt(companion: &Character, encounter: &Encounter) -> String {
    format!(
        "You are {}, a {} in combat.\n\
         Your stats: HP {}/{}, Strength {}, Intelligence {}, Agility {}, Mana {}/{}\n\
         \n\
         {}\n\
         Decide your action.\n\
         {}",
        companion.name,
        companion.role.label(),
        companion.current_health(),
        companion.max_health(),
        companion.attributes.strength,
        companion.attributes.intelligence,
        companion.attributes.agility,
        companion.current_mana(),
        companion.max_mana(),
        combat_situation(encounter),
        DECISION_FORMAT,
    )
}

/// Scene-setting context when an encounter begins.
pub fn start_context(encounter: &Encounter) -> String {
    let party: Vec<String> = encounter.party().map(describe).collect();
    let enemies: Vec<&str> = encounter.enemies().map(|c| c.name.as_str()).collect();
    format!(
        "Combat begins!\n\
         Location: {}\n\
         Party: {}\n\
         Enemies: {}\n\
         \n\
         Set the scene for this battle.",
        encounter.location(),
        party.join(", "),
        enemies.join(", "),
    )
}

/// Aftermath context once an encounter has reached a terminal state.
pub fn end_context(encounter: &Encounter) -> String {
    let outcome = match encounter.status() {
        EncounterStatus::PlayerVictory => "VICTORY",
        EncounterStatus::PlayerDefeat => "DEFEAT",
        EncounterStatus::Fled => "FLIGHT",
        EncounterStatus::InProgress => "NO RESULT",
    };
    let survivors = encounter.living(Side::Party).len();
    let lead = encounter
        .lead()
        .and_then(|id| encounter.get(id))
        .map(|hero| hero.to_string())
        .unwrap_or_else(|| "none".to_string());

    format!(
        "Combat ended with {outcome}!\n\
         Hero: {lead}\n\
         Party survivors: {survivors}\n\
         \n\
         Narrate the outcome."
    )
}

fn describe(character: &Character) -> String {
    match &character.role {
        Role::Hero(h) => format!("{} (level {} {})", character.name, h.level, h.class),
        Role::Companion(c) => format!("{} ({})", character.name, c.class),
        Role::Enemy(e) => format!("{} ({})", character.name, e.role),
    }
}
