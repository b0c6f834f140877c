//! Turn-based party combat engine for LLM-narrated role-playing games.
//!
//! Language models narrate and speak for companions, but every mechanical
//! outcome here is rule-driven and reproducible:
//! - D&D-style attribute model with health/mana pools and class presets
//! - Encounter state machine over an arena of combatants
//! - Deterministic turn resolution with explicit, seedable dice
//! - A forgiving parser for companion decisions with a safe fallback
//! - A game session tying the party, narration and progression together
//!
//! # Quick Start
//!
//! ```ignore
//! use rpg_core::{Character, GameSession, SessionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("Border Marches")
//!         .with_hero("Roland", "Warrior")
//!         .with_seed(7);
//!     let mut session = GameSession::new(config)?;
//!     session.recruit(Character::companion("Ilse", "Cleric", "kind", "temple orphan"));
//!
//!     println!("{}", session.start_combat(vec![Character::enemy("Goblin", "Raider")], "Old Mill")?);
//!     while session.in_combat() {
//!         let round = session.execute_round()?;
//!         for line in &round.narration {
//!             println!("{line}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod character;
pub mod collaborators;
pub mod dice;
pub mod encounter;
pub mod engine;
pub mod intent;
pub mod resolver;
pub mod round;
pub mod rules;
pub mod session;
pub mod testing;

// Primary public API
pub use action::{ActionType, CombatAction, Participant};
pub use character::{Attribute, Attributes, Character, Role};
pub use collaborators::{CollaboratorError, DecisionSource, Narrator};
pub use dice::{DiceRoller, DieType, RngDice};
pub use encounter::{CombatError, CombatantId, Encounter, EncounterId, EncounterStatus, Side};
pub use engine::CombatEngine;
pub use intent::{parse_decision, DecisionIntent, DecisionKind, IntentParseError};
pub use round::{EncounterEvent, RoundReport};
pub use rules::{CombatRules, RulesError};
pub use session::{GameSession, GameStatus, RoundSummary, SessionConfig, SessionError};
