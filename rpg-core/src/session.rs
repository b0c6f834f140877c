//! GameSession - the party-level API around the combat engine.
//!
//! A session owns the hero, the travelling companions, at most one live
//! encounter and the narration/decision collaborators. It lends the roster
//! to each encounter and writes the post-combat state back when the
//! encounter ends.

use crate::action::CombatAction;
use crate::character::Character;
use crate::collaborators::{
    end_context, narrate_or_summarize, start_context, CollaboratorError, DecisionSource, Narrator,
    OfflineDecisions, PlainNarrator,
};
use crate::dice::{DiceRoller, RngDice};
use crate::encounter::{same_name, CombatError, Encounter, EncounterId, EncounterStatus};
use crate::engine::CombatEngine;
use crate::round::{EncounterEvent, RoundReport};
use crate::rules::{CombatRules, RulesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Combat error: {0}")]
    Combat(#[from] CombatError),

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Already in combat")]
    AlreadyInCombat,

    #[error("Not in combat")]
    NotInCombat,

    #[error("The game is over")]
    GameOver,
}

/// Configuration for creating a new game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Campaign name.
    pub campaign_name: String,

    /// Hero name.
    pub hero_name: String,

    /// Hero class, which picks the starting attribute layout.
    pub hero_class: String,

    /// Combat constants.
    pub rules: CombatRules,

    /// Seed for reproducible dice. Thread-local randomness when unset.
    pub seed: Option<u64>,
}

impl SessionConfig {
    /// Create a new session config with campaign name.
    pub fn new(campaign_name: impl Into<String>) -> Self {
        Self {
            campaign_name: campaign_name.into(),
            hero_name: "Adventurer".to_string(),
            hero_class: "Warrior".to_string(),
            rules: CombatRules::default(),
            seed: None,
        }
    }

    pub fn with_hero(mut self, name: impl Into<String>, class: impl Into<String>) -> Self {
        self.hero_name = name.into();
        self.hero_class = class.into();
        self
    }

    pub fn with_rules(mut self, rules: CombatRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Whether the campaign can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    GameOver,
}

/// One round as the player sees it.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub report: RoundReport,
    /// Narration per action, in acting order.
    pub narration: Vec<String>,
    /// Closing narration when the round ended the encounter.
    pub ending: Option<String>,
}

impl RoundSummary {
    pub fn actions(&self) -> &[CombatAction] {
        &self.report.actions
    }

    pub fn status(&self) -> EncounterStatus {
        self.report.status
    }
}

pub struct GameSession {
    campaign_name: String,
    hero: Character,
    companions: Vec<Character>,
    engine: CombatEngine,
    encounter: Option<EncounterId>,
    status: GameStatus,
    history: Vec<String>,
    narrator: Box<dyn Narrator>,
    decisions: Box<dyn DecisionSource>,
}

impl GameSession {
    /// Create a session with a fresh level 1 hero and no companions.
    ///
    /// Without collaborators attached, companions always take the fallback
    /// attack and narration is the first line of each context block.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let rules = config.rules.validate()?;
        let engine = match config.seed {
            Some(seed) => CombatEngine::seeded(rules, seed),
            None => CombatEngine::new(rules, RngDice::thread()),
        };
        let hero = Character::hero(config.hero_name, config.hero_class);

        tracing::info!(
            "Session '{}' started with {} the {}",
            config.campaign_name,
            hero.name,
            hero.role.label()
        );

        Ok(Self {
            campaign_name: config.campaign_name,
            hero,
            companions: Vec::new(),
            engine,
            encounter: None,
            status: GameStatus::InProgress,
            history: Vec::new(),
            narrator: Box::new(PlainNarrator),
            decisions: Box::new(OfflineDecisions),
        })
    }

    pub fn with_narrator(mut self, narrator: impl Narrator + 'static) -> Self {
        self.narrator = Box::new(narrator);
        self
    }

    pub fn with_decisions(mut self, decisions: impl DecisionSource + 'static) -> Self {
        self.decisions = Box::new(decisions);
        self
    }

    /// Replace the dice. Any encounter in progress is discarded.
    pub fn with_dice(mut self, dice: impl DiceRoller + 'static) -> Self {
        self.engine = CombatEngine::new(self.engine.rules().clone(), dice);
        self.encounter = None;
        self
    }

    /// Replace the hero, e.g. with a restored or hand-built character.
    pub fn with_hero(mut self, hero: Character) -> Self {
        self.hero = hero;
        self
    }

    pub fn campaign_name(&self) -> &str {
        &self.campaign_name
    }

    /// The hero as of the last finished encounter.
    pub fn hero(&self) -> &Character {
        &self.hero
    }

    /// Companions as of the last finished encounter.
    pub fn companions(&self) -> &[Character] {
        &self.companions
    }

    pub fn companion_mut(&mut self, name: &str) -> Option<&mut Character> {
        self.companions
            .iter_mut()
            .find(|c| same_name(&c.name, name))
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn rules(&self) -> &CombatRules {
        self.engine.rules()
    }

    pub fn in_combat(&self) -> bool {
        self.encounter.is_some()
    }

    /// Live state of the current encounter.
    pub fn current_encounter(&self) -> Option<&Encounter> {
        self.encounter.and_then(|id| self.engine.encounter(id).ok())
    }

    // ------------------------------------------------------------------
    // Party management
    // ------------------------------------------------------------------

    /// Add a companion to the party. Refused when the party is full, the
    /// character is not a companion, a fight is under way or the game is
    /// over.
    pub fn recruit(&mut self, companion: Character) -> bool {
        if self.is_game_over() || self.in_combat() || !companion.is_companion() {
            return false;
        }
        if self.companions.len() >= self.rules().max_team_size {
            tracing::debug!(
                "Cannot recruit {}: party is full ({} companions)",
                companion.name,
                self.companions.len()
            );
            return false;
        }

        tracing::info!("{} joined the party", companion.name);
        self.history.push(format!("{} joined the party", companion.name));
        self.companions.push(companion);
        true
    }

    /// Remove a companion by name.
    pub fn dismiss(&mut self, name: &str) -> Option<Character> {
        if self.in_combat() {
            return None;
        }
        let index = self
            .companions
            .iter()
            .position(|c| same_name(&c.name, name))?;
        let companion = self.companions.remove(index);
        self.history.push(format!("{} left the party", companion.name));
        Some(companion)
    }

    /// Apply a companion's spoken reaction to their loyalty. Returns the
    /// delta applied, or `None` if nobody by that name travels with the
    /// party.
    pub fn record_reaction(&mut self, name: &str, reaction: &str) -> Option<i32> {
        let companion = self.companion_mut(name)?;
        let delta = companion.react_to(reaction);
        if companion.is_likely_to_leave() {
            tracing::warn!("{} is considering leaving the party", companion.name);
        }
        Some(delta)
    }

    /// Companions whose loyalty has fallen low enough that they may leave.
    pub fn wavering_companions(&self) -> Vec<&Character> {
        self.companions
            .iter()
            .filter(|c| c.is_likely_to_leave())
            .collect()
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Start a fight against `enemies`. Returns the opening narration.
    pub fn start_combat(
        &mut self,
        enemies: Vec<Character>,
        location: impl Into<String>,
    ) -> Result<String, SessionError> {
        if self.is_game_over() {
            return Err(SessionError::GameOver);
        }
        if self.in_combat() {
            return Err(SessionError::AlreadyInCombat);
        }

        let location = location.into();
        let mut party = Vec::with_capacity(self.companions.len() + 1);
        party.push(self.hero.clone());
        party.extend(self.companions.iter().cloned());

        let id = self.engine.start_encounter(party, enemies, location.clone())?;
        self.encounter = Some(id);
        self.history.push(format!("Combat started at {location}"));

        let context = start_context(self.engine.encounter(id)?);
        Ok(narrate_or(self.narrator.narrate_start(&context), &context))
    }

    /// Play one round of the current fight, narrating each action.
    pub fn execute_round(&mut self) -> Result<RoundSummary, SessionError> {
        let id = self.encounter.ok_or(SessionError::NotInCombat)?;
        let report = self.engine.execute_round(id, &mut *self.decisions)?;

        let narration = report
            .actions
            .iter()
            .map(|action| narrate_or_summarize(&mut *self.narrator, action))
            .collect();

        let ending = if report.is_over() {
            Some(self.finish_combat(id, &report.events)?)
        } else {
            None
        };

        Ok(RoundSummary {
            report,
            narration,
            ending,
        })
    }

    /// Abandon the current fight. No experience is awarded.
    ///
    /// The retreat is reported like a final round holding a single `Flee`
    /// action, narrated before the closing narration.
    pub fn flee(&mut self) -> Result<RoundSummary, SessionError> {
        let id = self.encounter.ok_or(SessionError::NotInCombat)?;
        let turn = self.engine.encounter(id)?.current_turn();
        let retreat = self.engine.flee(id)?;

        let narration = vec![narrate_or_summarize(&mut *self.narrator, &retreat)];
        let events = vec![EncounterEvent::Fled];
        let ending = self.finish_combat(id, &events)?;

        Ok(RoundSummary {
            report: RoundReport {
                turn,
                actions: vec![retreat],
                status: EncounterStatus::Fled,
                events,
            },
            narration,
            ending: Some(ending),
        })
    }

    fn finish_combat(
        &mut self,
        id: EncounterId,
        events: &[EncounterEvent],
    ) -> Result<String, SessionError> {
        let encounter = self.engine.end_encounter(id)?;
        self.encounter = None;

        let status = encounter.status();
        let context = end_context(&encounter);
        self.history.push(format!("Combat ended: {status}"));

        let (mut party, _enemies) = encounter.into_rosters();
        let companions = party.split_off(1);
        if let Some(hero) = party.pop() {
            self.hero = hero;
        }
        self.companions = companions;

        for event in events {
            match event {
                EncounterEvent::LevelUp { hero, level } => {
                    self.history.push(format!("{hero} reached level {level}"));
                }
                EncounterEvent::Defeat => {
                    self.status = GameStatus::GameOver;
                    self.history.push("Game Over".to_string());
                    tracing::info!("Game over for campaign '{}'", self.campaign_name);
                }
                EncounterEvent::Victory { .. } | EncounterEvent::Fled => {}
            }
        }

        Ok(narrate_or(self.narrator.narrate_end(&context), &context))
    }
}

fn narrate_or(result: Result<String, CollaboratorError>, context: &str) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => context.lines().next().unwrap_or_default().to_string(),
        Err(e) => {
            tracing::warn!("Narration failed: {}", e);
            context.lines().next().unwrap_or_default().to_string()
        }
    }
}
