//! Encounter state: the two sides of a fight and its status.
//!
//! Characters live in an arena owned by the [`Encounter`] and are addressed
//! by [`CombatantId`]. The party and enemy lists are ordered index sets into
//! that arena, so the resolver can mutate any combatant in place without
//! holding overlapping references.

use crate::character::Character;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Caller-misuse errors from the combat engine.
///
/// Expected runtime variance (bad collaborator text, missing mana, dead
/// targets) never surfaces here; it degrades to a fallback action instead.
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("Encounter is already over ({0})")]
    EncounterOver(EncounterStatus),

    #[error("Unknown encounter: {0}")]
    UnknownEncounter(EncounterId),

    #[error("No combatant with id {0}")]
    UnknownCombatant(CombatantId),

    #[error("{0} is down and cannot act")]
    ActorDown(String),

    #[error("{0} has no living opponent to act against")]
    NoLivingTarget(String),

    #[error("Cannot start an encounter with no {0}")]
    EmptyRoster(Side),
}

/// Unique identifier for an encounter; doubles as the caller's handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterId(pub Uuid);

impl EncounterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EncounterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable index of a character within one encounter's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub usize);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of the fight a combatant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Party,
    Enemies,
}

impl Side {
    pub fn opposing(self) -> Side {
        match self {
            Side::Party => Side::Enemies,
            Side::Enemies => Side::Party,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Party => write!(f, "party members"),
            Side::Enemies => write!(f, "enemies"),
        }
    }
}

/// Encounter lifecycle. Transitions are one-way: `InProgress` to exactly
/// one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterStatus {
    InProgress,
    PlayerVictory,
    PlayerDefeat,
    Fled,
}

impl EncounterStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EncounterStatus::InProgress)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EncounterStatus::InProgress => "in progress",
            EncounterStatus::PlayerVictory => "victory",
            EncounterStatus::PlayerDefeat => "defeat",
            EncounterStatus::Fled => "fled",
        }
    }
}

impl fmt::Display for EncounterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One combat between the party and a set of enemies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    id: EncounterId,
    location: String,
    status: EncounterStatus,
    current_turn: u32,
    combatants: Vec<Character>,
    party: Vec<CombatantId>,
    enemies: Vec<CombatantId>,
}

impl Encounter {
    /// Build an encounter. Both rosters must be non-empty; list order is
    /// preserved and becomes the acting order.
    pub fn new(
        party: Vec<Character>,
        enemies: Vec<Character>,
        location: impl Into<String>,
    ) -> Result<Self, CombatError> {
        if party.is_empty() {
            return Err(CombatError::EmptyRoster(Side::Party));
        }
        if enemies.is_empty() {
            return Err(CombatError::EmptyRoster(Side::Enemies));
        }

        let party_ids = (0..party.len()).map(CombatantId).collect();
        let enemy_ids = (party.len()..party.len() + enemies.len())
            .map(CombatantId)
            .collect();

        let mut combatants = party;
        combatants.extend(enemies);

        Ok(Self {
            id: EncounterId::new(),
            location: location.into(),
            status: EncounterStatus::InProgress,
            current_turn: 1,
            combatants,
            party: party_ids,
            enemies: enemy_ids,
        })
    }

    pub fn id(&self) -> EncounterId {
        self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> EncounterStatus {
        self.status
    }

    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    pub fn is_active(&self) -> bool {
        self.status == EncounterStatus::InProgress
    }

    // ------------------------------------------------------------------
    // Arena access
    // ------------------------------------------------------------------

    pub fn get(&self, id: CombatantId) -> Option<&Character> {
        self.combatants.get(id.0)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Character> {
        self.combatants.get_mut(id.0)
    }

    pub fn character(&self, id: CombatantId) -> Result<&Character, CombatError> {
        self.get(id).ok_or(CombatError::UnknownCombatant(id))
    }

    pub fn character_mut(&mut self, id: CombatantId) -> Result<&mut Character, CombatError> {
        self.get_mut(id).ok_or(CombatError::UnknownCombatant(id))
    }

    pub fn ids(&self, side: Side) -> &[CombatantId] {
        match side {
            Side::Party => &self.party,
            Side::Enemies => &self.enemies,
        }
    }

    pub fn party_ids(&self) -> &[CombatantId] {
        &self.party
    }

    pub fn enemy_ids(&self) -> &[CombatantId] {
        &self.enemies
    }

    pub fn party(&self) -> impl Iterator<Item = &Character> {
        self.party.iter().filter_map(|id| self.get(*id))
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Character> {
        self.enemies.iter().filter_map(|id| self.get(*id))
    }

    pub fn side_of(&self, id: CombatantId) -> Option<Side> {
        if self.party.contains(&id) {
            Some(Side::Party)
        } else if self.enemies.contains(&id) {
            Some(Side::Enemies)
        } else {
            None
        }
    }

    /// Living members of a side, in list order.
    pub fn living(&self, side: Side) -> Vec<CombatantId> {
        self.ids(side)
            .iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(Character::is_alive))
            .collect()
    }

    pub fn has_living(&self, side: Side) -> bool {
        self.ids(side)
            .iter()
            .any(|id| self.get(*id).is_some_and(Character::is_alive))
    }

    /// First living member of `side` whose name matches, ignoring case and
    /// surrounding whitespace.
    pub fn find_living_by_name(&self, side: Side, name: &str) -> Option<CombatantId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.ids(side).iter().copied().find(|id| {
            self.get(*id)
                .is_some_and(|c| c.is_alive() && same_name(&c.name, name))
        })
    }

    /// The player-controlled lead: the first hero in the party list.
    pub fn lead(&self) -> Option<CombatantId> {
        self.party
            .iter()
            .copied()
            .find(|id| self.get(*id).is_some_and(Character::is_hero))
    }

    // ------------------------------------------------------------------
    // Termination predicates
    // ------------------------------------------------------------------

    pub fn all_enemies_defeated(&self) -> bool {
        !self.has_living(Side::Enemies)
    }

    pub fn is_party_defeated(&self) -> bool {
        !self.has_living(Side::Party)
    }

    pub fn advance_turn(&mut self) {
        self.current_turn += 1;
    }

    // ------------------------------------------------------------------
    // Terminal transitions
    //
    // Each returns `true` only when it moved the encounter out of
    // `InProgress`. Calling any of them on a finished encounter is a no-op
    // that returns `false`, so callers can gate one-shot side effects on it.
    // ------------------------------------------------------------------

    pub fn end_with_victory(&mut self) -> bool {
        self.finish(EncounterStatus::PlayerVictory)
    }

    pub fn end_with_defeat(&mut self) -> bool {
        self.finish(EncounterStatus::PlayerDefeat)
    }

    pub fn end_by_fleeing(&mut self) -> bool {
        self.finish(EncounterStatus::Fled)
    }

    fn finish(&mut self, status: EncounterStatus) -> bool {
        if self.status.is_terminal() {
            tracing::debug!(
                "Ignoring transition to {} for encounter {} (already {})",
                status,
                self.id,
                self.status
            );
            return false;
        }
        self.status = status;
        true
    }

    /// Hand the (mutated) rosters back to the owner, party first.
    pub fn into_rosters(self) -> (Vec<Character>, Vec<Character>) {
        let mut combatants = self.combatants;
        let enemies = combatants.split_off(self.party.len());
        (combatants, enemies)
    }
}

/// Case-insensitive name comparison that folds non-ASCII letters too.
pub fn same_name(name: &str, query: &str) -> bool {
    name.trim().to_lowercase() == query.trim().to_lowercase()
}
