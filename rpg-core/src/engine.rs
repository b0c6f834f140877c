//! CombatEngine - the inbound API for running encounters.
//!
//! The engine owns every live encounter, the rule set and the dice. Callers
//! hold an [`EncounterId`] handle and drive combat one round at a time.

use crate::action::{CombatAction, Participant};
use crate::character::Character;
use crate::collaborators::DecisionSource;
use crate::dice::{DiceRoller, RngDice};
use crate::encounter::{CombatError, Encounter, EncounterId, EncounterStatus, Side};
use crate::round::{RoundOrchestrator, RoundReport};
use crate::rules::CombatRules;
use std::collections::HashMap;

pub struct CombatEngine {
    rules: CombatRules,
    dice: Box<dyn DiceRoller>,
    encounters: HashMap<EncounterId, Encounter>,
}

impl CombatEngine {
    /// Create an engine rolling with the given dice.
    pub fn new(rules: CombatRules, dice: impl DiceRoller + 'static) -> Self {
        Self {
            rules,
            dice: Box::new(dice),
            encounters: HashMap::new(),
        }
    }

    /// An engine whose every roll is reproducible from `seed`.
    pub fn seeded(rules: CombatRules, seed: u64) -> Self {
        Self::new(rules, RngDice::seeded(seed))
    }

    pub fn rules(&self) -> &CombatRules {
        &self.rules
    }

    /// Begin an encounter between two non-empty rosters.
    pub fn start_encounter(
        &mut self,
        party: Vec<Character>,
        enemies: Vec<Character>,
        location: impl Into<String>,
    ) -> Result<EncounterId, CombatError> {
        let encounter = Encounter::new(party, enemies, location)?;
        let id = encounter.id();
        tracing::info!(
            "Encounter {} started at {}: {} party members vs {} enemies",
            id,
            encounter.location(),
            encounter.party_ids().len(),
            encounter.enemy_ids().len()
        );
        self.encounters.insert(id, encounter);
        Ok(id)
    }

    /// Play one round of an active encounter.
    pub fn execute_round(
        &mut self,
        id: EncounterId,
        decisions: &mut dyn DecisionSource,
    ) -> Result<RoundReport, CombatError> {
        let encounter = self
            .encounters
            .get_mut(&id)
            .ok_or(CombatError::UnknownEncounter(id))?;

        let report = RoundOrchestrator::new(&self.rules).execute_round(
            encounter,
            decisions,
            &mut *self.dice,
        )?;

        if report.is_over() {
            tracing::info!("Encounter {} ended: {}", id, report.status);
        }
        Ok(report)
    }

    /// Force an active encounter to end in flight. No experience is awarded.
    ///
    /// Returns the retreat as a `Flee` action led by the lead hero, or by the
    /// first party member when there is no hero.
    pub fn flee(&mut self, id: EncounterId) -> Result<CombatAction, CombatError> {
        let encounter = self.encounter_mut(id)?;
        if !encounter.end_by_fleeing() {
            return Err(CombatError::EncounterOver(encounter.status()));
        }

        let leader = encounter
            .lead()
            .or_else(|| encounter.party_ids().first().copied())
            .ok_or(CombatError::EmptyRoster(Side::Party))?;
        let action = CombatAction::flee(Participant::capture(leader, encounter.character(leader)?));

        tracing::info!("{} led the party out of encounter {}", action.attacker.name, id);
        Ok(action)
    }

    pub fn encounter(&self, id: EncounterId) -> Result<&Encounter, CombatError> {
        self.encounters.get(&id).ok_or(CombatError::UnknownEncounter(id))
    }

    pub fn encounter_mut(&mut self, id: EncounterId) -> Result<&mut Encounter, CombatError> {
        self.encounters
            .get_mut(&id)
            .ok_or(CombatError::UnknownEncounter(id))
    }

    pub fn status(&self, id: EncounterId) -> Result<EncounterStatus, CombatError> {
        Ok(self.encounter(id)?.status())
    }

    /// Release an encounter, handing back its final state. The handle is
    /// invalid afterwards.
    pub fn end_encounter(&mut self, id: EncounterId) -> Result<Encounter, CombatError> {
        self.encounters
            .remove(&id)
            .ok_or(CombatError::UnknownEncounter(id))
    }

    pub fn active_encounters(&self) -> usize {
        self.encounters.values().filter(|e| e.is_active()).count()
    }
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::new(CombatRules::default(), RngDice::thread())
    }
}
