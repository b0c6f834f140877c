//! Round orchestration.
//!
//! One round lets every living combatant act once: the party in list order,
//! then the enemies in list order. Termination is checked only after the
//! round, victory before defeat.

use crate::action::CombatAction;
use crate::collaborators::DecisionSource;
use crate::dice::DiceRoller;
use crate::encounter::{CombatError, Encounter, EncounterStatus, Side};
use crate::resolver::ActionResolver;
use crate::rules::CombatRules;
use serde::{Deserialize, Serialize};

/// Something the owner of an encounter may need to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterEvent {
    /// The enemies were wiped out; `experience` went to the lead hero.
    Victory { hero: String, experience: u32 },
    LevelUp { hero: String, level: u32 },
    /// The whole party is down. The owning session is over.
    Defeat,
    Fled,
}

/// Everything that happened in one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    /// Turn number the round was played on.
    pub turn: u32,
    /// Resolved actions in acting order.
    pub actions: Vec<CombatAction>,
    /// Encounter status after the round.
    pub status: EncounterStatus,
    pub events: Vec<EncounterEvent>,
}

impl RoundReport {
    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }
}

pub struct RoundOrchestrator<'a> {
    resolver: ActionResolver<'a>,
}

impl<'a> RoundOrchestrator<'a> {
    pub fn new(rules: &'a CombatRules) -> Self {
        Self {
            resolver: ActionResolver::new(rules),
        }
    }

    /// Play one full round.
    ///
    /// Dice are consumed in acting order, so a fixed roll sequence always
    /// replays the same round. Once a side has nobody left standing, the
    /// remaining actors of the other side stand down for the rest of the
    /// round.
    pub fn execute_round(
        &self,
        encounter: &mut Encounter,
        decisions: &mut dyn DecisionSource,
        dice: &mut dyn DiceRoller,
    ) -> Result<RoundReport, CombatError> {
        if !encounter.is_active() {
            return Err(CombatError::EncounterOver(encounter.status()));
        }

        let turn = encounter.current_turn();
        let mut actions = Vec::new();

        for side in [Side::Party, Side::Enemies] {
            for actor in encounter.ids(side).to_vec() {
                if !encounter.has_living(side.opposing()) {
                    break;
                }
                if !encounter.character(actor)?.is_alive() {
                    continue;
                }
                actions.push(self.resolver.resolve_turn(actor, encounter, decisions, dice)?);
            }
        }

        let mut events = Vec::new();
        if encounter.all_enemies_defeated() {
            if encounter.end_with_victory() {
                events = award_victory(encounter, self.resolver.rules());
            }
        } else if encounter.is_party_defeated() {
            if encounter.end_with_defeat() {
                tracing::info!("Party defeated at {}", encounter.location());
                events.push(EncounterEvent::Defeat);
            }
        } else {
            encounter.advance_turn();
        }

        Ok(RoundReport {
            turn,
            actions,
            status: encounter.status(),
            events,
        })
    }
}

/// Grant the lead hero experience for every enemy in the encounter.
///
/// Only call this right after a successful victory transition; gating on
/// that transition is what keeps the award from being paid twice.
fn award_victory(encounter: &mut Encounter, rules: &CombatRules) -> Vec<EncounterEvent> {
    let mut events = Vec::new();
    let enemies = u32::try_from(encounter.enemy_ids().len()).unwrap_or(u32::MAX);
    let experience = rules.experience_per_enemy.saturating_mul(enemies);

    let Some(lead) = encounter.lead() else {
        tracing::info!("Victory at {} with no hero to reward", encounter.location());
        return events;
    };
    let Some(hero) = encounter.get_mut(lead) else {
        return events;
    };

    let name = hero.name.clone();
    tracing::info!("Victory! {} gains {} experience", name, experience);
    let level_up = hero.gain_experience(experience);

    events.push(EncounterEvent::Victory {
        hero: name.clone(),
        experience,
    });
    if let Some(level) = level_up {
        tracing::info!("{} reached level {}", name, level);
        events.push(EncounterEvent::LevelUp { hero: name, level });
    }
    events
}
