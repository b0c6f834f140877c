//! Resolved combat actions.
//!
//! A [`CombatAction`] is the immutable record of one actor's turn. It is
//! handed to the narration collaborator and then discarded.

use crate::character::Character;
use crate::encounter::CombatantId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    MeleeAttack,
    MagicAttack,
    Heal,
    Defend,
    Flee,
}

impl ActionType {
    pub fn name(&self) -> &'static str {
        match self {
            ActionType::MeleeAttack => "MELEE_ATTACK",
            ActionType::MagicAttack => "MAGIC_ATTACK",
            ActionType::Heal => "HEAL",
            ActionType::Defend => "DEFEND",
            ActionType::Flee => "FLEE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Snapshot of a participant as it stood when the action resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: CombatantId,
    pub name: String,
    pub current_health: i32,
    pub max_health: i32,
}

impl Participant {
    pub fn capture(id: CombatantId, character: &Character) -> Self {
        Self {
            id,
            name: character.name.clone(),
            current_health: character.current_health(),
            max_health: character.max_health(),
        }
    }
}

/// The outcome of one resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatAction {
    pub attacker: Participant,
    pub target: Participant,
    pub action_type: ActionType,
    pub damage_dealt: i32,
    pub healing_done: i32,
    pub is_hit: bool,
    /// Reserved. No resolution path sets it.
    pub is_critical: bool,
    /// Natural d20 for melee attacks, 0 otherwise.
    pub attack_roll: i32,
    /// Target defense for melee attacks, the actor's new defense for
    /// Defend, 0 otherwise.
    pub defense_value: i32,
    /// Whether the target halved an incoming spell.
    pub resisted: bool,
    /// The companion's stated reason, if one was given.
    pub reason: Option<String>,
}

impl CombatAction {
    fn base(attacker: Participant, target: Participant, action_type: ActionType) -> Self {
        Self {
            attacker,
            target,
            action_type,
            damage_dealt: 0,
            healing_done: 0,
            is_hit: false,
            is_critical: false,
            attack_roll: 0,
            defense_value: 0,
            resisted: false,
            reason: None,
        }
    }

    pub fn melee_attack(
        attacker: Participant,
        target: Participant,
        attack_roll: i32,
        defense_value: i32,
        damage_dealt: i32,
        is_hit: bool,
    ) -> Self {
        Self {
            attack_roll,
            defense_value,
            damage_dealt,
            is_hit,
            ..Self::base(attacker, target, ActionType::MeleeAttack)
        }
    }

    /// Magic attacks always hit.
    pub fn magic_attack(
        attacker: Participant,
        target: Participant,
        damage_dealt: i32,
        resisted: bool,
    ) -> Self {
        Self {
            damage_dealt,
            resisted,
            is_hit: true,
            ..Self::base(attacker, target, ActionType::MagicAttack)
        }
    }

    pub fn heal(healer: Participant, target: Participant, healing_done: i32) -> Self {
        Self {
            healing_done,
            ..Self::base(healer, target, ActionType::Heal)
        }
    }

    pub fn defend(defender: Participant, new_defense: i32) -> Self {
        let target = defender.clone();
        Self {
            defense_value: new_defense,
            ..Self::base(defender, target, ActionType::Defend)
        }
    }

    pub fn flee(leader: Participant) -> Self {
        let target = leader.clone();
        Self::base(leader, target, ActionType::Flee)
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    /// Plain-text block describing the action for a narration collaborator.
    pub fn narration_context(&self) -> String {
        let mut context = format!(
            "Attacker: {}\n\
             Target: {}\n\
             Action: {}\n\
             Hit: {}\n\
             Damage dealt: {}\n\
             Healing done: {}\n\
             Attack roll: {}\n\
             Target defense: {}\n\
             Target remaining HP: {}/{}\n",
            self.attacker.name,
            self.target.name,
            self.action_type,
            self.is_hit,
            self.damage_dealt,
            self.healing_done,
            self.attack_roll,
            self.defense_value,
            self.target.current_health,
            self.target.max_health,
        );
        if self.resisted {
            context.push_str("The target resisted, halving the damage.\n");
        }
        if let Some(reason) = &self.reason {
            context.push_str(&format!("Stated reason: {reason}\n"));
        }
        context.push_str("\nNarrate this combat action vividly.");
        context
    }

    /// One-line mechanical description, used when narration is unavailable.
    pub fn summary(&self) -> String {
        let attacker = &self.attacker.name;
        let target = &self.target.name;
        let hp = format!(
            "{}/{}",
            self.target.current_health, self.target.max_health
        );

        match self.action_type {
            ActionType::MeleeAttack if self.is_hit => format!(
                "{attacker} hits {target} (roll {} vs defense {}) for {} damage. {target} HP: {hp}",
                self.attack_roll, self.defense_value, self.damage_dealt
            ),
            ActionType::MeleeAttack => format!(
                "{attacker} misses {target} (roll {} vs defense {}).",
                self.attack_roll, self.defense_value
            ),
            ActionType::MagicAttack => format!(
                "{attacker} blasts {target} with magic for {} damage{}. {target} HP: {hp}",
                self.damage_dealt,
                if self.resisted { " (resisted)" } else { "" }
            ),
            ActionType::Heal => format!(
                "{attacker} heals {target} for {}. {target} HP: {hp}",
                self.healing_done
            ),
            ActionType::Defend => format!(
                "{attacker} takes a defensive stance (defense {}).",
                self.defense_value
            ),
            ActionType::Flee => format!("{attacker} leads the party in retreat."),
        }
    }
}

impl fmt::Display for CombatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
