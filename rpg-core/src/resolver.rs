//! Single-turn action resolution.
//!
//! The resolver takes one living actor, decides what it does, rolls the dice
//! and mutates the encounter in place. Targeting policy is a closed match on
//! the actor's [`Role`]:
//!
//! - heroes strike the opponent with the most remaining health,
//! - enemies strike a random living party member,
//! - companions ask a [`DecisionSource`] and act on the parsed intent.
//!
//! Everything that can go wrong at the collaborator boundary (unparseable
//! text, unknown target names, a dead target, too little mana) degrades to a
//! defined fallback action. Only caller misuse is reported as an error.

use crate::action::{CombatAction, Participant};
use crate::character::Role;
use crate::collaborators::{decision_prompt, DecisionSource};
use crate::dice::{DiceRoller, DieType};
use crate::encounter::{CombatError, CombatantId, Encounter, Side};
use crate::intent::{parse_decision, DecisionIntent, DecisionKind};
use crate::rules::CombatRules;

/// Resolves turns against a fixed rule set.
#[derive(Debug, Clone, Copy)]
pub struct ActionResolver<'a> {
    rules: &'a CombatRules,
}

impl<'a> ActionResolver<'a> {
    pub fn new(rules: &'a CombatRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &CombatRules {
        self.rules
    }

    /// Resolve one actor's turn.
    ///
    /// The actor must be alive; the round orchestrator skips dead actors and
    /// asking for one anyway is reported as [`CombatError::ActorDown`].
    pub fn resolve_turn(
        &self,
        actor: CombatantId,
        encounter: &mut Encounter,
        decisions: &mut dyn DecisionSource,
        dice: &mut dyn DiceRoller,
    ) -> Result<CombatAction, CombatError> {
        let character = encounter.character(actor)?;
        if !character.is_alive() {
            return Err(CombatError::ActorDown(character.name.clone()));
        }
        let side = encounter
            .side_of(actor)
            .ok_or(CombatError::UnknownCombatant(actor))?;

        let action = match &character.role {
            Role::Hero(_) => {
                let target = strongest(encounter, side.opposing());
                self.execute_attack(actor, target, encounter, dice)?
            }
            Role::Enemy(_) => {
                let target = random_living(encounter, side.opposing(), dice);
                self.execute_attack(actor, target, encounter, dice)?
            }
            Role::Companion(_) => {
                let prompt = decision_prompt(character, encounter);
                let name = character.name.clone();
                let decision = decisions
                    .decide(character, &prompt)
                    .map_err(|e| e.to_string())
                    .and_then(|text| {
                        parse_decision(&text).map_err(|e| format!("{e} in {text:?}"))
                    });

                match decision {
                    Ok(intent) => self.execute_intent(actor, side, intent, encounter, dice)?,
                    Err(reason) => {
                        tracing::warn!(
                            "No usable decision from {}: {}; attacking a random enemy",
                            name,
                            reason
                        );
                        self.execute_attack(actor, None, encounter, dice)?
                    }
                }
            }
        };

        tracing::debug!(
            "{} -> {}: {} (roll {}, damage {}, healing {})",
            action.attacker.name,
            action.target.name,
            action.action_type,
            action.attack_roll,
            action.damage_dealt,
            action.healing_done
        );
        Ok(action)
    }

    fn execute_intent(
        &self,
        actor: CombatantId,
        side: Side,
        intent: DecisionIntent,
        encounter: &mut Encounter,
        dice: &mut dyn DiceRoller,
    ) -> Result<CombatAction, CombatError> {
        let action = match intent.kind {
            DecisionKind::Attack => {
                let target = encounter.find_living_by_name(side.opposing(), &intent.target);
                self.execute_attack(actor, target, encounter, dice)?
            }
            DecisionKind::Heal => {
                let target = encounter
                    .find_living_by_name(side, &intent.target)
                    .unwrap_or(actor);
                self.execute_heal(actor, target, encounter, dice)?
            }
            DecisionKind::Defend => self.execute_defend(actor, encounter)?,
        };
        Ok(action.with_reason(intent.reason))
    }

    /// Attack `target`, or a random living opponent when the target is
    /// missing or already down. Intelligent casters with enough mana use
    /// magic; everyone else swings.
    pub fn execute_attack(
        &self,
        actor: CombatantId,
        target: Option<CombatantId>,
        encounter: &mut Encounter,
        dice: &mut dyn DiceRoller,
    ) -> Result<CombatAction, CombatError> {
        let target = match target.filter(|id| encounter.get(*id).is_some_and(|c| c.is_alive())) {
            Some(id) => id,
            None => {
                let side = encounter
                    .side_of(actor)
                    .ok_or(CombatError::UnknownCombatant(actor))?;
                random_living(encounter, side.opposing(), dice).ok_or_else(|| {
                    CombatError::NoLivingTarget(
                        encounter.get(actor).map(|c| c.name.clone()).unwrap_or_default(),
                    )
                })?
            }
        };

        let attacker = encounter.character(actor)?;
        let casts = attacker.attributes.intelligence > attacker.attributes.strength
            && attacker.current_mana() >= self.rules.magic_mana_cost;

        if casts {
            self.execute_magic(actor, target, encounter, dice)
        } else {
            self.execute_melee(actor, target, encounter, dice)
        }
    }

    /// `d20 + STR` against the target's defense. A hit deals
    /// `max(1, STR + weapon + d6)`.
    pub fn execute_melee(
        &self,
        actor: CombatantId,
        target: CombatantId,
        encounter: &mut Encounter,
        dice: &mut dyn DiceRoller,
    ) -> Result<CombatAction, CombatError> {
        let attacker = encounter.character(actor)?;
        let strength = attacker.strength_modifier();
        let weapon = attacker.weapon_bonus;
        let defense = encounter.character(target)?.defense();

        let attack_roll = roll(dice, self.rules.attack_die);
        let is_hit = attack_roll + strength >= defense;
        let damage = if is_hit {
            (strength + weapon + roll(dice, self.rules.melee_damage_die)).max(1)
        } else {
            0
        };
        encounter.character_mut(target)?.take_damage(damage);

        Ok(CombatAction::melee_attack(
            snapshot(encounter, actor)?,
            snapshot(encounter, target)?,
            attack_roll,
            defense,
            damage,
            is_hit,
        ))
    }

    /// Spend mana for an automatic hit of `max(1, INT + d8)`, halved when the
    /// target's `d20 + INT` beats the resist threshold.
    pub fn execute_magic(
        &self,
        actor: CombatantId,
        target: CombatantId,
        encounter: &mut Encounter,
        dice: &mut dyn DiceRoller,
    ) -> Result<CombatAction, CombatError> {
        let attacker = encounter.character_mut(actor)?;
        attacker.use_mana(self.rules.magic_mana_cost);
        let intelligence = attacker.intelligence_modifier();

        let mut damage = (intelligence + roll(dice, self.rules.magic_damage_die)).max(1);
        let resist = roll(dice, DieType::D20) + encounter.character(target)?.intelligence_modifier();
        let resisted = resist > self.rules.resist_threshold;
        if resisted {
            damage /= 2;
        }
        encounter.character_mut(target)?.take_damage(damage);

        Ok(CombatAction::magic_attack(
            snapshot(encounter, actor)?,
            snapshot(encounter, target)?,
            damage,
            resisted,
        ))
    }

    /// Heal `target` for `INT + d8`. Without enough mana the healer swings
    /// at the same target instead.
    pub fn execute_heal(
        &self,
        actor: CombatantId,
        target: CombatantId,
        encounter: &mut Encounter,
        dice: &mut dyn DiceRoller,
    ) -> Result<CombatAction, CombatError> {
        let healer = encounter.character_mut(actor)?;
        if !healer.use_mana(self.rules.heal_mana_cost) {
            tracing::debug!("{} lacks mana to heal; attacking instead", healer.name);
            return self.execute_melee(actor, target, encounter, dice);
        }

        let healing = (healer.intelligence_modifier() + roll(dice, self.rules.heal_die)).max(0);
        encounter.character_mut(target)?.heal(healing);

        Ok(CombatAction::heal(
            snapshot(encounter, actor)?,
            snapshot(encounter, target)?,
            healing,
        ))
    }

    /// Brace for impact. The armor bonus lasts for the rest of the encounter.
    pub fn execute_defend(
        &self,
        actor: CombatantId,
        encounter: &mut Encounter,
    ) -> Result<CombatAction, CombatError> {
        let defender = encounter.character_mut(actor)?;
        defender.armor_bonus += self.rules.defend_armor_bonus;
        let defense = defender.defense();

        Ok(CombatAction::defend(snapshot(encounter, actor)?, defense))
    }
}

fn roll(dice: &mut dyn DiceRoller, die: DieType) -> i32 {
    dice.roll(die) as i32
}

fn snapshot(encounter: &Encounter, id: CombatantId) -> Result<Participant, CombatError> {
    Ok(Participant::capture(id, encounter.character(id)?))
}

/// Living member of `side` with the most current health; the earliest in
/// list order wins ties.
fn strongest(encounter: &Encounter, side: Side) -> Option<CombatantId> {
    let mut best: Option<(CombatantId, i32)> = None;
    for id in encounter.living(side) {
        let health = encounter.get(id).map_or(0, |c| c.current_health());
        if best.map_or(true, |(_, top)| health > top) {
            best = Some((id, health));
        }
    }
    best.map(|(id, _)| id)
}

fn random_living(encounter: &Encounter, side: Side, dice: &mut dyn DiceRoller) -> Option<CombatantId> {
    let living = encounter.living(side);
    if living.is_empty() {
        return None;
    }
    Some(living[dice.pick(living.len())])
}
