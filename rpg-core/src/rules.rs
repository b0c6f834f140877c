//! Mechanical constants for combat resolution.
//!
//! Defaults reproduce the stock ruleset. A campaign can override them from a
//! JSON document or from `RPG_*` environment variables.

use crate::dice::DieType;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rules document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Tunable combat constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Mana spent by a magic attack. Also the minimum mana needed to choose one.
    pub magic_mana_cost: i32,
    /// Mana spent by a heal.
    pub heal_mana_cost: i32,
    /// A resist roll strictly above this halves magic damage.
    pub resist_threshold: i32,
    /// Armor bonus gained each time a companion defends.
    pub defend_armor_bonus: i32,
    /// Experience awarded to the lead hero per enemy on victory.
    pub experience_per_enemy: u32,
    /// Maximum number of companions travelling with the hero.
    pub max_team_size: usize,
    pub attack_die: DieType,
    pub melee_damage_die: DieType,
    pub magic_damage_die: DieType,
    pub heal_die: DieType,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            magic_mana_cost: 10,
            heal_mana_cost: 15,
            resist_threshold: 15,
            defend_armor_bonus: 2,
            experience_per_enemy: 50,
            max_team_size: 3,
            attack_die: DieType::D20,
            melee_damage_die: DieType::D6,
            magic_damage_die: DieType::D8,
            heal_die: DieType::D8,
        }
    }
}

impl CombatRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON rules document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, RulesError> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()
    }

    /// Load a JSON rules document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Defaults with `RPG_*` environment overrides applied.
    pub fn from_env() -> Result<Self, RulesError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value lookup (environment, CLI flags).
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, RulesError> {
        override_from(&lookup, "RPG_MAGIC_MANA_COST", &mut self.magic_mana_cost)?;
        override_from(&lookup, "RPG_HEAL_MANA_COST", &mut self.heal_mana_cost)?;
        override_from(&lookup, "RPG_RESIST_THRESHOLD", &mut self.resist_threshold)?;
        override_from(&lookup, "RPG_DEFEND_ARMOR_BONUS", &mut self.defend_armor_bonus)?;
        override_from(&lookup, "RPG_EXPERIENCE_PER_ENEMY", &mut self.experience_per_enemy)?;
        override_from(&lookup, "RPG_MAX_TEAM_SIZE", &mut self.max_team_size)?;
        override_from(&lookup, "RPG_ATTACK_DIE", &mut self.attack_die)?;
        override_from(&lookup, "RPG_MELEE_DAMAGE_DIE", &mut self.melee_damage_die)?;
        override_from(&lookup, "RPG_MAGIC_DAMAGE_DIE", &mut self.magic_damage_die)?;
        override_from(&lookup, "RPG_HEAL_DIE", &mut self.heal_die)?;
        self.validate()
    }

    pub fn validate(self) -> Result<Self, RulesError> {
        if self.magic_mana_cost <= 0 {
            return Err(invalid("magic_mana_cost", self.magic_mana_cost));
        }
        if self.heal_mana_cost <= 0 {
            return Err(invalid("heal_mana_cost", self.heal_mana_cost));
        }
        if self.max_team_size == 0 {
            return Err(invalid("max_team_size", self.max_team_size));
        }
        Ok(self)
    }

    pub fn with_magic_mana_cost(mut self, cost: i32) -> Self {
        self.magic_mana_cost = cost;
        self
    }

    pub fn with_heal_mana_cost(mut self, cost: i32) -> Self {
        self.heal_mana_cost = cost;
        self
    }

    pub fn with_resist_threshold(mut self, threshold: i32) -> Self {
        self.resist_threshold = threshold;
        self
    }

    pub fn with_defend_armor_bonus(mut self, bonus: i32) -> Self {
        self.defend_armor_bonus = bonus;
        self
    }

    pub fn with_experience_per_enemy(mut self, experience: u32) -> Self {
        self.experience_per_enemy = experience;
        self
    }

    pub fn with_max_team_size(mut self, size: usize) -> Self {
        self.max_team_size = size;
        self
    }
}

fn override_from<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) -> Result<(), RulesError> {
    if let Some(raw) = lookup(key) {
        *slot = raw.trim().parse().map_err(|_| RulesError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}

fn invalid(key: &str, value: impl ToString) -> RulesError {
    RulesError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let rules = CombatRules::default();
        assert_eq!(rules.magic_mana_cost, 10);
        assert_eq!(rules.heal_mana_cost, 15);
        assert_eq!(rules.resist_threshold, 15);
        assert_eq!(rules.defend_armor_bonus, 2);
        assert_eq!(rules.experience_per_enemy, 50);
        assert_eq!(rules.melee_damage_die, DieType::D6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let rules = CombatRules::from_json_str(r#"{"heal_mana_cost": 20, "melee_damage_die": "d8"}"#).unwrap();
        assert_eq!(rules.heal_mana_cost, 20);
        assert_eq!(rules.melee_damage_die, DieType::D8);
        assert_eq!(rules.magic_mana_cost, 10);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            CombatRules::from_json_str("{not json"),
            Err(RulesError::Parse(_))
        ));
        assert!(matches!(
            CombatRules::from_json_str(r#"{"magic_mana_cost": 0}"#),
            Err(RulesError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RPG_EXPERIENCE_PER_ENEMY", "75"),
            ("RPG_MAX_TEAM_SIZE", " 5 "),
            ("RPG_MELEE_DAMAGE_DIE", "1d8"),
        ]);
        let rules = CombatRules::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(rules.experience_per_enemy, 75);
        assert_eq!(rules.max_team_size, 5);
        assert_eq!(rules.melee_damage_die, DieType::D8);
        assert_eq!(rules.heal_mana_cost, 15);
    }

    #[test]
    fn test_bad_override() {
        let result = CombatRules::default().with_overrides(|key| {
            (key == "RPG_HEAL_MANA_COST").then(|| "lots".to_string())
        });
        match result {
            Err(RulesError::InvalidValue { key, value }) => {
                assert_eq!(key, "RPG_HEAL_MANA_COST");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_builder() {
        let rules = CombatRules::new()
            .with_defend_armor_bonus(3)
            .with_resist_threshold(12)
            .with_magic_mana_cost(5)
            .with_heal_mana_cost(8)
            .with_experience_per_enemy(10)
            .with_max_team_size(1);
        assert_eq!(rules.defend_armor_bonus, 3);
        assert_eq!(rules.resist_threshold, 12);
        assert!(rules.validate().is_ok());
    }
}
