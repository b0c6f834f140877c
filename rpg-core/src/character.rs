//! Characters and their combat-relevant attributes.
//!
//! A [`Character`] carries the shared attribute payload (five core scores,
//! health and mana pools, armor and weapon bonuses) plus a [`Role`] that
//! says who controls it: the player's hero, a hostile NPC, or an
//! autonomous companion.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Attributes
// ============================================================================

/// The five core attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Intelligence,
    Agility,
    Constitution,
    Charisma,
}

impl Attribute {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Intelligence => "INT",
            Attribute::Agility => "AGI",
            Attribute::Constitution => "CON",
            Attribute::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Modifier for a raw attribute score: `(score - 10) / 2`.
///
/// Division truncates toward zero, so a score of 9 gives 0 and a score of
/// 7 gives -1.
pub fn modifier(score: i32) -> i32 {
    (score - 10) / 2
}

/// Attribute scores container. Scores are typically in `3..=18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub intelligence: i32,
    pub agility: i32,
    pub constitution: i32,
    pub charisma: i32,
}

impl Attributes {
    pub fn new(str: i32, int: i32, agi: i32, con: i32, cha: i32) -> Self {
        Self {
            strength: str,
            intelligence: int,
            agility: agi,
            constitution: con,
            charisma: cha,
        }
    }

    /// Every score set to the same value.
    pub fn uniform(score: i32) -> Self {
        Self::new(score, score, score, score, score)
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Intelligence => self.intelligence,
            Attribute::Agility => self.agility,
            Attribute::Constitution => self.constitution,
            Attribute::Charisma => self.charisma,
        }
    }

    pub fn modifier(&self, attribute: Attribute) -> i32 {
        modifier(self.get(attribute))
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::uniform(10)
    }
}

// ============================================================================
// Resource pools
// ============================================================================

/// A bounded resource such as health or mana.
///
/// Invariant: `0 <= current <= maximum`. Negative amounts passed to the
/// mutators are treated as no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    current: i32,
    maximum: i32,
}

impl Pool {
    /// A full pool. Negative maxima are raised to zero.
    pub fn new(maximum: i32) -> Self {
        let maximum = maximum.max(0);
        Self {
            current: maximum,
            maximum,
        }
    }

    /// A pool with an explicit current value, clamped into range.
    pub fn with_current(current: i32, maximum: i32) -> Self {
        let maximum = maximum.max(0);
        Self {
            current: current.clamp(0, maximum),
            maximum,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn maximum(&self) -> i32 {
        self.maximum
    }

    /// Remove up to `amount`, returning how much was actually removed.
    pub fn drain(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let old = self.current;
        self.current = (self.current - amount).max(0);
        old - self.current
    }

    /// Add up to `amount`, returning how much was actually added.
    pub fn fill(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let old = self.current;
        self.current = self.current.saturating_add(amount).min(self.maximum);
        self.current - old
    }

    /// Remove exactly `amount` if available; otherwise leave the pool alone.
    pub fn spend(&mut self, amount: i32) -> bool {
        if amount < 0 || self.current < amount {
            return false;
        }
        self.current -= amount;
        true
    }

    /// Raise the maximum and refill to it.
    pub fn grow_and_refill(&mut self, amount: i32) {
        self.maximum = self.maximum.saturating_add(amount).max(0);
        self.current = self.maximum;
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Experience needed per level before the hero advances.
pub const EXPERIENCE_PER_LEVEL: u32 = 100;

/// Loyalty below which a companion is considered likely to leave.
pub const LOYALTY_FLIGHT_THRESHOLD: u8 = 20;

/// Starting loyalty for a freshly recruited companion.
pub const STARTING_LOYALTY: u8 = 50;

/// The player-controlled lead character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroProfile {
    pub class: String,
    pub level: u32,
    pub experience: u32,
}

/// A hostile, rule-driven combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyProfile {
    /// e.g. "Guard", "Wizard", "Merchant"
    pub role: String,
    pub hostile: bool,
}

/// An autonomous party member whose combat choices come from a decision
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionProfile {
    pub class: String,
    pub personality: String,
    pub backstory: String,
    /// 0-100
    pub loyalty: u8,
}

/// Who controls a character, and therefore how it picks targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Hero(HeroProfile),
    Enemy(EnemyProfile),
    Companion(CompanionProfile),
}

impl Role {
    /// Class or role label used in prompts and narration.
    pub fn label(&self) -> &str {
        match self {
            Role::Hero(h) => &h.class,
            Role::Enemy(e) => &e.role,
            Role::Companion(c) => &c.class,
        }
    }
}

/// Starting attribute layout for a class or role.
struct Preset {
    attributes: Attributes,
    armor_bonus: i32,
    weapon_bonus: i32,
}

impl Preset {
    fn plain(str: i32, int: i32, agi: i32, con: i32, cha: i32) -> Self {
        Self {
            attributes: Attributes::new(str, int, agi, con, cha),
            armor_bonus: 0,
            weapon_bonus: 0,
        }
    }

    fn with_bonuses(mut self, armor_bonus: i32, weapon_bonus: i32) -> Self {
        self.armor_bonus = armor_bonus;
        self.weapon_bonus = weapon_bonus;
        self
    }

    fn hero(class: &str) -> Self {
        match class.to_lowercase().as_str() {
            "warrior" => Self::plain(16, 10, 12, 14, 10).with_bonuses(0, 2),
            "mage" => Self::plain(8, 16, 10, 10, 14),
            "rogue" => Self::plain(10, 12, 16, 10, 14),
            "bard" => Self::plain(10, 14, 12, 12, 16),
            _ => Self::plain(12, 12, 12, 12, 12),
        }
    }

    fn enemy(role: &str) -> Self {
        match role.to_lowercase().as_str() {
            "guard" | "warrior" => Self::plain(14, 10, 12, 14, 10).with_bonuses(2, 1),
            "wizard" | "mage" => Self::plain(8, 16, 10, 10, 12),
            "merchant" => Self::plain(10, 12, 10, 10, 16),
            _ => Self::plain(10, 10, 10, 10, 10),
        }
    }

    fn companion(class: &str) -> Self {
        match class.to_lowercase().as_str() {
            "warrior" | "fighter" => Self::plain(15, 10, 12, 14, 10).with_bonuses(1, 2),
            "mage" | "wizard" => Self::plain(8, 16, 10, 10, 12),
            "healer" | "cleric" => Self::plain(10, 14, 10, 12, 14),
            "rogue" | "archer" => Self::plain(10, 12, 16, 10, 12),
            "bard" => Self::plain(10, 14, 12, 12, 16),
            _ => Self::plain(12, 12, 12, 12, 12),
        }
    }
}

// ============================================================================
// Character
// ============================================================================

/// A combat participant.
///
/// Constructed once per participant at setup and mutated in place by the
/// resolver; never rebuilt mid-encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub attributes: Attributes,
    health: Pool,
    mana: Pool,
    pub armor_bonus: i32,
    pub weapon_bonus: i32,
    pub role: Role,
}

impl Character {
    /// Create a character with derived stats initialized from its attributes.
    pub fn new(name: impl Into<String>, attributes: Attributes, role: Role) -> Self {
        let mut character = Self {
            name: name.into(),
            attributes,
            health: Pool::new(0),
            mana: Pool::new(0),
            armor_bonus: 0,
            weapon_bonus: 0,
            role,
        };
        character.initialize_derived_stats();
        character
    }

    /// A level 1 hero using the class's starting layout.
    pub fn hero(name: impl Into<String>, class: impl Into<String>) -> Self {
        let class = class.into();
        let preset = Preset::hero(&class);
        Self::from_preset(
            name,
            preset,
            Role::Hero(HeroProfile {
                class,
                level: 1,
                experience: 0,
            }),
        )
    }

    /// A hostile NPC using the role's starting layout.
    pub fn enemy(name: impl Into<String>, role: impl Into<String>) -> Self {
        let role = role.into();
        let preset = Preset::enemy(&role);
        Self::from_preset(
            name,
            preset,
            Role::Enemy(EnemyProfile {
                role,
                hostile: true,
            }),
        )
    }

    /// A companion at neutral loyalty using the class's starting layout.
    pub fn companion(
        name: impl Into<String>,
        class: impl Into<String>,
        personality: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        let class = class.into();
        let preset = Preset::companion(&class);
        Self::from_preset(
            name,
            preset,
            Role::Companion(CompanionProfile {
                class,
                personality: personality.into(),
                backstory: backstory.into(),
                loyalty: STARTING_LOYALTY,
            }),
        )
    }

    fn from_preset(name: impl Into<String>, preset: Preset, role: Role) -> Self {
        Self::new(name, preset.attributes, role).with_bonuses(preset.armor_bonus, preset.weapon_bonus)
    }

    pub fn with_bonuses(mut self, armor_bonus: i32, weapon_bonus: i32) -> Self {
        self.armor_bonus = armor_bonus;
        self.weapon_bonus = weapon_bonus;
        self
    }

    pub fn with_health(mut self, current: i32, maximum: i32) -> Self {
        self.health = Pool::with_current(current, maximum);
        self
    }

    pub fn with_mana(mut self, current: i32, maximum: i32) -> Self {
        self.mana = Pool::with_current(current, maximum);
        self
    }

    /// `maxHealth = CON * 10`, `maxMana = INT * 5`, both refilled.
    pub fn initialize_derived_stats(&mut self) {
        self.health = Pool::new(self.attributes.constitution * 10);
        self.mana = Pool::new(self.attributes.intelligence * 5);
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    pub fn modifier(&self, attribute: Attribute) -> i32 {
        self.attributes.modifier(attribute)
    }

    pub fn strength_modifier(&self) -> i32 {
        self.modifier(Attribute::Strength)
    }

    pub fn intelligence_modifier(&self) -> i32 {
        self.modifier(Attribute::Intelligence)
    }

    pub fn agility_modifier(&self) -> i32 {
        self.modifier(Attribute::Agility)
    }

    /// `10 + AGI modifier + armor bonus`
    pub fn defense(&self) -> i32 {
        10 + self.agility_modifier() + self.armor_bonus
    }

    pub fn is_alive(&self) -> bool {
        self.health.current() > 0
    }

    pub fn current_health(&self) -> i32 {
        self.health.current()
    }

    pub fn max_health(&self) -> i32 {
        self.health.maximum()
    }

    pub fn current_mana(&self) -> i32 {
        self.mana.current()
    }

    pub fn max_mana(&self) -> i32 {
        self.mana.maximum()
    }

    pub fn health(&self) -> &Pool {
        &self.health
    }

    pub fn mana(&self) -> &Pool {
        &self.mana
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Reduce health, never below zero. Returns the health actually lost.
    /// Negative amounts do nothing.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health.drain(amount)
    }

    /// Restore health, never above maximum. Returns the health actually
    /// restored. Negative amounts do nothing.
    pub fn heal(&mut self, amount: i32) -> i32 {
        self.health.fill(amount)
    }

    /// Deduct mana iff at least `amount` is available.
    pub fn use_mana(&mut self, amount: i32) -> bool {
        self.mana.spend(amount)
    }

    /// Restore mana, never above maximum. Negative amounts do nothing.
    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        self.mana.fill(amount)
    }

    // ------------------------------------------------------------------
    // Role-specific
    // ------------------------------------------------------------------

    pub fn is_hero(&self) -> bool {
        matches!(self.role, Role::Hero(_))
    }

    pub fn is_companion(&self) -> bool {
        matches!(self.role, Role::Companion(_))
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.role, Role::Enemy(_))
    }

    pub fn level(&self) -> Option<u32> {
        match &self.role {
            Role::Hero(h) => Some(h.level),
            _ => None,
        }
    }

    /// Award experience to a hero. At most one level is gained per award,
    /// when experience reaches `level * 100`; the new level is returned.
    /// Non-heroes ignore experience.
    pub fn gain_experience(&mut self, amount: u32) -> Option<u32> {
        let Role::Hero(profile) = &mut self.role else {
            return None;
        };

        profile.experience = profile.experience.saturating_add(amount);
        if profile.experience < profile.level.saturating_mul(EXPERIENCE_PER_LEVEL) {
            return None;
        }

        profile.level = profile.level.saturating_add(1);
        let level = profile.level;
        self.health.grow_and_refill(10);
        self.mana.grow_and_refill(5);
        Some(level)
    }

    pub fn loyalty(&self) -> Option<u8> {
        match &self.role {
            Role::Companion(c) => Some(c.loyalty),
            _ => None,
        }
    }

    /// Shift a companion's loyalty, clamped to `0..=100`. Returns the new
    /// value, or `None` for non-companions.
    pub fn adjust_loyalty(&mut self, delta: i32) -> Option<u8> {
        let Role::Companion(profile) = &mut self.role else {
            return None;
        };
        let loyalty = (profile.loyalty as i32 + delta).clamp(0, 100);
        profile.loyalty = loyalty as u8;
        Some(profile.loyalty)
    }

    pub fn is_likely_to_leave(&self) -> bool {
        self.loyalty()
            .is_some_and(|loyalty| loyalty < LOYALTY_FLIGHT_THRESHOLD)
    }

    /// Nudge loyalty from the tone of a companion's spoken reaction.
    ///
    /// Returns the loyalty delta applied (`+5`, `-5`, or `0`).
    pub fn react_to(&mut self, reaction: &str) -> i32 {
        if !self.is_companion() {
            return 0;
        }

        let delta = reaction_sentiment(reaction);
        if delta != 0 {
            self.adjust_loyalty(delta);
        }
        delta
    }
}

fn reaction_sentiment(reaction: &str) -> i32 {
    const POSITIVE: [&str; 3] = ["glad", "happy", "good"];
    const NEGATIVE: [&str; 4] = ["angry", "disagree", "wrong", "shouldn't"];

    let lower = reaction.to_lowercase();
    if POSITIVE.iter().any(|w| lower.contains(w)) {
        5
    } else if NEGATIVE.iter().any(|w| lower.contains(w)) {
        -5
    } else {
        0
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (HP: {}/{})",
            self.name,
            self.current_health(),
            self.max_health()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_truncates_toward_zero() {
        assert_eq!(modifier(10), 0);
        assert_eq!(modifier(11), 0);
        assert_eq!(modifier(14), 2);
        assert_eq!(modifier(18), 4);
        assert_eq!(modifier(9), 0);
        assert_eq!(modifier(8), -1);
        assert_eq!(modifier(7), -1);
        assert_eq!(modifier(3), -3);
    }

    #[test]
    fn test_defense() {
        let mut c = Character::new("Test", Attributes::new(10, 10, 14, 10, 10), Role::Enemy(EnemyProfile {
            role: "Bandit".to_string(),
            hostile: true,
        }));
        assert_eq!(c.defense(), 12);
        c.armor_bonus = 3;
        assert_eq!(c.defense(), 15);
    }

    #[test]
    fn test_derived_stats() {
        let c = Character::new("Test", Attributes::new(10, 12, 10, 14, 10), Role::Enemy(EnemyProfile {
            role: "Bandit".to_string(),
            hostile: true,
        }));
        assert_eq!(c.max_health(), 140);
        assert_eq!(c.current_health(), 140);
        assert_eq!(c.max_mana(), 60);
        assert_eq!(c.current_mana(), 60);
    }

    #[test]
    fn test_damage_and_heal_clamp() {
        let mut c = Character::enemy("Goblin", "Warrior").with_health(20, 30);

        assert_eq!(c.take_damage(5), 5);
        assert_eq!(c.current_health(), 15);

        assert_eq!(c.heal(100), 15);
        assert_eq!(c.current_health(), 30);

        assert_eq!(c.take_damage(45), 30);
        assert_eq!(c.current_health(), 0);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_negative_amounts_are_noops() {
        let mut c = Character::enemy("Goblin", "Warrior")
            .with_health(10, 30)
            .with_mana(10, 20);

        assert_eq!(c.take_damage(-5), 0);
        assert_eq!(c.heal(-5), 0);
        assert_eq!(c.restore_mana(-5), 0);
        assert!(!c.use_mana(-5));
        assert_eq!(c.current_health(), 10);
        assert_eq!(c.current_mana(), 10);
    }

    #[test]
    fn test_huge_amounts_saturate_at_maximum() {
        let mut c = Character::enemy("Snik", "Raider")
            .with_health(10, 30)
            .with_mana(5, 70);

        assert_eq!(c.heal(i32::MAX), 20);
        assert_eq!(c.current_health(), 30);
        assert_eq!(c.restore_mana(i32::MAX), 65);
        assert_eq!(c.current_mana(), 70);

        assert_eq!(c.take_damage(i32::MAX), 30);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_use_mana() {
        let mut c = Character::hero("Lyra", "Mage").with_mana(12, 80);

        assert!(c.use_mana(10));
        assert_eq!(c.current_mana(), 2);

        assert!(!c.use_mana(5));
        assert_eq!(c.current_mana(), 2);

        c.restore_mana(500);
        assert_eq!(c.current_mana(), 80);
    }

    #[test]
    fn test_hero_presets() {
        let warrior = Character::hero("Roland", "Warrior");
        assert_eq!(warrior.attributes, Attributes::new(16, 10, 12, 14, 10));
        assert_eq!(warrior.weapon_bonus, 2);
        assert_eq!(warrior.max_health(), 140);
        assert_eq!(warrior.level(), Some(1));

        let mage = Character::hero("Lyra", "MAGE");
        assert_eq!(mage.attributes.intelligence, 16);
        assert_eq!(mage.max_mana(), 80);

        let other = Character::hero("Pat", "Farmer");
        assert_eq!(other.attributes, Attributes::uniform(12));
    }

    #[test]
    fn test_enemy_presets() {
        let guard = Character::enemy("Gate Guard", "guard");
        assert_eq!(guard.armor_bonus, 2);
        assert_eq!(guard.weapon_bonus, 1);
        assert_eq!(guard.defense(), 13);

        let wizard = Character::enemy("Hedge Wizard", "Wizard");
        assert!(wizard.attributes.intelligence > wizard.attributes.strength);

        let rat = Character::enemy("Rat", "vermin");
        assert_eq!(rat.attributes, Attributes::uniform(10));
    }

    #[test]
    fn test_companion_presets() {
        let fighter = Character::companion("Bram", "Fighter", "gruff", "ex-soldier");
        assert_eq!(fighter.armor_bonus, 1);
        assert_eq!(fighter.weapon_bonus, 2);
        assert_eq!(fighter.loyalty(), Some(STARTING_LOYALTY));

        let cleric = Character::companion("Ilse", "cleric", "kind", "temple orphan");
        assert_eq!(cleric.attributes, Attributes::new(10, 14, 10, 12, 14));
    }

    #[test]
    fn test_gain_experience_levels_up_once() {
        let mut hero = Character::hero("Roland", "Warrior");
        hero.take_damage(50);

        assert_eq!(hero.gain_experience(50), None);
        assert_eq!(hero.gain_experience(50), Some(2));
        assert_eq!(hero.max_health(), 150);
        assert_eq!(hero.current_health(), 150);
        assert_eq!(hero.max_mana(), 55);

        // 350 total is past level 3's threshold but only one level is gained
        assert_eq!(hero.gain_experience(250), Some(3));
        assert_eq!(hero.level(), Some(3));
    }

    #[test]
    fn test_huge_experience_awards_saturate() {
        let mut hero = Character::hero("Roland", "Warrior");
        assert_eq!(hero.gain_experience(u32::MAX), Some(2));
        assert_eq!(hero.gain_experience(u32::MAX), Some(3));
        assert!(matches!(&hero.role, Role::Hero(h) if h.experience == u32::MAX));
    }

    #[test]
    fn test_experience_ignored_for_non_heroes() {
        let mut goblin = Character::enemy("Goblin", "Warrior");
        assert_eq!(goblin.gain_experience(1000), None);
        assert_eq!(goblin.level(), None);
    }

    #[test]
    fn test_loyalty() {
        let mut bram = Character::companion("Bram", "Fighter", "gruff", "ex-soldier");
        assert_eq!(bram.adjust_loyalty(80), Some(100));
        assert_eq!(bram.adjust_loyalty(-95), Some(5));
        assert!(bram.is_likely_to_leave());
        assert_eq!(bram.adjust_loyalty(-50), Some(0));

        let mut hero = Character::hero("Roland", "Warrior");
        assert_eq!(hero.adjust_loyalty(10), None);
        assert!(!hero.is_likely_to_leave());
    }

    #[test]
    fn test_react_to() {
        let mut bram = Character::companion("Bram", "Fighter", "gruff", "ex-soldier");
        assert_eq!(bram.react_to("I'm glad we stood our ground."), 5);
        assert_eq!(bram.loyalty(), Some(55));
        assert_eq!(bram.react_to("That was WRONG and you know it."), -5);
        assert_eq!(bram.loyalty(), Some(50));
        assert_eq!(bram.react_to("Hm."), 0);
        assert_eq!(bram.loyalty(), Some(50));
    }
}
