//! A short seeded skirmish played from the terminal.
//!
//! Companion decisions come from a small scripted tactician and narration
//! falls back to the built-in plain narrator, so no model is needed.
//!
//! ```text
//! RUST_LOG=rpg_core=debug cargo run --example skirmish
//! ```

use rpg_core::collaborators::PlainNarrator;
use rpg_core::{Character, CollaboratorError, CombatRules, GameSession, SessionConfig};
use tracing_subscriber::EnvFilter;

fn tactician(companion: &Character, prompt: &str) -> Result<String, CollaboratorError> {
    // Heal when anyone in the party is below half health, otherwise press the attack.
    let wounded = prompt
        .lines()
        .skip_while(|line| *line != "Allies:")
        .take_while(|line| *line != "Enemies:")
        .filter_map(|line| {
            let (name, hp) = line.strip_prefix("- ")?.split_once(" (HP: ")?;
            let (current, max) = hp.trim_end_matches(')').split_once('/')?;
            let (current, max): (i32, i32) = (current.parse().ok()?, max.parse().ok()?);
            (current * 2 < max).then(|| name.to_string())
        })
        .next();

    Ok(match wounded {
        Some(name) if companion.current_mana() >= 15 => {
            format!("ACTION: HEAL | TARGET: {name} | REASON: {name} is bleeding badly")
        }
        _ => "ACTION: ATTACK | TARGET: Goblin Chief | REASON: cut off the head".to_string(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let rules = CombatRules::from_env()?;
    let config = SessionConfig::new("Border Marches")
        .with_hero("Roland", "Warrior")
        .with_rules(rules)
        .with_seed(7);

    let mut session = GameSession::new(config)?
        .with_narrator(PlainNarrator)
        .with_decisions(tactician);
    session.recruit(Character::companion("Ilse", "Cleric", "gentle", "temple orphan"));
    session.recruit(Character::companion("Bram", "Fighter", "gruff", "deserter"));

    let enemies = vec![
        Character::enemy("Goblin Chief", "Guard"),
        Character::enemy("Goblin Archer", "Raider"),
        Character::enemy("Goblin Shaman", "Mage"),
    ];
    println!("{}", session.start_combat(enemies, "Old Mill")?);

    while session.in_combat() {
        let round = session.execute_round()?;
        println!("\n-- Turn {} --", round.report.turn);
        for line in &round.narration {
            println!("{line}");
        }
        if let Some(ending) = round.ending {
            println!("\n{ending}");
        }
    }

    println!("\n{}", session.hero());
    for entry in session.history() {
        println!("* {entry}");
    }
    Ok(())
}
