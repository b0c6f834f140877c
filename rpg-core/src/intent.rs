//! Companion decision parsing.
//!
//! A decision collaborator answers with one line shaped like
//! `ACTION: <token> | TARGET: <name> | REASON: <text>`. Each labeled key is
//! located independently, so the fields may appear in any order; the value
//! runs to the next `|`, line break, or end of input and is trimmed.
//!
//! Parsing is pure and fallible. Deciding what to do when it fails is the
//! resolver's job (see [`crate::resolver`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentParseError {
    #[error("Decision text is empty")]
    EmptyInput,
    #[error("Decision text has no {0}: field")]
    MissingField(&'static str),
}

/// What a companion wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    Attack,
    Heal,
    Defend,
}

impl DecisionKind {
    /// Match an action token case-insensitively. Anything unrecognized,
    /// including an empty token, means `Attack`.
    pub fn from_token(token: &str) -> Self {
        let token = strip_decoration(token);
        if token.eq_ignore_ascii_case("HEAL") {
            DecisionKind::Heal
        } else if token.eq_ignore_ascii_case("DEFEND") {
            DecisionKind::Defend
        } else {
            DecisionKind::Attack
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DecisionKind::Attack => "ATTACK",
            DecisionKind::Heal => "HEAL",
            DecisionKind::Defend => "DEFEND",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A parsed companion decision. Transient: consumed by the resolver on the
/// same turn it is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionIntent {
    pub kind: DecisionKind,
    /// Free-text target name, matched later against living combatants.
    pub target: String,
    /// Narration-only justification.
    pub reason: Option<String>,
}

const ACTION_KEY: &str = "ACTION";
const TARGET_KEY: &str = "TARGET";
const REASON_KEY: &str = "REASON";

/// Parse a companion's decision line.
///
/// `ACTION:` and `TARGET:` are required; `REASON:` is optional. Keys are
/// matched case-insensitively.
pub fn parse_decision(text: &str) -> Result<DecisionIntent, IntentParseError> {
    if text.trim().is_empty() {
        return Err(IntentParseError::EmptyInput);
    }

    let action = extract_field(text, ACTION_KEY).ok_or(IntentParseError::MissingField(ACTION_KEY))?;
    let target = extract_field(text, TARGET_KEY).ok_or(IntentParseError::MissingField(TARGET_KEY))?;
    let reason = extract_field(text, REASON_KEY)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    Ok(DecisionIntent {
        kind: DecisionKind::from_token(action),
        target: strip_decoration(target).to_string(),
        reason,
    })
}

/// Value following the first `KEY:` label, up to the next delimiter.
fn extract_field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    // ASCII uppercasing keeps byte offsets aligned with `text`.
    let upper = text.to_ascii_uppercase();
    let label = format!("{key}:");
    let start = upper.find(&label)? + label.len();

    let rest = &text[start..];
    let end = rest.find(['|', '\n', '\r']).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Models like to echo the prompt's placeholder syntax (`[ATTACK]`,
/// `"Bob"`); peel that off.
fn strip_decoration(value: &str) -> &str {
    value
        .trim()
        .trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '\'' | '*'))
        .trim()
}
