//! Turns a parsed model reply, or a failure, into a `MatchOutcome`.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::matching::models::{Candidate, MatchLevel, MatchOutcome, UNKNOWN_CANDIDATE};

/// Substituted when the reply has no usable numeric score.
pub const NEUTRAL_SCORE: u8 = 50;
/// Maximum characters of diagnostic text carried in an Error outcome.
pub const DIAGNOSTIC_LIMIT: usize = 100;

pub fn normalize_score(raw: Option<&Value>) -> u8 {
    match raw.and_then(Value::as_f64) {
        Some(n) if n.is_finite() => n.round().clamp(0.0, 100.0) as u8,
        _ => NEUTRAL_SCORE,
    }
}

/// Collects a list field. A bare string becomes a one-item list; non-string
/// items are kept in their JSON form.
fn string_list(raw: Option<&Value>) -> Vec<String> {
    let items = match raw {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::String(s)) if !s.trim().is_empty() => return vec![s.trim().to_string()],
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn from_reply(candidate: &Candidate, reply: &Map<String, Value>) -> MatchOutcome {
    let score = normalize_score(reply.get("score"));
    let match_level = reply
        .get("match_level")
        .and_then(Value::as_str)
        .and_then(MatchLevel::from_reply)
        .unwrap_or_else(|| MatchLevel::from_score(score));

    MatchOutcome {
        candidate_id: Some(candidate.id),
        candidate_name: candidate.name.clone(),
        score,
        match_level,
        key_matches: string_list(reply.get("key_matches")),
        gaps: string_list(reply.get("gaps")),
        summary: reply
            .get("summary")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Caps diagnostic text at `DIAGNOSTIC_LIMIT` characters.
pub fn truncate_diagnostic(message: &str) -> String {
    message.chars().take(DIAGNOSTIC_LIMIT).collect()
}

/// An Error outcome for a candidate whose call failed inside the adapter.
pub fn failure(candidate: &Candidate, context: &str, diagnostic: &str) -> MatchOutcome {
    error_outcome(Some(candidate.id), candidate.name.clone(), context, diagnostic)
}

/// An Error outcome for a call that escaped the adapter entirely.
pub fn unknown_failure(candidate_id: Option<Uuid>, diagnostic: &str) -> MatchOutcome {
    error_outcome(candidate_id, UNKNOWN_CANDIDATE.to_string(), "Error", diagnostic)
}

fn error_outcome(
    candidate_id: Option<Uuid>,
    candidate_name: String,
    context: &str,
    diagnostic: &str,
) -> MatchOutcome {
    let diagnostic = truncate_diagnostic(diagnostic.trim());
    let summary = if diagnostic.is_empty() {
        format!("{context}: unknown failure")
    } else {
        format!("{context}: {diagnostic}")
    };

    MatchOutcome {
        candidate_id,
        candidate_name,
        score: 0,
        match_level: MatchLevel::Error,
        key_matches: Vec::new(),
        gaps: Vec::new(),
        summary,
    }
}
