use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Candidate name used when a call fails so badly its identity is not recoverable.
pub const UNKNOWN_CANDIDATE: &str = "Unknown";

/// One CV dispatched for matching. The id travels with the call so results
/// are never re-associated by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Error,
}

impl MatchLevel {
    /// Level implied by a clamped score. Never returns `Error`.
    pub fn from_score(score: u8) -> MatchLevel {
        match score {
            75..=u8::MAX => MatchLevel::Excellent,
            60..=74 => MatchLevel::Good,
            40..=59 => MatchLevel::Fair,
            _ => MatchLevel::Poor,
        }
    }

    /// Parses a model-supplied level. "Error" is not accepted from a model.
    pub fn from_reply(raw: &str) -> Option<MatchLevel> {
        let raw = raw.trim();
        [
            MatchLevel::Excellent,
            MatchLevel::Good,
            MatchLevel::Fair,
            MatchLevel::Poor,
        ]
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLevel::Excellent => "Excellent",
            MatchLevel::Good => "Good",
            MatchLevel::Fair => "Fair",
            MatchLevel::Poor => "Poor",
            MatchLevel::Error => "Error",
        }
    }
}

/// Normalized result of scoring one candidate against a JD.
///
/// Invariants: `score` is in 0..=100; an `Error` outcome has score 0, empty
/// `key_matches`/`gaps`, and a non-empty `summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub candidate_id: Option<Uuid>,
    pub candidate_name: String,
    pub score: u8,
    pub match_level: MatchLevel,
    pub key_matches: Vec<String>,
    pub gaps: Vec<String>,
    pub summary: String,
}

impl MatchOutcome {
    pub fn is_error(&self) -> bool {
        self.match_level == MatchLevel::Error
    }
}
