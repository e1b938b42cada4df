use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Kind of skippable segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipKind {
    Intro,
    Outro,
}

impl SkipKind {
    /// Map a service `skip_type` to a kind. Only opening and ending are kept.
    pub fn from_api(skip_type: &str) -> Option<Self> {
        match skip_type {
            "op" => Some(SkipKind::Intro),
            "ed" => Some(SkipKind::Outro),
            _ => None,
        }
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            SkipKind::Intro => "op",
            SkipKind::Outro => "ed",
        }
    }
}

impl Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipKind::Intro => write!(f, "intro"),
            SkipKind::Outro => write!(f, "outro"),
        }
    }
}

/// A time range eligible for manual or automatic skipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipInterval {
    pub kind: SkipKind,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Identifier assigned by the skip-time service, used for voting
    pub skip_id: String,
}

impl SkipInterval {
    /// Closed-interval containment check.
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start_seconds && position <= self.end_seconds
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Feedback vote on the accuracy of a set of skip intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteType::Upvote => write!(f, "upvote"),
            VoteType::Downvote => write!(f, "downvote"),
        }
    }
}
