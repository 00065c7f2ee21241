use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A titled link with a vote-derived score and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "up" => Some(VoteDirection::Up),
            "down" => Some(VoteDirection::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }

    pub fn delta(&self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// A single up/down event attributed to a story. Vote events are appended on
/// every successful vote and never mutated or deleted; the story's `score`
/// is the cached running total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub story_id: i64,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
