// src/models/session.rs

use serde::{Deserialize, Serialize};

use super::answer::{RawAnswer, UserAnswer};

/// Restorable state of an in-progress exam attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub answers: Vec<UserAnswer>,
    /// Seconds.
    pub time_remaining: u64,
    pub current_question_index: usize,
    #[serde(default)]
    pub is_paused: bool,
}

/// Snapshot as stored by any client version; answers are repaired on restore.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSessionSnapshot {
    pub answers: Vec<RawAnswer>,
    pub time_remaining: u64,
    #[serde(default)]
    pub current_question_index: usize,
    #[serde(default)]
    pub is_paused: bool,
}
