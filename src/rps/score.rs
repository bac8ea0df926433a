use crate::rps::moves::RoundOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wins needed to take a match.
pub const TARGET_SCORE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    AlreadyOver,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOver => write!(f, "match is over; reset before playing another round"),
        }
    }
}

impl std::error::Error for MatchError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub local_score: u32,
    pub remote_score: u32,
    pub target_score: u32,
    pub is_over: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    pub fn new() -> Self {
        Self { local_score: 0, remote_score: 0, target_score: TARGET_SCORE, is_over: false }
    }

    /// Rebuilds a match from persisted scores. Scores are clamped to the target
    /// and a decided match comes back already over.
    pub fn restore(local_score: u32, remote_score: u32) -> Self {
        let mut state = Self::new();
        state.local_score = local_score.min(state.target_score);
        state.remote_score = remote_score.min(state.target_score);
        state.is_over = state.winner().is_some();
        state
    }

    pub fn apply(self, outcome: RoundOutcome) -> Result<MatchState, MatchError> {
        if self.is_over {
            return Err(MatchError::AlreadyOver);
        }
        let mut next = self;
        match outcome {
            RoundOutcome::Win => next.local_score += 1,
            RoundOutcome::Loss => next.remote_score += 1,
            RoundOutcome::Draw => {}
        }
        next.is_over = next.winner().is_some();
        Ok(next)
    }

    pub fn reset(self) -> MatchState {
        Self::new()
    }

    /// Local win is checked first; only one score moves per round.
    pub fn winner(&self) -> Option<Side> {
        if self.local_score >= self.target_score {
            Some(Side::Local)
        } else if self.remote_score >= self.target_score {
            Some(Side::Remote)
        } else {
            None
        }
    }
}
