use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// The move this one defeats.
    pub fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Scissors => Move::Paper,
            Move::Paper => Move::Rock,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Rock => write!(f, "ROCK"),
            Move::Paper => write!(f, "PAPER"),
            Move::Scissors => write!(f, "SCISSORS"),
        }
    }
}

/// Result of a round, always from the local participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Win,
    Loss,
    Draw,
}

impl RoundOutcome {
    /// The same round seen from the other side of the table.
    pub fn mirrored(self) -> RoundOutcome {
        match self {
            RoundOutcome::Win => RoundOutcome::Loss,
            RoundOutcome::Loss => RoundOutcome::Win,
            RoundOutcome::Draw => RoundOutcome::Draw,
        }
    }
}

pub fn resolve(local: Move, remote: Move) -> RoundOutcome {
    if local == remote {
        RoundOutcome::Draw
    } else if local.beats() == remote {
        RoundOutcome::Win
    } else {
        RoundOutcome::Loss
    }
}

/// Both moves of a finished round plus its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub local: Move,
    pub remote: Move,
    pub outcome: RoundOutcome,
}

impl Round {
    pub fn play(local: Move, remote: Move) -> Self {
        Self { local, remote, outcome: resolve(local, remote) }
    }
}
