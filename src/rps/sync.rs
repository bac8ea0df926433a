//! Round synchronization between the local player and one opponent.
//!
//! The synchronizer is a plain state machine: every input returns the list of
//! [`Effect`]s the caller has to carry out (send a message, start the reveal
//! cooldown, persist the score, update the screen). It never blocks and never
//! talks to the network itself; [`crate::core::engine::Engine`] owns the async
//! side.
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::rps::moves::{Move, Round};
use crate::rps::protocol::PeerMessage;
use crate::rps::score::{MatchState, Side};
use crate::rps::source::MoveSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    /// The opponent's move is already buffered; only ours is missing.
    AwaitingLocalMove,
    AwaitingRemoteMove,
    Resolving,
    Cooldown,
    MatchOver,
    Disconnected,
}

pub enum Opponent {
    Cpu(Box<dyn MoveSource>),
    Peer,
}

impl fmt::Debug for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opponent::Cpu(_) => write!(f, "Cpu"),
            Opponent::Peer => write!(f, "Peer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RematchState {
    pub local: bool,
    pub remote: bool,
}

impl RematchState {
    fn fresh(opponent: &Opponent) -> Self {
        Self { local: false, remote: matches!(opponent, Opponent::Cpu(_)) }
    }

    pub fn ready(&self) -> bool {
        self.local && self.remote
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Send(PeerMessage),
    OpponentReady,
    RoundResolved(Round),
    ScoreChanged(MatchState),
    StartCooldown,
    MatchOver(Side),
    RematchOffered,
    WaitingForOpponent,
    MatchReset,
    ScoreReset,
    SessionClosed,
}

/// An input the current phase does not accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    pub phase: Phase,
    pub reason: &'static str,
}

impl Rejected {
    fn new(phase: Phase, reason: &'static str) -> Self {
        Self { phase, reason }
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (phase {:?})", self.reason, self.phase)
    }
}

impl std::error::Error for Rejected {}

#[derive(Debug)]
pub struct Synchronizer {
    opponent: Opponent,
    phase: Phase,
    local: Option<Move>,
    remote: Option<Move>,
    // opponent's move for the round after the one cooling down
    buffered: Option<Move>,
    score: MatchState,
    rematch: RematchState,
    rounds: u32,
}

impl Synchronizer {
    pub fn new(opponent: Opponent) -> Self {
        Self::with_score(opponent, MatchState::new())
    }

    pub fn with_score(opponent: Opponent, score: MatchState) -> Self {
        let phase = if score.is_over { Phase::MatchOver } else { Phase::Idle };
        let rematch = RematchState::fresh(&opponent);
        Self { opponent, phase, local: None, remote: None, buffered: None, score, rematch, rounds: 0 }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> MatchState {
        self.score
    }

    pub fn rematch(&self) -> RematchState {
        self.rematch
    }

    /// Our pick for the round in progress, if made.
    pub fn local_move(&self) -> Option<Move> {
        self.local
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds
    }

    pub fn is_solo(&self) -> bool {
        matches!(self.opponent, Opponent::Cpu(_))
    }

    pub fn submit_move(&mut self, mv: Move) -> Result<Vec<Effect>, Rejected> {
        match self.phase {
            Phase::Idle | Phase::AwaitingLocalMove => {}
            phase => return Err(Rejected::new(phase, "not accepting a move right now")),
        }
        self.local = Some(mv);
        let mut effects = Vec::new();
        match &mut self.opponent {
            Opponent::Cpu(source) => self.remote = Some(source.next_move()),
            Opponent::Peer => {
                effects.push(Effect::Send(PeerMessage::MoveCommitted));
                effects.push(Effect::Send(PeerMessage::MoveRevealed { mv }));
            }
        }
        if self.remote.is_some() {
            self.resolve(&mut effects);
        } else {
            self.transition(Phase::AwaitingRemoteMove);
        }
        Ok(effects)
    }

    pub fn receive(&mut self, msg: PeerMessage) -> Vec<Effect> {
        if self.is_solo() {
            warn!(?msg, "peer message in a single-player session");
            return Vec::new();
        }
        match msg {
            PeerMessage::MoveCommitted if self.phase == Phase::Idle => vec![Effect::OpponentReady],
            PeerMessage::MoveCommitted => Vec::new(),
            PeerMessage::MoveRevealed { mv } => self.receive_move(mv),
            PeerMessage::RematchRequested => self.receive_rematch(),
        }
    }

    pub fn request_rematch(&mut self) -> Result<Vec<Effect>, Rejected> {
        if self.phase == Phase::Disconnected {
            return Err(Rejected::new(self.phase, "session is closed"));
        }
        if !self.score.is_over {
            return Err(Rejected::new(self.phase, "match is still in progress"));
        }
        if self.rematch.local {
            return Ok(Vec::new());
        }
        self.rematch.local = true;
        let mut effects = Vec::new();
        if let Opponent::Peer = self.opponent {
            effects.push(Effect::Send(PeerMessage::RematchRequested));
        }
        if self.phase == Phase::MatchOver {
            self.try_rematch(&mut effects);
        }
        Ok(effects)
    }

    /// Completion signal of the reveal delay.
    pub fn cooldown_elapsed(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Cooldown {
            return Vec::new();
        }
        self.local = None;
        self.remote = None;
        let mut effects = Vec::new();
        match self.score.winner() {
            Some(winner) => {
                self.transition(Phase::MatchOver);
                info!(?winner, score = ?(self.score.local_score, self.score.remote_score), "match over");
                effects.push(Effect::MatchOver(winner));
                self.try_rematch(&mut effects);
            }
            None => self.begin_round(&mut effects),
        }
        effects
    }

    /// Zeroes the score outside of a reveal. Only offered against the computer.
    pub fn reset_score(&mut self) -> Result<Vec<Effect>, Rejected> {
        if !self.is_solo() {
            return Err(Rejected::new(self.phase, "score reset needs a rematch against a peer"));
        }
        if matches!(self.phase, Phase::Resolving | Phase::Cooldown | Phase::Disconnected) {
            return Err(Rejected::new(self.phase, "round is being revealed"));
        }
        self.score = self.score.reset();
        self.rematch = RematchState::fresh(&self.opponent);
        self.local = None;
        self.remote = None;
        self.buffered = None;
        self.transition(Phase::Idle);
        Ok(vec![Effect::ScoreReset, Effect::ScoreChanged(self.score)])
    }

    /// Transport closed; terminal.
    pub fn disconnect(&mut self) -> Vec<Effect> {
        if self.phase == Phase::Disconnected {
            return Vec::new();
        }
        self.local = None;
        self.remote = None;
        self.buffered = None;
        self.transition(Phase::Disconnected);
        vec![Effect::SessionClosed]
    }

    fn receive_move(&mut self, mv: Move) -> Vec<Effect> {
        let mut effects = Vec::new();
        match self.phase {
            Phase::Idle => {
                self.remote = Some(mv);
                self.transition(Phase::AwaitingLocalMove);
                effects.push(Effect::OpponentReady);
            }
            Phase::AwaitingRemoteMove => {
                self.remote = Some(mv);
                self.resolve(&mut effects);
            }
            Phase::Cooldown if self.buffered.is_none() => {
                debug!("buffering opponent move for the next round");
                self.buffered = Some(mv);
            }
            phase => warn!(?phase, "ignoring unexpected move reveal"),
        }
        effects
    }

    fn receive_rematch(&mut self) -> Vec<Effect> {
        if self.rematch.remote || self.phase == Phase::Disconnected {
            return Vec::new();
        }
        self.rematch.remote = true;
        let mut effects = vec![Effect::RematchOffered];
        if self.phase == Phase::MatchOver {
            self.try_rematch(&mut effects);
        } else {
            debug!(phase = ?self.phase, "holding rematch request until the match is over");
        }
        effects
    }

    fn try_rematch(&mut self, effects: &mut Vec<Effect>) {
        if self.rematch.ready() {
            self.score = self.score.reset();
            self.rematch = RematchState::fresh(&self.opponent);
            self.local = None;
            self.remote = None;
            info!("rematch agreed");
            effects.push(Effect::MatchReset);
            effects.push(Effect::ScoreChanged(self.score));
            self.begin_round(effects);
        } else if self.rematch.local {
            effects.push(Effect::WaitingForOpponent);
        }
    }

    fn begin_round(&mut self, effects: &mut Vec<Effect>) {
        self.remote = self.buffered.take();
        if self.remote.is_some() {
            self.transition(Phase::AwaitingLocalMove);
            effects.push(Effect::OpponentReady);
        } else {
            self.transition(Phase::Idle);
        }
    }

    fn resolve(&mut self, effects: &mut Vec<Effect>) {
        let (Some(local), Some(remote)) = (self.local, self.remote) else {
            return;
        };
        self.transition(Phase::Resolving);
        let round = Round::play(local, remote);
        match self.score.apply(round.outcome) {
            Ok(score) => self.score = score,
            Err(e) => warn!(error = %e, "round resolved after the match ended"),
        }
        self.rounds += 1;
        info!(round = self.rounds, %local, %remote, outcome = ?round.outcome, "round resolved");
        effects.push(Effect::RoundResolved(round));
        effects.push(Effect::ScoreChanged(self.score));
        effects.push(Effect::StartCooldown);
        self.transition(Phase::Cooldown);
    }

    fn transition(&mut self, next: Phase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "phase transition");
            self.phase = next;
        }
    }
}
