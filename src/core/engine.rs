//! Async driver around [`Synchronizer`].
//!
//! The engine owns the session's only mutable game state. UI input arrives as
//! [`Command`]s, peer traffic through the [`PeerLink`], and the reveal delay is
//! a tokio timer. After every step the engine publishes a [`Snapshot`] on a
//! watch channel for whoever draws the screen.
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::transport::{PeerLink, Role, TransportEvent};
use crate::rps::moves::{Move, Round, RoundOutcome};
use crate::rps::score::{MatchState, Side};
use crate::rps::source::MoveSource;
use crate::rps::store::{SavedScore, ScoreStore};
use crate::rps::sync::{Effect, Opponent, Phase, RematchState, Synchronizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Solo,
    Host,
    Joiner,
}

impl From<Role> for Mode {
    fn from(role: Role) -> Self {
        match role {
            Role::Host => Mode::Host,
            Role::Joiner => Mode::Joiner,
        }
    }
}

/// What the banner should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Choose,
    OpponentReady,
    WaitingForMove,
    Revealed(RoundOutcome),
    MatchWon,
    MatchLost,
    WaitingForRematch,
    RematchOffered,
    ScoreReset,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub mode: Mode,
    pub phase: Phase,
    pub score: MatchState,
    pub last_round: Option<Round>,
    pub local_move: Option<Move>,
    pub status: Status,
    pub rounds: u32,
    pub rematch: RematchState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Submit(Move),
    Rematch,
    ResetScore,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    Disconnected,
}

pub struct Engine {
    sync: Synchronizer,
    mode: Mode,
    link: Option<PeerLink>,
    store: Option<Box<dyn ScoreStore>>,
    cooldown: Duration,
    deadline: Option<Instant>,
    last_round: Option<Round>,
    opponent_ready: bool,
    score_reset: bool,
    updates: watch::Sender<Snapshot>,
}

impl Engine {
    /// Single-player session. A saved score is picked up where it was left;
    /// storage failures only cost persistence.
    pub fn solo(source: Box<dyn MoveSource>, store: Box<dyn ScoreStore>, config: &Config) -> Self {
        let score = match store.load() {
            Ok(Some(saved)) => {
                info!(local = saved.local_score, remote = saved.remote_score, "restored saved score");
                saved.into_match()
            }
            Ok(None) => MatchState::new(),
            Err(e) => {
                warn!(error = %e, "could not load saved score");
                MatchState::new()
            }
        };
        let sync = Synchronizer::with_score(Opponent::Cpu(source), score);
        Self::build(sync, Mode::Solo, None, Some(store), config)
    }

    pub fn peer(link: PeerLink, role: Role, config: &Config) -> Self {
        let sync = Synchronizer::new(Opponent::Peer);
        Self::build(sync, role.into(), Some(link), None, config)
    }

    fn build(
        sync: Synchronizer,
        mode: Mode,
        link: Option<PeerLink>,
        store: Option<Box<dyn ScoreStore>>,
        config: &Config,
    ) -> Self {
        let mut engine = Self {
            sync,
            mode,
            link,
            store,
            cooldown: config.cooldown,
            deadline: None,
            last_round: None,
            opponent_ready: false,
            score_reset: false,
            updates: watch::channel(placeholder(mode)).0,
        };
        engine.publish();
        engine
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            phase: self.sync.phase(),
            score: self.sync.score(),
            last_round: self.last_round,
            local_move: self.sync.local_move(),
            status: self.status(),
            rounds: self.sync.rounds_played(),
            rematch: self.sync.rematch(),
        }
    }

    /// Runs until the player quits, the command channel closes, or the peer
    /// goes away.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> SessionEnd {
        info!(mode = ?self.mode, "session started");
        let end = loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Quit) | None => break SessionEnd::Quit,
                    Some(cmd) => self.handle_command(cmd),
                },
                event = next_event(&mut self.link) => match event {
                    TransportEvent::Message(msg) => {
                        let effects = self.sync.receive(msg);
                        self.apply(effects);
                    }
                    TransportEvent::Closed => {
                        info!("opponent disconnected");
                        let effects = self.sync.disconnect();
                        self.apply(effects);
                        break SessionEnd::Disconnected;
                    }
                },
                _ = cooldown_timer(self.deadline) => {
                    self.deadline = None;
                    let effects = self.sync.cooldown_elapsed();
                    self.apply(effects);
                }
            }
            self.publish();
        };
        self.publish();
        if let Some(link) = self.link.take() {
            link.close();
        }
        info!(?end, "session ended");
        end
    }

    fn handle_command(&mut self, cmd: Command) {
        let result = match cmd {
            Command::Submit(mv) => self.sync.submit_move(mv),
            Command::Rematch => self.sync.request_rematch(),
            Command::ResetScore => self.sync.reset_score(),
            Command::Quit => Ok(Vec::new()),
        };
        match result {
            Ok(effects) => {
                if let Command::Submit(_) = cmd {
                    self.score_reset = false;
                }
                self.apply(effects)
            }
            Err(rejected) => debug!(?cmd, %rejected, "command ignored"),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(msg) => {
                    let delivered = self.link.as_ref().is_some_and(|link| link.send(msg));
                    if !delivered {
                        warn!(?msg, "peer link is gone, message dropped");
                    }
                }
                Effect::OpponentReady => self.opponent_ready = true,
                Effect::RoundResolved(round) => {
                    self.last_round = Some(round);
                    self.opponent_ready = false;
                    self.score_reset = false;
                }
                Effect::ScoreChanged(score) => self.persist(&score),
                Effect::StartCooldown => self.deadline = Some(Instant::now() + self.cooldown),
                Effect::MatchOver(winner) => info!(?winner, "match decided"),
                Effect::RematchOffered => debug!("opponent asked for a rematch"),
                Effect::WaitingForOpponent => debug!("waiting for opponent to accept rematch"),
                Effect::MatchReset => {
                    self.last_round = None;
                    self.opponent_ready = false;
                }
                Effect::ScoreReset => {
                    self.last_round = None;
                    self.opponent_ready = false;
                    self.score_reset = true;
                }
                Effect::SessionClosed => self.deadline = None,
            }
        }
    }

    fn persist(&self, score: &MatchState) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&SavedScore::from(score)) {
            warn!(error = %e, "could not save score");
        }
    }

    fn status(&self) -> Status {
        let rematch = self.sync.rematch();
        match self.sync.phase() {
            Phase::Disconnected => Status::Disconnected,
            Phase::Resolving | Phase::Cooldown => match self.last_round {
                Some(round) => Status::Revealed(round.outcome),
                None => Status::WaitingForMove,
            },
            Phase::MatchOver if rematch.local && !rematch.remote => Status::WaitingForRematch,
            Phase::MatchOver if rematch.remote && !rematch.local && !self.sync.is_solo() => {
                Status::RematchOffered
            }
            Phase::MatchOver => match self.sync.score().winner() {
                Some(Side::Local) => Status::MatchWon,
                Some(Side::Remote) => Status::MatchLost,
                None => Status::Choose,
            },
            Phase::AwaitingRemoteMove => Status::WaitingForMove,
            Phase::AwaitingLocalMove => Status::OpponentReady,
            Phase::Idle if self.score_reset => Status::ScoreReset,
            Phase::Idle if self.opponent_ready => Status::OpponentReady,
            Phase::Idle => Status::Choose,
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.updates.send_replace(snapshot);
    }
}

fn placeholder(mode: Mode) -> Snapshot {
    Snapshot {
        mode,
        phase: Phase::Idle,
        score: MatchState::new(),
        last_round: None,
        local_move: None,
        status: Status::Choose,
        rounds: 0,
        rematch: RematchState::default(),
    }
}

async fn next_event(link: &mut Option<PeerLink>) -> TransportEvent {
    match link {
        Some(link) => link.next_event().await,
        None => std::future::pending().await,
    }
}

async fn cooldown_timer(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rps::protocol::PeerMessage;
    use crate::rps::source::Scripted;
    use crate::rps::store::{MemoryStore, SCORE_KEY};
    use std::sync::Arc;

    fn config() -> Config {
        Config { cooldown: Duration::from_millis(1500), ..Config::default() }
    }

    fn solo(cpu: Move, store: Arc<MemoryStore>) -> Engine {
        Engine::solo(Box::new(Scripted::always(cpu)), Box::new(store), &config())
    }

    async fn wait(rx: &mut watch::Receiver<Snapshot>, f: impl FnMut(&Snapshot) -> bool) -> Snapshot {
        rx.wait_for(f).await.unwrap().clone()
    }

    async fn expect_msg(link: &mut PeerLink) -> PeerMessage {
        match link.next_event().await {
            TransportEvent::Message(msg) => msg,
            TransportEvent::Closed => panic!("link closed"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn solo_match_plays_to_three_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let engine = solo(Move::Scissors, store.clone());
        let mut rx = engine.subscribe();
        let (tx, commands) = mpsc::unbounded_channel();
        let session = tokio::spawn(engine.run(commands));

        for round in 1..=3u32 {
            tx.send(Command::Submit(Move::Rock)).unwrap();
            let snap = wait(&mut rx, |s| s.rounds == round).await;
            assert_eq!(snap.status, Status::Revealed(RoundOutcome::Win));
            assert_eq!(snap.phase, Phase::Cooldown);
            assert_eq!(snap.last_round.map(|r| r.remote), Some(Move::Scissors));
            wait(&mut rx, |s| s.phase != Phase::Cooldown).await;
        }
        let snap = rx.borrow().clone();
        assert_eq!(snap.phase, Phase::MatchOver);
        assert_eq!(snap.status, Status::MatchWon);
        assert_eq!(store.raw(SCORE_KEY).unwrap(), r#"{"localScore":3,"remoteScore":0}"#);

        tx.send(Command::Rematch).unwrap();
        let snap = wait(&mut rx, |s| s.phase == Phase::Idle).await;
        assert_eq!(snap.score, MatchState::new());
        assert_eq!(store.raw(SCORE_KEY).unwrap(), r#"{"localScore":0,"remoteScore":0}"#);

        tx.send(Command::Quit).unwrap();
        assert_eq!(session.await.unwrap(), SessionEnd::Quit);
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_holds_for_the_cooldown() {
        let engine = solo(Move::Rock, Arc::new(MemoryStore::new()));
        let mut rx = engine.subscribe();
        let (tx, commands) = mpsc::unbounded_channel();
        tokio::spawn(engine.run(commands));

        let started = Instant::now();
        tx.send(Command::Submit(Move::Rock)).unwrap();
        let snap = wait(&mut rx, |s| s.rounds == 1).await;
        assert_eq!(snap.status, Status::Revealed(RoundOutcome::Draw));
        // second pick during the reveal is dropped
        tx.send(Command::Submit(Move::Paper)).unwrap();
        wait(&mut rx, |s| s.phase == Phase::Idle).await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(rx.borrow().rounds, 1);
        assert_eq!(rx.borrow().status, Status::Choose);
    }

    #[tokio::test(start_paused = true)]
    async fn saved_score_is_restored_and_resettable() {
        let store = Arc::new(MemoryStore::with_score(SavedScore { local_score: 1, remote_score: 3 }));
        let engine = solo(Move::Rock, store.clone());
        let snap = engine.snapshot();
        assert_eq!(snap.phase, Phase::MatchOver);
        assert_eq!(snap.status, Status::MatchLost);

        let mut rx = engine.subscribe();
        let (tx, commands) = mpsc::unbounded_channel();
        tokio::spawn(engine.run(commands));
        tx.send(Command::ResetScore).unwrap();
        let snap = wait(&mut rx, |s| s.status == Status::ScoreReset).await;
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.score, MatchState::new());
        assert_eq!(store.load().unwrap(), Some(SavedScore { local_score: 0, remote_score: 0 }));
    }

    #[tokio::test(start_paused = true)]
    async fn peer_round_and_disconnect() {
        let (link, mut remote) = PeerLink::loopback();
        let engine = Engine::peer(link, Role::Host, &config());
        assert_eq!(engine.snapshot().mode, Mode::Host);
        let mut rx = engine.subscribe();
        let (tx, commands) = mpsc::unbounded_channel();
        let session = tokio::spawn(engine.run(commands));

        remote.send(PeerMessage::MoveCommitted);
        wait(&mut rx, |s| s.status == Status::OpponentReady).await;
        remote.send(PeerMessage::MoveRevealed { mv: Move::Paper });
        wait(&mut rx, |s| s.phase == Phase::AwaitingLocalMove).await;

        tx.send(Command::Submit(Move::Scissors)).unwrap();
        assert_eq!(expect_msg(&mut remote).await, PeerMessage::MoveCommitted);
        assert_eq!(expect_msg(&mut remote).await, PeerMessage::MoveRevealed { mv: Move::Scissors });
        let snap = wait(&mut rx, |s| s.rounds == 1).await;
        assert_eq!(snap.status, Status::Revealed(RoundOutcome::Win));
        assert_eq!(snap.score.local_score, 1);

        drop(remote);
        assert_eq!(session.await.unwrap(), SessionEnd::Disconnected);
        assert_eq!(rx.borrow().status, Status::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn peer_sessions_ignore_score_reset() {
        let (link, _remote) = PeerLink::loopback();
        let engine = Engine::peer(link, Role::Joiner, &config());
        let mut rx = engine.subscribe();
        let (tx, commands) = mpsc::unbounded_channel();
        tokio::spawn(engine.run(commands));

        tx.send(Command::ResetScore).unwrap();
        tx.send(Command::Submit(Move::Rock)).unwrap();
        let snap = wait(&mut rx, |s| s.phase == Phase::AwaitingRemoteMove).await;
        assert_eq!(snap.status, Status::WaitingForMove);
        assert_eq!(snap.local_move, Some(Move::Rock));
    }
}
