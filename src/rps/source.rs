use crate::rps::moves::Move;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Where the computer opponent's moves come from.
pub trait MoveSource: Send {
    fn next_move(&mut self) -> Move;
}

/// Uniform draw over the three moves.
pub struct RandomMoves {
    rng: StdRng,
}

impl RandomMoves {
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomMoves {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveSource for RandomMoves {
    fn next_move(&mut self) -> Move {
        Move::ALL[self.rng.random_range(0..Move::ALL.len())]
    }
}

/// Replays a fixed sequence, cycling when it runs out.
pub struct Scripted {
    moves: Vec<Move>,
    cursor: usize,
}

impl Scripted {
    pub fn new(moves: Vec<Move>) -> Self {
        assert!(!moves.is_empty(), "scripted opponent needs at least one move");
        Self { moves, cursor: 0 }
    }

    pub fn always(m: Move) -> Self {
        Self::new(vec![m])
    }
}

impl MoveSource for Scripted {
    fn next_move(&mut self) -> Move {
        let m = self.moves[self.cursor % self.moves.len()];
        self.cursor += 1;
        m
    }
}
