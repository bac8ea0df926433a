pub mod controls;
pub mod moves;
pub mod protocol;
pub mod renderer;
pub mod score;
pub mod source;
pub mod store;
pub mod sync;

pub use moves::{resolve, Move, Round, RoundOutcome};
pub use protocol::PeerMessage;
pub use score::{MatchState, Side, TARGET_SCORE};
pub use sync::{Effect, Opponent, Phase, Synchronizer};
