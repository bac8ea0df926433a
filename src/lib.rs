pub mod core {
	pub mod engine;
	pub mod frame;
	pub mod lobby;
	pub mod network;
	pub mod session;
	pub mod transport;
}

pub mod rps;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;

// Re-export for convenience
pub use crate::core::engine::{Command, Engine, SessionEnd, Snapshot, Status};
pub use crate::core::transport::{PeerLink, Role};
