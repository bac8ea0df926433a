use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::lobby::LobbyChoice;

#[derive(Parser, Debug)]
#[command(name = "rpsterm")]
#[command(about = "Rock Paper Scissors in the terminal, against the computer or a friend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// How long a revealed round stays on screen before the next one
    #[arg(long, global = true, env = "RPSTERM_COOLDOWN_MS", default_value_t = 1500)]
    pub cooldown_ms: u64,

    /// Give up joining a session after this many seconds
    #[arg(long, global = true, env = "RPSTERM_CONNECT_TIMEOUT", default_value_t = 15)]
    pub connect_timeout_secs: u64,

    /// Where the single-player score is kept
    #[arg(long, global = true, env = "RPSTERM_SCORE_FILE", default_value = "rpsterm-score.json")]
    pub score_file: PathBuf,

    /// Log output goes here; the terminal belongs to the game
    #[arg(long, global = true, env = "RPSTERM_LOG_FILE", default_value = "rpsterm.log")]
    pub log_file: PathBuf,

    /// One of trace, debug, info, warn, error
    #[arg(long, global = true, env = "RPSTERM_LOG", default_value = "info")]
    pub log_level: tracing::Level,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Play against the computer
    Solo,
    /// Host a game and print a code for your opponent
    Host,
    /// Join a game hosted by someone else
    Join {
        /// Six-character session code shown on the host's screen
        code: String,
    },
}

impl Cli {
    /// The mode picked on the command line; `None` opens the lobby.
    pub fn start(&self) -> Option<LobbyChoice> {
        self.command.as_ref().map(|command| match command {
            Commands::Solo => LobbyChoice::Solo,
            Commands::Host => LobbyChoice::Host,
            Commands::Join { code } => LobbyChoice::Join(code.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_opens_the_lobby() {
        let cli = Cli::try_parse_from(["rpsterm"]).unwrap();
        assert_eq!(cli.start(), None);
        assert_eq!(cli.cooldown_ms, 1500);
        assert_eq!(cli.log_level, tracing::Level::INFO);
    }

    #[test]
    fn subcommands_map_to_lobby_choices() {
        let cli = Cli::try_parse_from(["rpsterm", "join", "ab12cd", "--cooldown-ms", "200"]).unwrap();
        assert_eq!(cli.start(), Some(LobbyChoice::Join("ab12cd".into())));
        assert_eq!(cli.cooldown_ms, 200);

        let cli = Cli::try_parse_from(["rpsterm", "--log-level", "debug", "host"]).unwrap();
        assert_eq!(cli.start(), Some(LobbyChoice::Host));
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn join_needs_a_code() {
        assert!(Cli::try_parse_from(["rpsterm", "join"]).is_err());
    }
}
