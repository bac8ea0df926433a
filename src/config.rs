use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

/// Resolved settings, passed by reference to whatever needs them.
#[derive(Debug, Clone)]
pub struct Config {
    pub cooldown: Duration,
    pub connect_timeout: Duration,
    pub score_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(1500),
            connect_timeout: Duration::from_secs(15),
            score_file: PathBuf::from("rpsterm-score.json"),
            log_file: PathBuf::from("rpsterm.log"),
            log_level: tracing::Level::INFO,
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            cooldown: Duration::from_millis(cli.cooldown_ms),
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
            score_file: cli.score_file.clone(),
            log_file: cli.log_file.clone(),
            log_level: cli.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["rpsterm"]).unwrap();
        let config = Config::from(&cli);
        let default = Config::default();
        assert_eq!(config.cooldown, default.cooldown);
        assert_eq!(config.connect_timeout, default.connect_timeout);
        assert_eq!(config.score_file, default.score_file);
        assert_eq!(config.log_file, default.log_file);
        assert_eq!(config.log_level, default.log_level);
    }

    #[test]
    fn durations_come_from_flags() {
        let cli = Cli::try_parse_from(["rpsterm", "--cooldown-ms", "250", "--connect-timeout-secs", "3"]).unwrap();
        let config = Config::from(&cli);
        assert_eq!(config.cooldown, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }
}
