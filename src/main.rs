use anyhow::Result;
use clap::Parser;
use rpsterm::cli::Cli;
use rpsterm::config::Config;
use rpsterm::{app, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from(&cli);
    logging::init(&config)?;
    app::run(config, cli.start()).await
}
