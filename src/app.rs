//! Terminal front end: lobby, connection screens and the match screen.
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::engine::{Engine, SessionEnd};
use crate::core::lobby::{Lobby, LobbyChoice};
use crate::core::network::{self, Host};
use crate::core::transport::Role;
use crate::rps::controls::{self, Input};
use crate::rps::renderer;
use crate::rps::source::RandomMoves;
use crate::rps::store::JsonFileStore;

pub async fn run(config: Config, start: Option<LobbyChoice>) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = drive(&mut terminal, &config, start).await;
    ratatui::restore();
    result
}

async fn drive(terminal: &mut DefaultTerminal, config: &Config, start: Option<LobbyChoice>) -> Result<()> {
    let mut lobby = Lobby::new();
    let mut next = start;
    loop {
        let choice = match next.take() {
            Some(choice) => choice,
            None => lobby.run(terminal)?,
        };
        info!(?choice, "lobby choice");
        let engine = match choice {
            LobbyChoice::Quit => return Ok(()),
            LobbyChoice::Solo => Engine::solo(
                Box::new(RandomMoves::new()),
                Box::new(JsonFileStore::new(&config.score_file)),
                config,
            ),
            LobbyChoice::Host => {
                let host = match Host::bind().await {
                    Ok(host) => host,
                    Err(e) => {
                        warn!(error = %e, "could not start hosting");
                        lobby.set_status(format!("Could not start hosting: {}", e));
                        continue;
                    }
                };
                let message = format!("Share this code with your opponent:\n\n{}", host.session_id());
                match wait_on(terminal, &message, host.accept()).await? {
                    Some(Ok(link)) => Engine::peer(link, Role::Host, config),
                    Some(Err(e)) => {
                        warn!(error = %e, "hosting failed");
                        lobby.set_status(format!("Hosting failed: {}", e));
                        continue;
                    }
                    None => continue,
                }
            }
            LobbyChoice::Join(code) => {
                let message = format!("Connecting to {}...", code.to_ascii_uppercase());
                match wait_on(terminal, &message, network::join(&code, config)).await? {
                    Some(Ok(link)) => Engine::peer(link, Role::Joiner, config),
                    Some(Err(e)) => {
                        warn!(error = %e, "join failed");
                        lobby.set_status(format!("Connection failed: {}", e));
                        continue;
                    }
                    None => continue,
                }
            }
        };
        if play(terminal, engine).await? == SessionEnd::Disconnected {
            lobby.set_status("Connection lost: your opponent left the game");
        }
    }
}

/// Shows `message` until `fut` finishes. `None` if the player backed out
/// with Esc, which drops the future.
async fn wait_on<F: Future>(terminal: &mut DefaultTerminal, message: &str, fut: F) -> Result<Option<F::Output>> {
    tokio::pin!(fut);
    loop {
        terminal.draw(|f| render_waiting(f, message))?;
        tokio::select! {
            out = &mut fut => return Ok(Some(out)),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Esc {
                    return Ok(None);
                }
            }
        }
    }
}

fn render_waiting(f: &mut Frame, message: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());
    f.render_widget(
        Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" ROCK PAPER SCISSORS ")),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new("[Esc] Back to lobby").alignment(Alignment::Center).style(Style::default().fg(Color::Gray)),
        chunks[1],
    );
}

async fn play(terminal: &mut DefaultTerminal, engine: Engine) -> Result<SessionEnd> {
    let mut snapshots = engine.subscribe();
    let (commands, rx) = mpsc::unbounded_channel();
    let mut session = tokio::spawn(engine.run(rx));
    let mut muted = false;
    let mut rounds_seen = snapshots.borrow().rounds;

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.rounds != rounds_seen {
            rounds_seen = snapshot.rounds;
            if !muted {
                bell()?;
            }
        }
        terminal.draw(|f| renderer::render(f, &snapshot, muted))?;

        tokio::select! {
            end = &mut session => return Ok(end?),
            _ = tokio::time::sleep(Duration::from_millis(16)) => {}
        }

        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match controls::map_key(key.code) {
                Some(Input::Play(cmd)) => {
                    // the engine only stops listening once the session is over
                    let _ = commands.send(cmd);
                }
                Some(Input::ToggleMute) => muted = !muted,
                None => {}
            }
        }
    }
}

fn bell() -> Result<()> {
    crossterm::execute!(std::io::stdout(), crossterm::style::Print('\x07'))?;
    Ok(())
}
