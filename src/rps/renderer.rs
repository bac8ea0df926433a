use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::engine::{Mode, Snapshot, Status};
use crate::rps::moves::{Move, RoundOutcome};
use crate::rps::sync::Phase;

pub fn banner(status: Status) -> (&'static str, Color) {
    match status {
        Status::Choose => ("CHOOSE", Color::White),
        Status::OpponentReady => ("OPPONENT IS READY", Color::Cyan),
        Status::WaitingForMove => ("WAITING FOR OPPONENT...", Color::Gray),
        Status::Revealed(RoundOutcome::Win) => ("VICTORY", Color::Green),
        Status::Revealed(RoundOutcome::Loss) => ("DEFEAT", Color::Red),
        Status::Revealed(RoundOutcome::Draw) => ("DRAW", Color::Yellow),
        Status::MatchWon => ("MATCH WON", Color::Green),
        Status::MatchLost => ("MATCH LOST", Color::Red),
        Status::WaitingForRematch => ("WAITING FOR OPPONENT TO ACCEPT REMATCH", Color::Gray),
        Status::RematchOffered => ("OPPONENT WANTS A REMATCH", Color::Cyan),
        Status::ScoreReset => ("SCORE RESET", Color::White),
        Status::Disconnected => ("CONNECTION LOST", Color::Red),
    }
}

fn glyph(m: Option<Move>) -> String {
    match m {
        Some(m) => m.to_string(),
        None => "?".to_string(),
    }
}

pub fn render(frame: &mut Frame, snapshot: &Snapshot, muted: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Score
            Constraint::Min(5),    // Arena
            Constraint::Length(3), // Banner
            Constraint::Length(3), // Controls
        ])
        .split(frame.area());

    let (title, opponent) = match snapshot.mode {
        Mode::Solo => (" ROCK PAPER SCISSORS : vs CPU ", "CPU"),
        Mode::Host => (" ROCK PAPER SCISSORS : hosting ", "OPPONENT"),
        Mode::Joiner => (" ROCK PAPER SCISSORS : joined ", "OPPONENT"),
    };
    frame.render_widget(
        Paragraph::new(format!("Round {}   First to {}", snapshot.rounds + 1, snapshot.score.target_score))
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center),
        chunks[0],
    );

    let score = Line::from(vec![
        Span::styled(format!(" YOU {} ", snapshot.score.local_score), Style::default().fg(Color::Green)),
        Span::raw(" - "),
        Span::styled(
            format!(" {} {} ", snapshot.score.remote_score, opponent),
            Style::default().fg(Color::Red),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(score).alignment(Alignment::Center).block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );

    // moves stay hidden until the round is revealed
    let revealed = matches!(snapshot.phase, Phase::Resolving | Phase::Cooldown | Phase::MatchOver);
    let (mine, theirs) = match (revealed, snapshot.last_round) {
        (true, Some(round)) => (glyph(Some(round.local)), glyph(Some(round.remote))),
        _ => (glyph(snapshot.local_move), "?".to_string()),
    };
    let arena = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    frame.render_widget(
        Paragraph::new(mine)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" YOU ")),
        arena[0],
    );
    frame.render_widget(
        Paragraph::new(theirs)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", opponent))),
        arena[1],
    );

    let (text, color) = banner(snapshot.status);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL)),
        chunks[3],
    );

    let mut help = String::from("[R] Rock  [P] Paper  [S] Scissors  [Enter] Rematch");
    if snapshot.mode == Mode::Solo {
        help.push_str("  [X] Reset");
    }
    help.push_str(if muted { "  [M] Unmute" } else { "  [M] Mute" });
    help.push_str("  [Esc] Leave");
    frame.render_widget(
        Paragraph::new(help)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title(" Controls ")),
        chunks[4],
    );
}
