use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    DefaultTerminal, Frame,
};
use std::time::Duration;

use crate::core::session::SESSION_ID_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyChoice {
    Solo,
    Host,
    Join(String),
    Quit,
}

const ENTRIES: [(&str, &str); 3] = [
    ("[S] Play vs CPU", "first to 3 wins, score is kept between runs"),
    ("[H] Host a game", "get a code to share with a friend"),
    ("[J] Join a game", "enter the code your friend shared"),
];

pub struct Lobby {
    selected: usize,
    input_mode: bool,
    code_input: String,
    status: Option<String>,
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

impl Lobby {
    pub fn new() -> Self {
        Self { selected: 0, input_mode: false, code_input: String::new(), status: None }
    }

    /// One-line notice shown under the menu, e.g. why the last session ended.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<LobbyChoice> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if let Some(choice) = self.handle_key(key.code) {
                        return Ok(choice);
                    }
                }
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Option<LobbyChoice> {
        if self.input_mode {
            match code {
                KeyCode::Enter if !self.code_input.trim().is_empty() => {
                    self.input_mode = false;
                    return Some(LobbyChoice::Join(std::mem::take(&mut self.code_input)));
                }
                KeyCode::Esc => {
                    self.input_mode = false;
                    self.code_input.clear();
                }
                KeyCode::Char(c) if c.is_ascii_alphanumeric() && self.code_input.len() < SESSION_ID_LEN => {
                    self.code_input.push(c.to_ascii_uppercase());
                }
                KeyCode::Backspace => {
                    self.code_input.pop();
                }
                _ => {}
            }
            return None;
        }
        match code {
            KeyCode::Char('s') | KeyCode::Char('S') => return Some(LobbyChoice::Solo),
            KeyCode::Char('h') | KeyCode::Char('H') => return Some(LobbyChoice::Host),
            KeyCode::Char('j') | KeyCode::Char('J') => self.enter_code(),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(ENTRIES.len() - 1),
            KeyCode::Enter => match self.selected {
                0 => return Some(LobbyChoice::Solo),
                1 => return Some(LobbyChoice::Host),
                _ => self.enter_code(),
            },
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Some(LobbyChoice::Quit),
            _ => {}
        }
        None
    }

    fn enter_code(&mut self) {
        self.input_mode = true;
        self.code_input.clear();
        self.status = None;
    }

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(f.area());

        f.render_widget(
            Paragraph::new(" ROCK PAPER SCISSORS ")
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center),
            chunks[0],
        );

        if self.input_mode {
            f.render_widget(
                Paragraph::new(format!("Enter the host's session code:\n\n > {}", self.code_input))
                    .block(Block::default().title(" JOIN GAME ").borders(Borders::ALL)),
                chunks[1],
            );
        } else {
            let items: Vec<ListItem> = ENTRIES
                .iter()
                .enumerate()
                .map(|(i, (name, description))| {
                    let style = if i == self.selected {
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    ListItem::new(format!(" » {} : {}", name, description)).style(style)
                })
                .collect();
            f.render_widget(List::new(items).block(Block::default().title(" MODE ").borders(Borders::ALL)), chunks[1]);
        }

        if let Some(status) = &self.status {
            f.render_widget(
                Paragraph::new(status.as_str()).style(Style::default().fg(Color::Yellow)).alignment(Alignment::Center),
                chunks[2],
            );
        }

        let help = if self.input_mode {
            "[Enter] Connect  [Esc] Back"
        } else {
            "[↑/↓] Navigate  [Enter] Select  [S] Solo  [H] Host  [J] Join  [Q] Quit"
        };
        f.render_widget(Paragraph::new(help).alignment(Alignment::Center), chunks[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_pick_a_mode() {
        let mut lobby = Lobby::new();
        assert_eq!(lobby.handle_key(KeyCode::Char('s')), Some(LobbyChoice::Solo));
        assert_eq!(lobby.handle_key(KeyCode::Char('H')), Some(LobbyChoice::Host));
        assert_eq!(lobby.handle_key(KeyCode::Esc), Some(LobbyChoice::Quit));
    }

    #[test]
    fn join_collects_an_uppercase_code() {
        let mut lobby = Lobby::new();
        assert_eq!(lobby.handle_key(KeyCode::Char('j')), None);
        assert_eq!(lobby.handle_key(KeyCode::Enter), None);
        for c in "ab1-2cdEF".chars() {
            lobby.handle_key(KeyCode::Char(c));
        }
        assert_eq!(lobby.code_input, "AB12CD");
        lobby.handle_key(KeyCode::Backspace);
        lobby.handle_key(KeyCode::Char('x'));
        assert_eq!(lobby.handle_key(KeyCode::Enter), Some(LobbyChoice::Join("AB12CX".into())));
        assert!(!lobby.input_mode);
    }

    #[test]
    fn escape_leaves_code_entry() {
        let mut lobby = Lobby::new();
        lobby.handle_key(KeyCode::Down);
        lobby.handle_key(KeyCode::Down);
        lobby.handle_key(KeyCode::Enter);
        assert!(lobby.input_mode);
        lobby.handle_key(KeyCode::Char('a'));
        assert_eq!(lobby.handle_key(KeyCode::Esc), None);
        assert!(!lobby.input_mode);
        assert!(lobby.code_input.is_empty());
    }
}
