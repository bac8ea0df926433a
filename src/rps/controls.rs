use crossterm::event::KeyCode;

use crate::core::engine::Command;
use crate::rps::moves::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Play(Command),
    ToggleMute,
}

pub fn map_key(code: KeyCode) -> Option<Input> {
    let input = match code {
        KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Char('1') => Input::Play(Command::Submit(Move::Rock)),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char('2') => Input::Play(Command::Submit(Move::Paper)),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('3') => {
            Input::Play(Command::Submit(Move::Scissors))
        }
        KeyCode::Enter | KeyCode::Char(' ') => Input::Play(Command::Rematch),
        KeyCode::Char('x') | KeyCode::Char('X') => Input::Play(Command::ResetScore),
        KeyCode::Char('m') | KeyCode::Char('M') => Input::ToggleMute,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Input::Play(Command::Quit),
        _ => return None,
    };
    Some(input)
}
