//! Key bindings: arrows and vim-style letters.

use crate::audio::Channel;
use crate::piece::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Steer(Direction),
    /// Enter / Space: start from the title screen, play again after game over.
    Confirm,
    Restart,
    Pause,
    ToggleSound(Channel),
    Quit,
    None,
}

/// Map key event to game action. Ctrl-C always quits.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Left | KeyCode::Char('h') => Action::Steer(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => Action::Steer(Direction::Right),
        KeyCode::Down | KeyCode::Char('j') => Action::Steer(Direction::Down),
        KeyCode::Up | KeyCode::Char('k') => Action::Steer(Direction::Up),
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('a') => Action::ToggleSound(Channel::Ahh),
        KeyCode::Char('o') => Action::ToggleSound(Channel::Ouch),
        KeyCode::Char('m') => Action::ToggleSound(Channel::Music),
        _ => Action::None,
    }
}
