//! Input handling and keybindings.
//!
//! The dashboard keeps no input state: quit and manual refresh are the only
//! bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling a key event.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// No action, continue.
    None,
    /// Quit the application.
    Quit,
    /// Run one extra sampling cycle immediately.
    Refresh,
}

/// Maps a key event to an action.
pub fn handle_key(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Refresh,
        _ => KeyAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn q_quits() {
        assert_eq!(handle_key(key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(handle_key(key(KeyCode::Char('Q'))), KeyAction::Quit);
    }

    #[test]
    fn ctrl_c_quits() {
        let event = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        assert_eq!(handle_key(event), KeyAction::Quit);
    }

    #[test]
    fn plain_c_does_not_quit() {
        assert_eq!(handle_key(key(KeyCode::Char('c'))), KeyAction::None);
    }

    #[test]
    fn r_requests_refresh() {
        assert_eq!(handle_key(key(KeyCode::Char('r'))), KeyAction::Refresh);
        assert_eq!(handle_key(key(KeyCode::Char('R'))), KeyAction::Refresh);
    }

    #[test]
    fn other_keys_are_ignored() {
        assert_eq!(handle_key(key(KeyCode::Enter)), KeyAction::None);
        assert_eq!(handle_key(key(KeyCode::Up)), KeyAction::None);
        assert_eq!(handle_key(key(KeyCode::Char('x'))), KeyAction::None);
    }
}
