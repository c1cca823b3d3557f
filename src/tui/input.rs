use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Represents the result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Quit the application
    Quit,
    /// Append a character to the search key
    Type(char),
    /// Delete the last character of the search key
    Backspace,
    /// Select the next result
    Next,
    /// Select the previous result
    Previous,
    /// Search inside the selected entry
    Pivot,
    /// Open the selected entry
    Open,
    /// Open the folder containing the selected entry
    OpenParent,
    /// Leave filesystem search, or quit from the catalog
    Back,
    /// Re-list the catalog sources
    Refresh,
    /// Move the panel by (columns, rows)
    MovePanel(i32, i32),
    /// No action
    None,
}

/// Maps keyboard events to actions
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: Ctrl+C
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, _) => KeyAction::Back,

        (KeyCode::Char('r'), KeyModifiers::CONTROL) => KeyAction::Refresh,
        (KeyCode::Char('o'), KeyModifiers::CONTROL) => KeyAction::OpenParent,
        (KeyCode::Enter, KeyModifiers::CONTROL) => KeyAction::OpenParent,

        // Panel placement: Alt+arrows
        (KeyCode::Left, KeyModifiers::ALT) => KeyAction::MovePanel(-1, 0),
        (KeyCode::Right, KeyModifiers::ALT) => KeyAction::MovePanel(1, 0),
        (KeyCode::Up, KeyModifiers::ALT) => KeyAction::MovePanel(0, -1),
        (KeyCode::Down, KeyModifiers::ALT) => KeyAction::MovePanel(0, 1),

        // Navigation
        (KeyCode::Down, _) => KeyAction::Next,
        (KeyCode::Up, _) => KeyAction::Previous,
        (KeyCode::Tab, _) => KeyAction::Pivot,
        (KeyCode::Enter, _) => KeyAction::Open,

        // Editing
        (KeyCode::Backspace, _) => KeyAction::Backspace,
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => KeyAction::Type(c),

        _ => KeyAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
        handle_key_event(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_key_quit() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), KeyAction::Quit);
    }

    #[test]
    fn test_key_back() {
        assert_eq!(press(KeyCode::Esc, KeyModifiers::NONE), KeyAction::Back);
    }

    #[test]
    fn test_key_typing() {
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::NONE), KeyAction::Type('q'));
        assert_eq!(press(KeyCode::Char('F'), KeyModifiers::SHIFT), KeyAction::Type('F'));
        assert_eq!(press(KeyCode::Backspace, KeyModifiers::NONE), KeyAction::Backspace);
    }

    #[test]
    fn test_key_navigation() {
        assert_eq!(press(KeyCode::Down, KeyModifiers::NONE), KeyAction::Next);
        assert_eq!(press(KeyCode::Up, KeyModifiers::NONE), KeyAction::Previous);
        assert_eq!(press(KeyCode::Tab, KeyModifiers::NONE), KeyAction::Pivot);
    }

    #[test]
    fn test_key_open() {
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE), KeyAction::Open);
        assert_eq!(press(KeyCode::Char('o'), KeyModifiers::CONTROL), KeyAction::OpenParent);
        assert_eq!(press(KeyCode::Enter, KeyModifiers::CONTROL), KeyAction::OpenParent);
    }

    #[test]
    fn test_key_refresh() {
        assert_eq!(press(KeyCode::Char('r'), KeyModifiers::CONTROL), KeyAction::Refresh);
    }

    #[test]
    fn test_key_move_panel() {
        assert_eq!(press(KeyCode::Left, KeyModifiers::ALT), KeyAction::MovePanel(-1, 0));
        assert_eq!(press(KeyCode::Down, KeyModifiers::ALT), KeyAction::MovePanel(0, 1));
    }

    #[test]
    fn test_key_none() {
        assert_eq!(press(KeyCode::Char('x'), KeyModifiers::CONTROL), KeyAction::None);
        assert_eq!(press(KeyCode::F(5), KeyModifiers::NONE), KeyAction::None);
    }
}
