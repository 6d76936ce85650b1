//! Keyboard shortcuts for the wizard demo.
//!
//! Single source of truth for the help dialog and the footer hints.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press means to the demo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Complete the current step
    Submit,
    /// Host Back button
    Back,
    /// Host Forward button
    Forward,
    /// Close the tab (goes through the before-unload guard)
    CloseTab,
    ToggleHelp,
}

/// A keyboard shortcut definition
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub description: &'static str,
    pub command: Command,
}

/// Static registry of all keyboard shortcuts
pub static SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        key: "Enter",
        description: "Complete step / re-open wizard",
        command: Command::Submit,
    },
    Shortcut {
        key: "Alt+←/Esc",
        description: "Browser Back",
        command: Command::Back,
    },
    Shortcut {
        key: "Alt+→",
        description: "Browser Forward",
        command: Command::Forward,
    },
    Shortcut {
        key: "Ctrl+W",
        description: "Close tab",
        command: Command::CloseTab,
    },
    Shortcut {
        key: "F1",
        description: "Toggle help",
        command: Command::ToggleHelp,
    },
];

/// Map a key event to a demo command; `None` means the key is text input.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(Command::Submit),
        KeyCode::Esc => Some(Command::Back),
        KeyCode::Left if alt => Some(Command::Back),
        KeyCode::Right if alt => Some(Command::Forward),
        KeyCode::Char('w' | 'c') if ctrl => Some(Command::CloseTab),
        KeyCode::F(1) => Some(Command::ToggleHelp),
        _ => None,
    }
}

/// One-line footer listing every shortcut.
pub fn footer_hint() -> String {
    SHORTCUTS
        .iter()
        .map(|s| format!("{} {}", s.key, s.description.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" · ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_alt_arrows_are_history_buttons() {
        assert_eq!(
            command_for(&key(KeyCode::Left, KeyModifiers::ALT)),
            Some(Command::Back)
        );
        assert_eq!(
            command_for(&key(KeyCode::Right, KeyModifiers::ALT)),
            Some(Command::Forward)
        );
    }

    #[test]
    fn test_plain_arrows_stay_in_the_field() {
        assert_eq!(command_for(&key(KeyCode::Left, KeyModifiers::NONE)), None);
        assert_eq!(command_for(&key(KeyCode::Right, KeyModifiers::NONE)), None);
        assert_eq!(command_for(&key(KeyCode::Char('w'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_ctrl_w_closes_tab() {
        assert_eq!(
            command_for(&key(KeyCode::Char('w'), KeyModifiers::CONTROL)),
            Some(Command::CloseTab)
        );
    }

    #[test]
    fn test_every_command_has_a_shortcut() {
        for command in [
            Command::Submit,
            Command::Back,
            Command::Forward,
            Command::CloseTab,
            Command::ToggleHelp,
        ] {
            assert!(SHORTCUTS.iter().any(|s| s.command == command));
        }
    }

    #[test]
    fn test_footer_mentions_back() {
        assert!(footer_hint().contains("browser back"));
    }
}
