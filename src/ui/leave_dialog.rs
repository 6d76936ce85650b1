use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;

/// Button highlighted in the leave-site dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveChoice {
    Stay,
    Leave,
}

impl LeaveChoice {
    fn toggle(self) -> Self {
        match self {
            Self::Stay => Self::Leave,
            Self::Leave => Self::Stay,
        }
    }
}

/// Stand-in for the host's native "Leave site?" prompt, shown when the
/// before-unload guard cancels a tab close.
pub struct LeaveSiteDialog {
    pub visible: bool,
    pub selection: LeaveChoice,
}

impl LeaveSiteDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            selection: LeaveChoice::Stay,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.selection = LeaveChoice::Stay;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Returns the user's answer once they confirm one.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<LeaveChoice> {
        match key {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h' | 'l') => {
                self.selection = self.selection.toggle();
                None
            }
            KeyCode::Enter => {
                self.hide();
                Some(self.selection)
            }
            KeyCode::Char('y' | 'Y') => {
                self.hide();
                Some(LeaveChoice::Leave)
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.hide();
                Some(LeaveChoice::Stay)
            }
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Leave site? ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .split(inner);

        let message = Paragraph::new("Changes you made may not be saved.")
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[0]);

        let button = |label: &'static str, choice: LeaveChoice| {
            if self.selection == choice {
                Span::styled(
                    format!("[{label}]"),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(format!(" {label} "))
            }
        };

        let buttons = Paragraph::new(Line::from(vec![
            button("Stay", LeaveChoice::Stay),
            Span::raw("    "),
            button("Leave", LeaveChoice::Leave),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(buttons, chunks[1]);
    }
}
