use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use super::keybindings::SHORTCUTS;

/// Back/Forward only drive the wizard page; the parent page is a dead end
/// in the demo tab.
pub const PARENT_PAGE_NOTE: &str = "On the parent page Back/Forward do nothing; Enter re-opens the wizard.";

pub struct HelpDialog {
    pub visible: bool,
}

impl HelpDialog {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(50, 50, frame.area());
        frame.render_widget(Clear, area);

        let mut lines = vec![
            Line::from(Span::styled(
                "Shortcuts",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for shortcut in SHORTCUTS {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<12}", shortcut.key),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(shortcut.description),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            PARENT_PAGE_NOTE,
            Style::default().fg(Color::DarkGray),
        )));

        let help = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(help, area);
    }
}
