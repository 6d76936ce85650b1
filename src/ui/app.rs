use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use serde_json::json;
use std::io;
use std::time::Duration;

use wizard_history::config::Config;
use wizard_history::memory::MemoryTab;
use wizard_history::{HistoryPort, NavigationIntent, NavigationPort, UnloadDecision, WizardHistory};

use super::help_dialog::HelpDialog;
use super::keybindings::{command_for, footer_hint, Command};
use super::leave_dialog::{LeaveChoice, LeaveSiteDialog};
use super::terminal_guard::TerminalGuard;
use super::text_input::TextInput;

/// Which page the simulated tab is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Wizard,
    /// The router left the wizard for `path`
    Parent { path: String },
}

/// Terminal stand-in for a browser tab hosting the load wizard.
pub struct WizardApp {
    config: Config,
    tab: MemoryTab,
    wizard: Option<WizardHistory<String>>,
    /// One input per configured step
    fields: Vec<TextInput>,
    page: Page,
    leave_dialog: LeaveSiteDialog,
    help_dialog: HelpDialog,
    status: Option<String>,
    should_quit: bool,
    /// Router calls already reacted to
    seen_navigations: usize,
}

impl WizardApp {
    pub fn new(config: Config) -> Result<Self> {
        // Fail before touching the terminal when the wizard config is unusable
        config.wizard.options()?;

        let fields = config
            .wizard
            .steps
            .iter()
            .map(|step| TextInput::new(format!("Enter {step} details")))
            .collect();

        let mut app = Self {
            config,
            tab: MemoryTab::new(),
            wizard: None,
            fields,
            page: Page::Wizard,
            leave_dialog: LeaveSiteDialog::new(),
            help_dialog: HelpDialog::new(),
            status: None,
            should_quit: false,
            seen_navigations: 0,
        };
        app.mount_wizard()?;
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        let _guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let tick_rate = Duration::from_millis(self.config.ui.tick_rate_ms);

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key)?;
                    }
                }
            }
        }

        terminal.show_cursor()?;
        if let Some(wizard) = self.wizard.take() {
            wizard.unmount();
        }
        Ok(())
    }

    fn wizard_route(&self) -> String {
        format!("{}/new", self.config.wizard.parent_path.trim_end_matches('/'))
    }

    fn mount_wizard(&mut self) -> Result<()> {
        let options = self.config.wizard.options()?.with_unsaved_data(false);
        for field in &mut self.fields {
            field.clear();
        }
        self.wizard = Some(WizardHistory::mount(options, self.tab.ports()));
        self.page = Page::Wizard;
        Ok(())
    }

    /// Guard the tab only while some step holds input.
    fn has_unsaved_input(&self) -> bool {
        self.config.wizard.has_unsaved_data && self.fields.iter().any(|f| !f.is_empty())
    }

    fn step_position(&self, step: &str) -> Option<usize> {
        self.config.wizard.steps.iter().position(|s| s == step)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.leave_dialog.visible {
            if self.leave_dialog.handle_key(key.code) == Some(LeaveChoice::Leave) {
                tracing::info!("Tab closed with unsaved input");
                self.should_quit = true;
            }
            return Ok(());
        }

        match command_for(&key) {
            Some(Command::ToggleHelp) => self.help_dialog.toggle(),
            Some(Command::CloseTab) => self.request_close(),
            // History buttons are inert on the parent page (noted in help)
            Some(Command::Back) if self.page == Page::Wizard => {
                self.tab.history.back();
                self.after_history_move();
            }
            Some(Command::Forward) if self.page == Page::Wizard => {
                self.tab.history.forward();
                self.after_history_move();
            }
            Some(Command::Submit) if self.page == Page::Wizard => self.submit_step(),
            Some(Command::Submit) => {
                // Router pushes the wizard route, then the wizard seeds it
                self.tab
                    .history
                    .push_state(json!({ "path": self.wizard_route() }));
                self.mount_wizard()?;
                self.status = None;
            }
            Some(_) => {}
            None => self.edit_field(key.code),
        }
        Ok(())
    }

    fn edit_field(&mut self, code: KeyCode) {
        match &self.page {
            Page::Wizard => {
                let Some(position) = self
                    .wizard
                    .as_ref()
                    .and_then(|w| self.step_position(&w.current_step()))
                else {
                    return;
                };
                if self.fields[position].handle_key(code) {
                    let unsaved = self.has_unsaved_input();
                    if let Some(wizard) = self.wizard.as_mut() {
                        wizard.set_unsaved_data(unsaved);
                    }
                }
            }
            Page::Parent { .. } => {
                if code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
        }
    }

    fn submit_step(&mut self) {
        let Some(wizard) = self.wizard.as_ref() else {
            return;
        };
        let current = wizard.current_step();
        let Some(position) = self.step_position(&current) else {
            return;
        };
        if self.fields[position].is_empty() {
            self.status = Some(format!("Fill in {current} before continuing"));
            return;
        }
        self.status = None;
        tracing::debug!(step = %current, value = self.fields[position].value(), "Step completed");

        match self.config.wizard.next_step(&current) {
            Some(next) => wizard.advance_to(next.to_string()),
            None => {
                let parent_path = wizard.parent_path();
                tracing::info!(parent_path = %parent_path, "Load submitted");
                if let Some(wizard) = self.wizard.as_mut() {
                    wizard.set_unsaved_data(false);
                }
                // The router pushes its own entry for the parent page
                self.tab.history.push_state(json!({ "path": parent_path }));
                self.tab.navigator.navigate(&parent_path);
                self.after_history_move();
                self.status = Some("Load created".to_string());
            }
        }
    }

    /// React to the tab after Back/Forward or a router call.
    fn after_history_move(&mut self) {
        let navigations = self.tab.navigator.count();
        if navigations > self.seen_navigations {
            self.seen_navigations = navigations;
            let path = self.tab.navigator.last().unwrap_or_default();
            if let Some(wizard) = self.wizard.take() {
                wizard.unmount();
            }
            self.page = Page::Parent { path };
            return;
        }

        // Echo the restored step back like any step-driven form would; the
        // wizard absorbs it instead of pushing a duplicate entry
        if let Some(wizard) = self.wizard.as_ref() {
            if wizard.intent() == NavigationIntent::ReactingToPop {
                wizard.advance_to(wizard.current_step());
            }
        }
    }

    fn request_close(&mut self) {
        match self.tab.window.request_unload() {
            UnloadDecision::Prompt => self.leave_dialog.show(),
            UnloadDecision::Proceed => self.should_quit = true,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Address bar
                Constraint::Min(10),   // Page
                Constraint::Length(1), // Status
                Constraint::Length(1), // Footer
            ])
            .split(frame.area());

        self.render_address_bar(frame, chunks[0]);
        match &self.page {
            Page::Wizard => self.render_wizard(frame, chunks[1]),
            Page::Parent { path } => self.render_parent(frame, chunks[1], path),
        }

        if let Some(status) = &self.status {
            frame.render_widget(
                Paragraph::new(status.as_str()).style(Style::default().fg(Color::Yellow)),
                chunks[2],
            );
        }
        frame.render_widget(
            Paragraph::new(footer_hint()).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );

        self.help_dialog.render(frame);
        self.leave_dialog.render(frame);
    }

    fn render_address_bar(&self, frame: &mut Frame, area: Rect) {
        let route = match &self.page {
            Page::Wizard => self.wizard_route(),
            Page::Parent { path } => path.clone(),
        };
        let history = &self.tab.history;
        let line = Line::from(vec![
            Span::styled(
                format!(" {route} "),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  history {}/{}",
                    history.cursor() + 1,
                    history.len()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn render_wizard(&self, frame: &mut Frame, area: Rect) {
        let Some(wizard) = self.wizard.as_ref() else {
            return;
        };
        let current = wizard.current_step();

        let block = Block::default()
            .title(" Create Load ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1), // Step progress
                Constraint::Length(1), // Spacer
                Constraint::Length(3), // Field
                Constraint::Length(1), // Spacer
                Constraint::Min(3),    // History mirror
            ])
            .split(inner);

        let mut progress = Vec::new();
        for (i, step) in self.config.wizard.steps.iter().enumerate() {
            if i > 0 {
                progress.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
            }
            let style = if *step == current {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if wizard.stack().contains(step) {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            progress.push(Span::styled(step.clone(), style));
        }
        frame.render_widget(Paragraph::new(Line::from(progress)), chunks[0]);

        if let Some(position) = self.step_position(&current) {
            self.fields[position].render(frame, chunks[2], &current, !self.leave_dialog.visible);
        }

        let intent = match wizard.intent() {
            NavigationIntent::Idle => "idle",
            NavigationIntent::ReactingToPop => "reacting to pop",
        };
        let guard = if wizard.has_unsaved_data() { "on" } else { "off" };
        let mirror = vec![
            Line::from(vec![
                Span::styled("Stack   ", Style::default().fg(Color::Yellow)),
                Span::raw(wizard.stack().join(" → ")),
            ]),
            Line::from(vec![
                Span::styled("Intent  ", Style::default().fg(Color::Yellow)),
                Span::raw(intent),
            ]),
            Line::from(vec![
                Span::styled("Guard   ", Style::default().fg(Color::Yellow)),
                Span::raw(guard),
            ]),
        ];
        frame.render_widget(Paragraph::new(mirror), chunks[4]);
    }

    fn render_parent(&self, frame: &mut Frame, area: Rect, path: &str) {
        let text = vec![
            Line::from(Span::styled(
                path.to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("You left the load wizard."),
            Line::from("Enter starts a new load, q quits."),
        ];
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    #[cfg(test)]
    fn current_step(&self) -> Option<String> {
        self.wizard.as_ref().map(WizardHistory::current_step)
    }
}
