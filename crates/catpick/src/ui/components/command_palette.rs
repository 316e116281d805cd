//! Command palette overlay and the commands it understands.

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub const COMMAND_HELP: &str =
    "base <dir>, select-all, deselect-all, concat, ai, v2, lines on|off, reload, quit";

/// A parsed palette command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteCommand {
    BaseDir(String),
    SelectAll,
    DeselectAll,
    Concatenate,
    ConcatenateWithAi,
    ConcatenateV2,
    LineNumbers(bool),
    Reload,
    Help,
    Quit,
}

impl PaletteCommand {
    /// Parse the palette input. Blank input yields `None`.
    pub fn parse(input: &str) -> Result<Option<Self>> {
        let input = input.trim().trim_start_matches(':');
        let Some(verb) = input.split_whitespace().next() else {
            return Ok(None);
        };
        let rest = input[verb.len()..].trim();

        let command = match verb {
            "base" | "cd" => {
                if rest.is_empty() {
                    bail!("base requires a directory");
                }
                PaletteCommand::BaseDir(rest.to_owned())
            }
            "select-all" | "all" => PaletteCommand::SelectAll,
            "deselect-all" | "none" => PaletteCommand::DeselectAll,
            "concat" | "results" => PaletteCommand::Concatenate,
            "ai" => PaletteCommand::ConcatenateWithAi,
            "v2" => PaletteCommand::ConcatenateV2,
            "lines" => match rest {
                "on" | "true" | "yes" => PaletteCommand::LineNumbers(true),
                "off" | "false" | "no" => PaletteCommand::LineNumbers(false),
                other => return Err(anyhow!("lines expects on or off, got '{other}'")),
            },
            "reload" => PaletteCommand::Reload,
            "help" => PaletteCommand::Help,
            "quit" | "q" => PaletteCommand::Quit,
            other => return Err(anyhow!("unknown command '{other}'")),
        };
        Ok(Some(command))
    }
}

/// Interactive state backing the command palette overlay.
#[derive(Debug, Default, Clone)]
pub struct CommandPaletteState {
    visible: bool,
    input: String,
    message: Option<PaletteMessage>,
}

impl CommandPaletteState {
    pub fn open(&mut self) {
        self.visible = true;
        self.input.clear();
    }

    /// Reveal the palette with an initial command prefilled.
    pub fn open_with<S: Into<String>>(&mut self, content: S) {
        self.visible = true;
        self.input = content.into();
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Consume the current input, leaving the buffer empty.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Show a hint beneath the input field for a few seconds.
    pub fn set_message<S: Into<String>>(&mut self, level: PaletteMessageLevel, message: S) {
        self.message = Some(PaletteMessage::new(level, message.into()));
    }

    pub fn purge_expired_messages(&mut self) {
        if let Some(message) = &self.message
            && message.is_expired()
        {
            self.message = None;
        }
    }
}

/// Visual component that renders the command palette overlay.
#[derive(Debug, Default)]
pub struct CommandPalette;

impl CommandPalette {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &CommandPaletteState) {
        if !state.is_open() {
            return;
        }

        let width = area.width.saturating_sub(10).min(80);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + area.height.saturating_sub(6),
            width,
            height: 5.min(area.height),
        };

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title("Command")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);

        let prompt = Paragraph::new(format!(":{}", state.input()))
            .style(Style::default().fg(Color::White));
        frame.render_widget(prompt, layout[0]);

        let (text, style) = match &state.message {
            Some(message) => (
                message.text.clone(),
                match message.level {
                    PaletteMessageLevel::Info => Style::default().fg(Color::Gray),
                    PaletteMessageLevel::Error => {
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                    }
                },
            ),
            None => (COMMAND_HELP.to_owned(), Style::default().fg(Color::DarkGray)),
        };
        let paragraph = Paragraph::new(Line::from(text))
            .wrap(Wrap { trim: true })
            .style(style);
        frame.render_widget(paragraph, layout[1]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteMessageLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
struct PaletteMessage {
    level: PaletteMessageLevel,
    text: String,
    expires_at: Instant,
}

impl PaletteMessage {
    fn new(level: PaletteMessageLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            PaletteCommand::parse(":base  /srv/my project ").unwrap(),
            Some(PaletteCommand::BaseDir("/srv/my project".into()))
        );
        assert_eq!(
            PaletteCommand::parse("lines on").unwrap(),
            Some(PaletteCommand::LineNumbers(true))
        );
        assert_eq!(
            PaletteCommand::parse("v2").unwrap(),
            Some(PaletteCommand::ConcatenateV2)
        );
        assert_eq!(PaletteCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_or_incomplete_commands() {
        assert!(PaletteCommand::parse("base").is_err());
        assert!(PaletteCommand::parse("lines maybe").is_err());
        let err = PaletteCommand::parse("explode").unwrap_err();
        assert_eq!(err.to_string(), "unknown command 'explode'");
    }
}
